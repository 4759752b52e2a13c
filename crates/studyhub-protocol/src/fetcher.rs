//! Raw protocol fetching over HTTP.

use std::time::Duration;

use async_trait::async_trait;

use studyhub_core::config::protocol::ProtocolSourceConfig;
use studyhub_core::{AppError, AppResult};
use studyhub_entity::protocol::Protocol;

/// Fetches protocol documents from the remote store. Split from the
/// caching layer so the fallback logic can be exercised against fakes.
#[async_trait]
pub trait ProtocolFetcher: Send + Sync + 'static {
    /// Fetch the protocol for one subject.
    async fn fetch_for_subject(&self, subject_id: &str) -> AppResult<Protocol>;

    /// Fetch the project-level protocol.
    async fn fetch_for_project(&self, project_name: &str) -> AppResult<Protocol>;
}

/// HTTP fetcher with a bounded request timeout.
#[derive(Debug, Clone)]
pub struct HttpProtocolFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProtocolFetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &ProtocolSourceConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build protocol HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, url: String) -> AppResult<Protocol> {
        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::transient_upstream(format!("Protocol source unreachable at {url}: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(AppError::transient_upstream(format!(
                "Protocol source returned {} for {url}",
                response.status()
            )));
        }

        response.json::<Protocol>().await.map_err(|e| {
            if e.is_decode() {
                AppError::validation(format!("Invalid protocol document at {url}: {e}"))
            } else {
                AppError::transient_upstream(format!("Protocol read failed for {url}: {e}"))
            }
        })
    }
}

#[async_trait]
impl ProtocolFetcher for HttpProtocolFetcher {
    async fn fetch_for_subject(&self, subject_id: &str) -> AppResult<Protocol> {
        self.fetch(format!("{}/subjects/{subject_id}/protocol", self.base_url))
            .await
    }

    async fn fetch_for_project(&self, project_name: &str) -> AppResult<Protocol> {
        self.fetch(format!("{}/projects/{project_name}/protocol", self.base_url))
            .await
    }
}
