//! StudyHub server — clinical-study questionnaire scheduling.
//!
//! Wires the repositories, protocol source, trigger runtime, services,
//! and the periodic regeneration loop, then waits for a shutdown signal.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use studyhub_cache::ScheduleCache;
use studyhub_core::config::AppConfig;
use studyhub_core::error::AppError;
use studyhub_core::traits::trigger::{DeliverySink, TriggerScheduler};
use studyhub_protocol::{CachingProtocolSource, HttpProtocolFetcher, ProtocolSource};
use studyhub_service::{MessageService, ScheduleService, TaskService};
use studyhub_store::memory::{
    MemoryDataMessageRepository, MemoryMessageStateEventRepository, MemoryNotificationRepository,
    MemoryProjectRepository, MemoryTaskRepository, MemoryTaskStateEventRepository,
    MemoryUserRepository,
};
use studyhub_store::traits::{
    DataMessageRepository, MessageStateEventRepository, NotificationRepository, ProjectRepository,
    TaskRepository, TaskStateEventRepository, UserRepository,
};
use studyhub_trigger::{LogDeliverySink, MessageTriggerAdapter, OneShotTriggerRuntime};
use studyhub_worker::RegenerationRunner;

#[tokio::main]
async fn main() {
    let env = std::env::var("STUDYHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting StudyHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Repositories ─────────────────────────────────────────────
    let user_repo: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
    let project_repo: Arc<dyn ProjectRepository> = Arc::new(MemoryProjectRepository::new());
    let task_repo: Arc<dyn TaskRepository> = Arc::new(MemoryTaskRepository::new());
    let notification_repo: Arc<dyn NotificationRepository> =
        Arc::new(MemoryNotificationRepository::new());
    let data_repo: Arc<dyn DataMessageRepository> = Arc::new(MemoryDataMessageRepository::new());
    let task_event_repo: Arc<dyn TaskStateEventRepository> =
        Arc::new(MemoryTaskStateEventRepository::new());
    let message_event_repo: Arc<dyn MessageStateEventRepository> =
        Arc::new(MemoryMessageStateEventRepository::new());

    // ── Protocol source ──────────────────────────────────────────
    tracing::info!(base_url = %config.protocol.base_url, "Initializing protocol source");
    let fetcher = HttpProtocolFetcher::new(&config.protocol)?;
    let protocol_source: Arc<dyn ProtocolSource> =
        Arc::new(CachingProtocolSource::new(fetcher, &config.protocol));

    // ── Trigger runtime ──────────────────────────────────────────
    tracing::info!("Starting trigger runtime");
    let sink: Arc<dyn DeliverySink> = Arc::new(LogDeliverySink::new());
    let trigger_runtime = Arc::new(OneShotTriggerRuntime::start(sink).await?);
    let trigger_adapter = Arc::new(MessageTriggerAdapter::new(
        Arc::clone(&trigger_runtime) as Arc<dyn TriggerScheduler>
    ));

    // ── Services ─────────────────────────────────────────────────
    let task_service = Arc::new(TaskService::new(task_repo, task_event_repo));
    let message_service = Arc::new(MessageService::new(
        notification_repo,
        data_repo,
        message_event_repo,
        trigger_adapter,
    ));
    let schedule_service = Arc::new(ScheduleService::new(
        protocol_source,
        Arc::clone(&user_repo),
        project_repo,
        task_service,
        message_service,
        ScheduleCache::new(&config.cache),
    ));

    // ── Regeneration loop ────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = RegenerationRunner::new(schedule_service, user_repo, config.scheduler.clone());
    let runner_handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

    tracing::info!("StudyHub started");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;
    tracing::info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    if let Err(e) = runner_handle.await {
        tracing::warn!("Regeneration loop did not stop cleanly: {e}");
    }
    trigger_runtime.shutdown().await?;

    tracing::info!("StudyHub stopped");
    Ok(())
}
