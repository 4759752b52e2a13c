//! In-memory project repository.

use async_trait::async_trait;
use dashmap::DashMap;

use studyhub_core::AppResult;
use studyhub_core::types::id::ProjectId;
use studyhub_entity::project::Project;

use crate::traits::ProjectRepository;

/// Dashmap-backed project repository.
#[derive(Debug, Default)]
pub struct MemoryProjectRepository {
    rows: DashMap<ProjectId, Project>,
}

impl MemoryProjectRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepository {
    async fn find_by_id(&self, id: &ProjectId) -> AppResult<Option<Project>> {
        Ok(self.rows.get(id).map(|row| row.clone()))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Project>> {
        Ok(self
            .rows
            .iter()
            .find(|row| row.name == name)
            .map(|row| row.clone()))
    }

    async fn save(&self, project: &Project) -> AppResult<Project> {
        self.rows.insert(project.id, project.clone());
        Ok(project.clone())
    }
}
