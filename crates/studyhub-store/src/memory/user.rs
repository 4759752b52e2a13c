//! In-memory user repository.

use async_trait::async_trait;
use dashmap::DashMap;

use studyhub_core::AppResult;
use studyhub_core::types::id::{ProjectId, UserId};
use studyhub_entity::user::User;

use crate::traits::UserRepository;

/// Dashmap-backed user repository.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    rows: DashMap<UserId, User>,
}

impl MemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        Ok(self.rows.get(id).map(|row| row.clone()))
    }

    async fn find_by_subject_id(&self, subject_id: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .iter()
            .find(|row| row.subject_id == subject_id)
            .map(|row| row.clone()))
    }

    async fn find_by_subject_and_project(
        &self,
        subject_id: &str,
        project_id: &ProjectId,
    ) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .iter()
            .find(|row| row.subject_id == subject_id && row.project_id == *project_id)
            .map(|row| row.clone()))
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        Ok(self.rows.iter().map(|row| row.clone()).collect())
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        self.rows.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_lookup() {
        let repo = MemoryUserRepository::new();
        let user = User::new(ProjectId::new(), "sub-1", "Europe/London");
        repo.save(&user).await.unwrap();

        assert!(repo.find_by_id(&user.id).await.unwrap().is_some());
        assert!(repo.find_by_subject_id("sub-1").await.unwrap().is_some());
        assert!(repo.find_by_subject_id("sub-2").await.unwrap().is_none());
        assert!(repo
            .find_by_subject_and_project("sub-1", &user.project_id)
            .await
            .unwrap()
            .is_some());
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }
}
