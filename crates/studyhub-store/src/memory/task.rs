//! In-memory task repository with an atomic natural-key index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use studyhub_core::AppResult;
use studyhub_core::types::filter::FilterField;
use studyhub_core::types::id::{TaskId, UserId};
use studyhub_entity::protocol::AssessmentType;
use studyhub_entity::task::Task;

use crate::traits::TaskRepository;

use super::filter::task_matches_all;

type OccurrenceKey = (UserId, String, i64);

/// Dashmap-backed task repository.
///
/// The occurrence index maps `(user, name, timestamp)` to the primary
/// key; claiming an index entry and writing the row happens under the
/// entry lock, so two concurrent inserts of the same occurrence cannot
/// both succeed.
#[derive(Debug, Default)]
pub struct MemoryTaskRepository {
    rows: DashMap<TaskId, Task>,
    occurrence_index: DashMap<OccurrenceKey, TaskId>,
}

impl MemoryTaskRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn occurrence_key(user_id: UserId, name: &str, timestamp: DateTime<Utc>) -> OccurrenceKey {
        (user_id, name.to_string(), timestamp.timestamp_millis())
    }

    fn remove_row(&self, id: &TaskId) -> Option<Task> {
        let (_, task) = self.rows.remove(id)?;
        self.occurrence_index.remove(&Self::occurrence_key(
            task.user_id,
            &task.name,
            task.timestamp,
        ));
        Some(task)
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn find_by_id(&self, id: &TaskId) -> AppResult<Option<Task>> {
        Ok(self.rows.get(id).map(|row| row.clone()))
    }

    async fn find_by_user(&self, user_id: &UserId) -> AppResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .rows
            .iter()
            .filter(|row| row.user_id == *user_id)
            .map(|row| row.clone())
            .collect();
        tasks.sort_by_key(|task| task.timestamp);
        Ok(tasks)
    }

    async fn find_by_filter(
        &self,
        user_id: &UserId,
        assessment_type: Option<AssessmentType>,
        fields: &[FilterField],
    ) -> AppResult<Vec<Task>> {
        let tasks = self.find_by_user(user_id).await?;
        Ok(tasks
            .into_iter()
            .filter(|task| match assessment_type {
                Some(AssessmentType::All) | None => true,
                Some(wanted) => task.assessment_type == wanted,
            })
            .filter(|task| task_matches_all(task, fields))
            .collect())
    }

    async fn exists_for_occurrence(
        &self,
        user_id: &UserId,
        name: &str,
        timestamp: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self
            .occurrence_index
            .contains_key(&Self::occurrence_key(*user_id, name, timestamp)))
    }

    async fn insert_if_absent(&self, task: &Task) -> AppResult<bool> {
        let key = Self::occurrence_key(task.user_id, &task.name, task.timestamp);
        match self.occurrence_index.entry(key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                self.rows.insert(task.id, task.clone());
                vacant.insert(task.id);
                Ok(true)
            }
        }
    }

    async fn update(&self, task: &Task) -> AppResult<Task> {
        self.rows.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn delete(&self, id: &TaskId) -> AppResult<bool> {
        Ok(self.remove_row(id).is_some())
    }

    async fn delete_by_user(&self, user_id: &UserId) -> AppResult<u64> {
        let ids: Vec<TaskId> = self
            .rows
            .iter()
            .filter(|row| row.user_id == *user_id)
            .map(|row| row.id)
            .collect();
        let mut deleted = 0;
        for id in ids {
            if self.remove_row(&id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn delete_many(&self, ids: &[TaskId]) -> AppResult<u64> {
        let mut deleted = 0;
        for id in ids {
            if self.remove_row(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use studyhub_entity::task::TaskState;

    fn task(user_id: UserId, name: &str, timestamp: DateTime<Utc>) -> Task {
        Task {
            id: TaskId::new(),
            user_id,
            name: name.to_string(),
            assessment_type: AssessmentType::Simple,
            timestamp,
            completion_window_millis: 86_400_000,
            estimated_completion_minutes: None,
            completed: false,
            time_completed: None,
            status: TaskState::Unknown,
            order: 0,
            n_questions: None,
            show_in_calendar: true,
            is_demo: false,
            is_clinical: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent_dedups_on_occurrence() {
        let repo = MemoryTaskRepository::new();
        let user_id = UserId::new();
        let at = Utc::now();

        let first = task(user_id, "PHQ8", at);
        let duplicate = task(user_id, "PHQ8", at);

        assert!(repo.insert_if_absent(&first).await.unwrap());
        assert!(!repo.insert_if_absent(&duplicate).await.unwrap());
        assert_eq!(repo.find_by_user(&user_id).await.unwrap().len(), 1);
        assert!(repo.exists_for_occurrence(&user_id, "PHQ8", at).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_claim_once() {
        let repo = Arc::new(MemoryTaskRepository::new());
        let user_id = UserId::new();
        let at = Utc::now();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = Arc::clone(&repo);
            let candidate = task(user_id, "PHQ8", at);
            handles.push(tokio::spawn(async move {
                repo.insert_if_absent(&candidate).await.unwrap()
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(repo.find_by_user(&user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_frees_occurrence_key() {
        let repo = MemoryTaskRepository::new();
        let user_id = UserId::new();
        let at = Utc::now();
        let first = task(user_id, "PHQ8", at);

        repo.insert_if_absent(&first).await.unwrap();
        assert!(repo.delete(&first.id).await.unwrap());
        assert!(!repo.exists_for_occurrence(&user_id, "PHQ8", at).await.unwrap());
        // The occurrence can be inserted again.
        assert!(repo.insert_if_absent(&task(user_id, "PHQ8", at)).await.unwrap());
    }

    #[tokio::test]
    async fn test_filter_by_type_and_fields() {
        let repo = MemoryTaskRepository::new();
        let user_id = UserId::new();
        let now = Utc::now();

        repo.insert_if_absent(&task(user_id, "PHQ8", now)).await.unwrap();
        let mut clinical = task(user_id, "COGNITION", now + chrono::Duration::hours(1));
        clinical.assessment_type = AssessmentType::Clinical;
        clinical.is_clinical = true;
        repo.insert_if_absent(&clinical).await.unwrap();

        let simple = repo
            .find_by_filter(&user_id, Some(AssessmentType::Simple), &[])
            .await
            .unwrap();
        assert_eq!(simple.len(), 1);
        assert_eq!(simple[0].name, "PHQ8");

        let all = repo
            .find_by_filter(&user_id, Some(AssessmentType::All), &[])
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let named = repo
            .find_by_filter(
                &user_id,
                None,
                &FilterField::parse_expression("name:COGNITION"),
            )
            .await
            .unwrap();
        assert_eq!(named.len(), 1);
    }
}
