//! External task state reporting.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use studyhub_core::types::id::TaskId;
use studyhub_core::{AppError, AppResult};
use studyhub_entity::task::{TaskState, TaskStateEvent};
use studyhub_entity::user::User;
use studyhub_store::traits::TaskStateEventRepository;

use super::MAX_STATE_EVENTS;
use crate::message::MessageService;
use crate::task::TaskService;

/// Accepts externally reported task state events, enforcing the
/// reportable-state set and the per-task event cap, and cascading the
/// COMPLETED transition onto the task's notifications.
#[derive(Clone)]
pub struct TaskStateEventService {
    event_repo: Arc<dyn TaskStateEventRepository>,
    task_service: Arc<TaskService>,
    message_service: Arc<MessageService>,
}

impl TaskStateEventService {
    /// Create a new task state event service.
    pub fn new(
        event_repo: Arc<dyn TaskStateEventRepository>,
        task_service: Arc<TaskService>,
        message_service: Arc<MessageService>,
    ) -> Self {
        Self {
            event_repo,
            task_service,
            message_service,
        }
    }

    /// Events recorded for a task, oldest first.
    pub async fn get_events(&self, task_id: &TaskId) -> AppResult<Vec<TaskStateEvent>> {
        self.event_repo.find_by_task(task_id).await
    }

    /// Report a state event from outside the server.
    ///
    /// Only COMPLETED, UNKNOWN, and ERRORED may be reported externally;
    /// anything else is rejected, as is any report past the event cap.
    /// A COMPLETED report also deletes the task's notifications and
    /// cancels their delivery triggers.
    pub async fn report_external(
        &self,
        task_id: &TaskId,
        state: TaskState,
        time: DateTime<Utc>,
        associated_info: Option<String>,
        user: &User,
    ) -> AppResult<()> {
        if !state.is_externally_reportable() {
            return Err(AppError::invalid_state(format!(
                "The state {state} cannot be reported through this endpoint"
            )));
        }
        if self.event_repo.count_by_task(task_id).await? >= MAX_STATE_EVENTS {
            return Err(AppError::invalid_state(format!(
                "The limit of {MAX_STATE_EVENTS} state changes has been reached, cannot add new states"
            )));
        }

        let task = self.task_service.get_task(task_id).await?;

        let mut event = TaskStateEvent::new(*task_id, state, time);
        if let Some(info) = associated_info {
            event = event.with_info(info);
        }
        self.event_repo.append(&event).await?;
        self.task_service.update_task_status(&task, state).await?;

        if state == TaskState::Completed {
            self.message_service
                .delete_notifications_by_task(task_id, user)
                .await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TaskStateEventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStateEventService").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhub_core::error::ErrorKind;
    use studyhub_core::types::id::ProjectId;
    use studyhub_entity::message::{MessageFields, Notification};
    use studyhub_entity::protocol::AssessmentType;
    use studyhub_entity::task::Task;
    use studyhub_store::memory::{
        MemoryDataMessageRepository, MemoryMessageStateEventRepository,
        MemoryNotificationRepository, MemoryTaskRepository, MemoryTaskStateEventRepository,
    };

    use crate::message::test_support::fake_adapter;

    struct Fixture {
        service: TaskStateEventService,
        task_service: Arc<TaskService>,
        message_service: Arc<MessageService>,
        user: User,
    }

    fn fixture() -> Fixture {
        let event_repo = Arc::new(MemoryTaskStateEventRepository::new());
        let task_service = Arc::new(TaskService::new(
            Arc::new(MemoryTaskRepository::new()),
            Arc::clone(&event_repo) as Arc<dyn TaskStateEventRepository>,
        ));
        let (_, adapter) = fake_adapter();
        let message_service = Arc::new(MessageService::new(
            Arc::new(MemoryNotificationRepository::new()),
            Arc::new(MemoryDataMessageRepository::new()),
            Arc::new(MemoryMessageStateEventRepository::new()),
            adapter,
        ));
        Fixture {
            service: TaskStateEventService::new(
                event_repo,
                Arc::clone(&task_service),
                Arc::clone(&message_service),
            ),
            task_service,
            message_service,
            user: User::new(ProjectId::new(), "sub-1", "Europe/London"),
        }
    }

    fn task(user: &User) -> Task {
        Task {
            id: studyhub_core::types::id::TaskId::new(),
            user_id: user.id,
            name: "PHQ8".to_string(),
            assessment_type: AssessmentType::Simple,
            timestamp: Utc::now(),
            completion_window_millis: 86_400_000,
            estimated_completion_minutes: None,
            completed: false,
            time_completed: None,
            status: studyhub_entity::task::TaskState::Unknown,
            order: 0,
            n_questions: None,
            show_in_calendar: true,
            is_demo: false,
            is_clinical: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_internal_state_report_is_rejected() {
        let fixture = fixture();
        let added = fixture.task_service.add_task(task(&fixture.user)).await.unwrap();
        let err = fixture
            .service
            .report_external(&added.id, TaskState::Added, Utc::now(), None, &fixture.user)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_event_cap_rejects_twenty_first_report() {
        let fixture = fixture();
        let added = fixture.task_service.add_task(task(&fixture.user)).await.unwrap();

        // The insert already recorded one ADDED event; 19 more reach the
        // cap.
        for _ in 0..(MAX_STATE_EVENTS - 1) {
            fixture
                .service
                .report_external(&added.id, TaskState::Unknown, Utc::now(), None, &fixture.user)
                .await
                .unwrap();
        }

        let err = fixture
            .service
            .report_external(&added.id, TaskState::Unknown, Utc::now(), None, &fixture.user)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
        assert_eq!(
            fixture.service.get_events(&added.id).await.unwrap().len() as u64,
            MAX_STATE_EVENTS
        );
    }

    #[tokio::test]
    async fn test_completed_report_cascades_to_notifications() {
        let fixture = fixture();
        let added = fixture.task_service.add_task(task(&fixture.user)).await.unwrap();

        let mut notification = Notification {
            message: MessageFields::new(
                fixture.user.id,
                "schedule",
                Utc::now() + chrono::Duration::hours(1),
                600,
            ),
            title: "due".to_string(),
            body: "body".to_string(),
            kind: "PHQ8".to_string(),
            sound: None,
            badge: None,
            click_action: None,
            subtitle: None,
            icon: None,
            email_enabled: false,
            additional_data: None,
        };
        notification.message.task_id = Some(added.id);
        fixture
            .message_service
            .add_notifications(vec![notification], &fixture.user)
            .await
            .unwrap();

        fixture
            .service
            .report_external(
                &added.id,
                TaskState::Completed,
                Utc::now(),
                Some("{\"questionnaire\":\"done\"}".to_string()),
                &fixture.user,
            )
            .await
            .unwrap();

        let updated = fixture.task_service.get_task(&added.id).await.unwrap();
        assert!(updated.completed);
        assert_eq!(updated.status, TaskState::Completed);
        assert!(fixture
            .message_service
            .get_notifications_by_user(&fixture.user)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let fixture = fixture();
        let err = fixture
            .service
            .report_external(
                &studyhub_core::types::id::TaskId::new(),
                TaskState::Completed,
                Utc::now(),
                None,
                &fixture.user,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
