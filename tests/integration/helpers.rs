//! Shared harness for the integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use studyhub_cache::ScheduleCache;
use studyhub_core::AppResult;
use studyhub_core::config::cache::ScheduleCacheConfig;
use studyhub_core::traits::trigger::{DeliverySink, TriggerPayload, TriggerScheduler};
use studyhub_entity::project::Project;
use studyhub_entity::protocol::{
    Assessment, AssessmentProtocol, AssessmentType, NotificationProtocol, Protocol,
    ReminderTimePeriod, RepeatProtocol, RepeatQuestionnaire, RepeatUnit, TimePeriod,
};
use studyhub_entity::user::User;
use studyhub_protocol::ProtocolSource;
use studyhub_service::{
    MessageService, MessageStateEventService, ScheduleService, TaskService, TaskStateEventService,
};
use studyhub_store::memory::{
    MemoryDataMessageRepository, MemoryMessageStateEventRepository, MemoryNotificationRepository,
    MemoryProjectRepository, MemoryTaskRepository, MemoryTaskStateEventRepository,
    MemoryUserRepository,
};
use studyhub_store::traits::{
    MessageStateEventRepository, ProjectRepository, TaskStateEventRepository, UserRepository,
};
use studyhub_trigger::{MessageTriggerAdapter, OneShotTriggerRuntime};

/// Protocol source serving a mutable in-memory protocol document.
pub struct StaticProtocolSource {
    protocol: Mutex<Protocol>,
}

impl StaticProtocolSource {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol: Mutex::new(protocol),
        }
    }

    pub fn set(&self, protocol: Protocol) {
        *self.protocol.lock().unwrap() = protocol;
    }
}

#[async_trait]
impl ProtocolSource for StaticProtocolSource {
    async fn protocol_for_subject(&self, _subject_id: &str) -> AppResult<Protocol> {
        Ok(self.protocol.lock().unwrap().clone())
    }

    async fn protocol_for_project(&self, _project_name: &str) -> AppResult<Protocol> {
        Ok(self.protocol.lock().unwrap().clone())
    }
}

/// Delivery sink recording fired payloads.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub delivered: Mutex<Vec<TriggerPayload>>,
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(&self, payload: &TriggerPayload) -> AppResult<()> {
        self.delivered.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// The fully wired application under test.
pub struct TestApp {
    pub schedule_service: Arc<ScheduleService>,
    pub task_service: Arc<TaskService>,
    pub message_service: Arc<MessageService>,
    pub task_events: TaskStateEventService,
    pub message_events: MessageStateEventService,
    pub protocol_source: Arc<StaticProtocolSource>,
    pub trigger_runtime: Arc<OneShotTriggerRuntime>,
    pub user_repo: Arc<MemoryUserRepository>,
    pub user: User,
    pub project: Project,
}

impl TestApp {
    pub async fn new() -> Self {
        let protocol_source = Arc::new(StaticProtocolSource::new(weekly_protocol("1.0.0")));
        let sink: Arc<dyn DeliverySink> = Arc::new(RecordingSink::default());
        let trigger_runtime = Arc::new(
            OneShotTriggerRuntime::start(sink)
                .await
                .expect("trigger runtime should start"),
        );
        let trigger_adapter = Arc::new(MessageTriggerAdapter::new(
            Arc::clone(&trigger_runtime) as Arc<dyn TriggerScheduler>
        ));

        let user_repo = Arc::new(MemoryUserRepository::new());
        let project_repo = Arc::new(MemoryProjectRepository::new());
        let task_event_repo = Arc::new(MemoryTaskStateEventRepository::new());
        let message_event_repo = Arc::new(MemoryMessageStateEventRepository::new());

        let task_service = Arc::new(TaskService::new(
            Arc::new(MemoryTaskRepository::new()),
            Arc::clone(&task_event_repo) as Arc<dyn TaskStateEventRepository>,
        ));
        let message_service = Arc::new(MessageService::new(
            Arc::new(MemoryNotificationRepository::new()),
            Arc::new(MemoryDataMessageRepository::new()),
            Arc::clone(&message_event_repo) as Arc<dyn MessageStateEventRepository>,
            trigger_adapter,
        ));
        let schedule_service = Arc::new(ScheduleService::new(
            Arc::clone(&protocol_source) as Arc<dyn ProtocolSource>,
            Arc::clone(&user_repo) as Arc<dyn UserRepository>,
            Arc::clone(&project_repo) as Arc<dyn ProjectRepository>,
            Arc::clone(&task_service),
            Arc::clone(&message_service),
            ScheduleCache::new(&ScheduleCacheConfig { capacity: 1_000 }),
        ));

        let task_events = TaskStateEventService::new(
            task_event_repo,
            Arc::clone(&task_service),
            Arc::clone(&message_service),
        );
        let message_events =
            MessageStateEventService::new(message_event_repo, Arc::clone(&message_service));

        let project = Project::new("radar-pilot");
        project_repo.save(&project).await.unwrap();

        let mut user = User::new(project.id, "sub-1", "Europe/London");
        let noon = Utc::now()
            .date_naive()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc();
        user.enrolment_date = Some(noon - Duration::days(30));
        user_repo.save(&user).await.unwrap();

        Self {
            schedule_service,
            task_service,
            message_service,
            task_events,
            message_events,
            protocol_source,
            trigger_runtime,
            user_repo,
            user,
            project,
        }
    }
}

/// A weekly questionnaire protocol with one task per occurrence placed
/// eight days after it, notifications, and one reminder. The eight-day
/// offset keeps every generated instant in the future, so trigger counts
/// stay stable while a test is running.
pub fn weekly_protocol(version: &str) -> Protocol {
    Protocol {
        version: Some(version.to_string()),
        assessments: vec![Assessment {
            name: "PHQ8".to_string(),
            assessment_type: AssessmentType::Simple,
            order: 0,
            n_questions: Some(8),
            show_in_calendar: true,
            is_demo: false,
            estimated_completion_minutes: Some(4),
            protocol: Some(AssessmentProtocol {
                reference_timestamp: None,
                repeat_protocol: Some(RepeatProtocol {
                    unit: RepeatUnit::Week,
                    amount: 1,
                    days_of_week: None,
                }),
                repeat_questionnaire: Some(RepeatQuestionnaire {
                    unit: RepeatUnit::Day,
                    units_from_zero: Some(vec![8]),
                    random_units_from_zero_between: None,
                    day_of_week_map: None,
                }),
                notification: Some(NotificationProtocol {
                    enabled: true,
                    title: None,
                    body: None,
                    email: Default::default(),
                }),
                reminders: Some(ReminderTimePeriod {
                    unit: RepeatUnit::Hour,
                    amount: 1,
                    repeat: Some(1),
                    email: Default::default(),
                }),
                completion_window: Some(TimePeriod::new(RepeatUnit::Day, 1)),
            }),
        }],
    }
}
