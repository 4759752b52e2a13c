//! Per-subject schedule reconciliation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use studyhub_cache::ScheduleCache;
use studyhub_core::error::ErrorKind;
use studyhub_core::types::filter::FilterField;
use studyhub_core::{AppError, AppResult};
use studyhub_entity::protocol::{Assessment, AssessmentType};
use studyhub_entity::schedule::{AssessmentSchedule, Schedule};
use studyhub_entity::task::Task;
use studyhub_entity::user::User;
use studyhub_protocol::ProtocolSource;
use studyhub_scheduling::ScheduleGenerator;
use studyhub_store::traits::{ProjectRepository, UserRepository};

use crate::message::MessageService;
use crate::task::TaskService;

/// Reconciles a subject's generated schedule against the previous one.
///
/// Regeneration is cheap and idempotent thanks to natural-key
/// deduplication, so the service runs the pipeline on every call; the
/// expensive path — deleting all previously generated rows first — is
/// taken only when the protocol version or the subject's timezone
/// drifted. That full rebuild is deliberate: partial updates to
/// timestamp-laden data are error-prone, and the carry-over stage
/// recovers completed state.
#[derive(Clone)]
pub struct ScheduleService {
    protocol_source: Arc<dyn ProtocolSource>,
    user_repo: Arc<dyn UserRepository>,
    project_repo: Arc<dyn ProjectRepository>,
    task_service: Arc<TaskService>,
    message_service: Arc<MessageService>,
    generator: ScheduleGenerator,
    cache: ScheduleCache,
}

impl ScheduleService {
    /// Create a new schedule service.
    pub fn new(
        protocol_source: Arc<dyn ProtocolSource>,
        user_repo: Arc<dyn UserRepository>,
        project_repo: Arc<dyn ProjectRepository>,
        task_service: Arc<TaskService>,
        message_service: Arc<MessageService>,
        cache: ScheduleCache,
    ) -> Self {
        Self {
            protocol_source,
            user_repo,
            project_repo,
            task_service,
            message_service,
            generator: ScheduleGenerator::new(),
            cache,
        }
    }

    /// Generate the schedule for a subject addressed by project and
    /// subject id.
    pub async fn generate_for_subject(
        &self,
        project_name: &str,
        subject_id: &str,
    ) -> AppResult<Schedule> {
        let user = self.require_user(project_name, subject_id).await?;
        self.generate_for_user(&user).await
    }

    /// Generate the schedule for a user, reconciling against the
    /// previous generation.
    pub async fn generate_for_user(&self, user: &User) -> AppResult<Schedule> {
        let protocol = match self
            .protocol_source
            .protocol_for_subject(&user.subject_id)
            .await
        {
            Ok(protocol) => protocol,
            Err(error) if error.kind == ErrorKind::NotFound => {
                debug!(subject = %user.subject_id, "No protocol for subject, storing empty schedule");
                let empty = Schedule::default();
                self.cache.insert(&user.subject_id, empty.clone()).await;
                return Ok(empty);
            }
            Err(error) => return Err(error),
        };

        let cached = self
            .cache
            .get(&user.subject_id)
            .await
            .map(|cached| (*cached).clone())
            .unwrap_or_default();
        let prev_timezone = cached
            .timezone
            .clone()
            .unwrap_or_else(|| user.timezone.clone());

        // Completion state lives in the persisted rows, not the cache;
        // snapshot it before any deletion so the carry-over stage can
        // recover it.
        let prev_schedule = Schedule {
            assessment_schedules: grouped_by_assessment(
                self.task_service.get_tasks_by_user(user).await?,
            ),
            version: cached.version.clone(),
            timezone: cached.timezone.clone(),
        };

        if prev_schedule.version != protocol.version || prev_timezone != user.timezone {
            info!(
                subject = %user.subject_id,
                prev_version = ?prev_schedule.version,
                version = ?protocol.version,
                prev_timezone = %prev_timezone,
                timezone = %user.timezone,
                "Protocol or timezone drift, rebuilding schedule from scratch"
            );
            self.remove_generated_rows(user).await?;
        }

        let schedule = self.generator.generate_for_user(user, &protocol, &prev_schedule);
        self.cache.insert(&user.subject_id, schedule.clone()).await;
        self.persist(user, &schedule.assessment_schedules).await?;
        Ok(schedule)
    }

    /// Regenerate a single assessment for a subject without touching the
    /// rest of the schedule. The assessment must exist in the subject's
    /// protocol.
    pub async fn generate_single_assessment(
        &self,
        project_name: &str,
        subject_id: &str,
        assessment: &Assessment,
    ) -> AppResult<Schedule> {
        let user = self.require_user(project_name, subject_id).await?;
        let protocol = self
            .protocol_source
            .protocol_for_subject(&user.subject_id)
            .await?;
        if !protocol.has_assessment(&assessment.name) {
            return Err(AppError::not_found(format!(
                "Assessment '{}' not found in the subject's protocol; add it to the protocol first",
                assessment.name
            )));
        }

        let assessment_schedule = self.generator.generate_single(
            assessment,
            &user,
            Vec::new(),
            &user.timezone,
        )?;
        self.persist(&user, std::slice::from_ref(&assessment_schedule))
            .await?;

        let mut schedule = self
            .cache
            .get(&user.subject_id)
            .await
            .map(|cached| (*cached).clone())
            .unwrap_or_default();
        schedule.push_assessment_schedule(assessment_schedule);
        self.cache.insert(&user.subject_id, schedule.clone()).await;
        Ok(schedule)
    }

    /// The cached schedule for a subject, empty if never generated.
    pub async fn schedule_for_subject(&self, subject_id: &str) -> Schedule {
        self.cache
            .get(subject_id)
            .await
            .map(|cached| (*cached).clone())
            .unwrap_or_default()
    }

    /// All tasks for a subject.
    pub async fn get_tasks(&self, project_name: &str, subject_id: &str) -> AppResult<Vec<Task>> {
        let user = self.require_user(project_name, subject_id).await?;
        self.task_service.get_tasks_by_user(&user).await
    }

    /// Tasks narrowed by type and a `field(:|<|>)value` search
    /// expression.
    pub async fn get_tasks_by_type(
        &self,
        project_name: &str,
        subject_id: &str,
        assessment_type: Option<AssessmentType>,
        search: &str,
    ) -> AppResult<Vec<Task>> {
        let user = self.require_user(project_name, subject_id).await?;
        let fields = FilterField::parse_expression(search);
        self.task_service
            .get_tasks_by_filter(&user, assessment_type, &fields)
            .await
    }

    /// Tasks whose `[timestamp, timestamp + completion window]` interval
    /// overlaps `[start_time, end_time]`.
    pub async fn get_tasks_in_window(
        &self,
        project_name: &str,
        subject_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> AppResult<Vec<Task>> {
        let user = self.require_user(project_name, subject_id).await?;
        let mut tasks = self.task_service.get_tasks_by_user(&user).await?;
        tasks.retain(|task| task.window_end() >= start_time && task.timestamp <= end_time);
        Ok(tasks)
    }

    /// Delete a subject's entire generated schedule: tasks, messages,
    /// triggers, and the cache entry.
    pub async fn remove_schedule(&self, project_name: &str, subject_id: &str) -> AppResult<()> {
        let user = self.require_user(project_name, subject_id).await?;
        self.remove_generated_rows(&user).await?;
        self.cache.invalidate(&user.subject_id).await;
        Ok(())
    }

    /// Delete the tasks matching a type and search expression, together
    /// with their notifications and triggers. Returns the number of
    /// deleted tasks.
    pub async fn remove_schedule_by_type(
        &self,
        project_name: &str,
        subject_id: &str,
        assessment_type: Option<AssessmentType>,
        search: &str,
    ) -> AppResult<u64> {
        let user = self.require_user(project_name, subject_id).await?;
        let fields = FilterField::parse_expression(search);
        let deleted = self
            .task_service
            .delete_tasks_by_filter(&user, assessment_type, &fields)
            .await?;
        for task in &deleted {
            self.message_service
                .delete_notifications_by_task(&task.id, &user)
                .await?;
        }
        Ok(deleted.len() as u64)
    }

    async fn remove_generated_rows(&self, user: &User) -> AppResult<()> {
        let tasks = self.task_service.delete_tasks_by_user(&user.id).await?;
        let messages = self.message_service.delete_messages_by_user(user).await?;
        debug!(
            subject = %user.subject_id,
            tasks,
            messages,
            "Removed previously generated schedule rows"
        );
        Ok(())
    }

    async fn persist(
        &self,
        user: &User,
        assessment_schedules: &[AssessmentSchedule],
    ) -> AppResult<()> {
        for assessment_schedule in assessment_schedules.iter().filter(|s| s.has_tasks()) {
            let tasks = assessment_schedule.tasks.clone().unwrap_or_default();
            self.task_service.add_tasks(tasks, user).await?;

            if let Some(notifications) = assessment_schedule.notifications.clone() {
                self.message_service
                    .add_notifications(notifications, user)
                    .await?;
            }
            if let Some(reminders) = assessment_schedule.reminders.clone() {
                self.message_service.add_notifications(reminders, user).await?;
            }
        }
        Ok(())
    }

    async fn require_user(&self, project_name: &str, subject_id: &str) -> AppResult<User> {
        let project = self
            .project_repo
            .find_by_name(project_name)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Project '{project_name}' not found; create the project first"
                ))
            })?;
        self.user_repo
            .find_by_subject_and_project(subject_id, &project.id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Subject '{subject_id}' not found in project '{project_name}'; create the user first"
                ))
            })
    }
}

impl std::fmt::Debug for ScheduleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleService").finish()
    }
}

/// Group a flat task list into per-assessment schedules for the
/// carry-over stage.
fn grouped_by_assessment(tasks: Vec<Task>) -> Vec<AssessmentSchedule> {
    let mut by_name: Vec<(String, Vec<Task>)> = Vec::new();
    for task in tasks {
        match by_name.iter_mut().find(|(name, _)| *name == task.name) {
            Some((_, bucket)) => bucket.push(task),
            None => by_name.push((task.name.clone(), vec![task])),
        }
    }
    by_name
        .into_iter()
        .map(|(name, tasks)| AssessmentSchedule {
            name: Some(name),
            tasks: Some(tasks),
            ..Default::default()
        })
        .collect()
}
