//! Integration tests for schedule generation and reconciliation.

use chrono::{Duration, Utc};

use studyhub_entity::task::TaskState;
use studyhub_store::UserRepository;

use crate::helpers::{TestApp, weekly_protocol};

#[tokio::test]
async fn test_generation_persists_tasks_and_registers_triggers() {
    let app = TestApp::new().await;

    let schedule = app
        .schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();
    assert_eq!(schedule.version.as_deref(), Some("1.0.0"));
    assert_eq!(schedule.timezone.as_deref(), Some("Europe/London"));

    let tasks = app.task_service.get_tasks_by_user(&app.user).await.unwrap();
    assert!(!tasks.is_empty());
    for task in &tasks {
        assert_eq!(task.status, TaskState::Added);
        // Occurrences are clamped to one week around now; tasks sit
        // eight days after their occurrence.
        assert!(task.timestamp > Utc::now());
        assert!(task.timestamp < Utc::now() + Duration::days(16));
    }

    // Every undelivered notification got a trigger.
    let notifications = app
        .message_service
        .get_notifications_by_user(&app.user)
        .await
        .unwrap();
    assert!(!notifications.is_empty());
    assert_eq!(app.trigger_runtime.len(), notifications.len());

    app.trigger_runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_regeneration_without_drift_adds_nothing() {
    let app = TestApp::new().await;

    app.schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();
    let tasks_before = app.task_service.get_tasks_by_user(&app.user).await.unwrap().len();
    let notifications_before = app
        .message_service
        .get_notifications_by_user(&app.user)
        .await
        .unwrap()
        .len();
    let triggers_before = app.trigger_runtime.len();

    app.schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();

    assert_eq!(
        app.task_service.get_tasks_by_user(&app.user).await.unwrap().len(),
        tasks_before
    );
    assert_eq!(
        app.message_service
            .get_notifications_by_user(&app.user)
            .await
            .unwrap()
            .len(),
        notifications_before
    );
    assert_eq!(app.trigger_runtime.len(), triggers_before);

    app.trigger_runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_protocol_version_bump_rebuilds_schedule() {
    let app = TestApp::new().await;

    app.schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();
    let old_tasks = app.task_service.get_tasks_by_user(&app.user).await.unwrap();

    app.protocol_source.set(weekly_protocol("2.0.0"));
    let schedule = app
        .schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();
    assert_eq!(schedule.version.as_deref(), Some("2.0.0"));

    let new_tasks = app.task_service.get_tasks_by_user(&app.user).await.unwrap();
    assert_eq!(old_tasks.len(), new_tasks.len());
    for task in &new_tasks {
        assert!(old_tasks.iter().all(|old| old.id != task.id));
    }

    app.trigger_runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_timezone_move_preserves_completed_work() {
    let app = TestApp::new().await;

    app.schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();
    let tasks = app.task_service.get_tasks_by_user(&app.user).await.unwrap();
    let completed = app
        .task_events
        .report_external(
            &tasks[0].id,
            TaskState::Completed,
            Utc::now(),
            None,
            &app.user,
        )
        .await;
    completed.unwrap();

    let mut moved = app.user.clone();
    moved.timezone = "America/New_York".to_string();
    app.user_repo.save(&moved).await.unwrap();

    app.schedule_service.generate_for_user(&moved).await.unwrap();

    let regenerated = app.task_service.get_tasks_by_user(&moved).await.unwrap();
    let carried: Vec<_> = regenerated.iter().filter(|task| task.completed).collect();
    assert_eq!(carried.len(), 1);
    assert_eq!(carried[0].status, TaskState::Completed);
    assert!(carried[0].time_completed.is_some());

    app.trigger_runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_remove_schedule_clears_rows_and_triggers() {
    let app = TestApp::new().await;

    app.schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();
    assert!(app.trigger_runtime.len() > 0);

    app.schedule_service
        .remove_schedule("radar-pilot", "sub-1")
        .await
        .unwrap();

    assert!(app.task_service.get_tasks_by_user(&app.user).await.unwrap().is_empty());
    assert!(app
        .message_service
        .get_notifications_by_user(&app.user)
        .await
        .unwrap()
        .is_empty());
    assert!(app.trigger_runtime.is_empty());

    app.trigger_runtime.shutdown().await.unwrap();
}
