//! Integration tests for external state event reporting.

use chrono::Utc;

use studyhub_core::error::ErrorKind;
use studyhub_entity::message::MessageState;
use studyhub_entity::task::TaskState;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_completed_report_cancels_delivery_triggers() {
    let app = TestApp::new().await;

    app.schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();
    let tasks = app.task_service.get_tasks_by_user(&app.user).await.unwrap();
    let target = &tasks[0];
    let triggers_before = app.trigger_runtime.len();
    assert!(triggers_before > 0);

    app.task_events
        .report_external(&target.id, TaskState::Completed, Utc::now(), None, &app.user)
        .await
        .unwrap();

    // The task is completed and its notifications (due + reminder) are
    // gone, triggers included.
    let updated = app.task_service.get_task(&target.id).await.unwrap();
    assert!(updated.completed);
    let remaining = app
        .message_service
        .get_notifications_by_user(&app.user)
        .await
        .unwrap();
    assert!(remaining.iter().all(|n| n.message.task_id != Some(target.id)));
    assert!(app.trigger_runtime.len() < triggers_before);

    app.trigger_runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_event_cap_rejects_excess_reports() {
    let app = TestApp::new().await;

    app.schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();
    let tasks = app.task_service.get_tasks_by_user(&app.user).await.unwrap();
    let target = &tasks[0];

    // One ADDED event exists from persistence; fill up to the cap of 20.
    for _ in 0..19 {
        app.task_events
            .report_external(&target.id, TaskState::Unknown, Utc::now(), None, &app.user)
            .await
            .unwrap();
    }
    let err = app
        .task_events
        .report_external(&target.id, TaskState::Unknown, Utc::now(), None, &app.user)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    app.trigger_runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_message_cancelled_report_is_ignored() {
    let app = TestApp::new().await;

    app.schedule_service
        .generate_for_subject("radar-pilot", "sub-1")
        .await
        .unwrap();
    let notifications = app
        .message_service
        .get_notifications_by_user(&app.user)
        .await
        .unwrap();
    let message_id = notifications[0].message.id;

    let before = app.message_events.get_events(&message_id).await.unwrap().len();
    app.message_events
        .report_external(&message_id, MessageState::Cancelled, Utc::now(), None)
        .await
        .unwrap();
    let events = app.message_events.get_events(&message_id).await.unwrap();
    assert_eq!(events.len(), before);

    // A regular delivery confirmation is recorded.
    app.message_events
        .report_external(&message_id, MessageState::Delivered, Utc::now(), None)
        .await
        .unwrap();
    let events = app.message_events.get_events(&message_id).await.unwrap();
    assert_eq!(events.last().unwrap().state, MessageState::Delivered);

    app.trigger_runtime.shutdown().await.unwrap();
}
