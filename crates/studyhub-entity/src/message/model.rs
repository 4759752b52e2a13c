//! Notification and data message entity models.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studyhub_core::types::id::{MessageId, TaskId, UserId};
use studyhub_core::types::message_kind::MessageKind;

/// Fields shared by both message kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageFields {
    /// Unique message identifier.
    pub id: MessageId,
    /// The owning subject.
    pub user_id: UserId,
    /// The task this message belongs to, when generated from a schedule.
    pub task_id: Option<TaskId>,
    /// Identifier of the source device or component that requested the
    /// message.
    pub source_id: String,
    /// When the message should be delivered.
    pub scheduled_time: DateTime<Utc>,
    /// Time-to-live after the scheduled instant, in seconds.
    pub ttl_seconds: i64,
    /// Message id assigned by the delivery provider, once known.
    pub provider_message_id: Option<String>,
    /// Whether the transport confirmed delivery.
    pub delivered: bool,
    /// Whether the message passed provider-side validation.
    pub validated: bool,
    /// When set, the transport validates but does not deliver.
    pub dry_run: bool,
    /// Delivery priority hint.
    pub priority: Option<String>,
    /// Whether the client may mutate the content before display.
    pub mutable_content: bool,
    /// When the message row was created.
    pub created_at: DateTime<Utc>,
}

impl MessageFields {
    /// Create message fields for a subject with the given schedule slot.
    pub fn new(user_id: UserId, source_id: impl Into<String>, scheduled_time: DateTime<Utc>, ttl_seconds: i64) -> Self {
        Self {
            id: MessageId::new(),
            user_id,
            task_id: None,
            source_id: source_id.into(),
            scheduled_time,
            ttl_seconds,
            provider_message_id: None,
            delivered: false,
            validated: false,
            dry_run: false,
            priority: None,
            mutable_content: false,
            created_at: Utc::now(),
        }
    }

    /// The instant after which the message is no longer worth delivering.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.scheduled_time + chrono::Duration::seconds(self.ttl_seconds)
    }
}

/// A push notification with displayable content.
///
/// `(user_id, source_id, scheduled_time, ttl_seconds, title, body, kind)`
/// is the natural deduplication key enforced before insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Shared message fields.
    #[serde(flatten)]
    pub message: MessageFields,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// The assessment name the notification refers to.
    pub kind: String,
    /// Notification sound override.
    pub sound: Option<String>,
    /// Badge count override.
    pub badge: Option<String>,
    /// Action fired when the notification is tapped.
    pub click_action: Option<String>,
    /// Subtitle shown under the title on supported platforms.
    pub subtitle: Option<String>,
    /// Icon override.
    pub icon: Option<String>,
    /// Whether an email copy should also be sent.
    pub email_enabled: bool,
    /// Extra key/value data attached to the notification.
    pub additional_data: Option<HashMap<String, String>>,
}

/// A silent data message carrying a key/value payload.
///
/// `(user_id, source_id, scheduled_time, ttl_seconds)` is the natural
/// deduplication key enforced before insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataMessage {
    /// Shared message fields.
    #[serde(flatten)]
    pub message: MessageFields,
    /// The key/value payload.
    pub data: HashMap<String, String>,
}

/// The discriminated pair of message kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_kind")]
pub enum Message {
    Notification(Notification),
    Data(DataMessage),
}

impl Message {
    /// Shared fields regardless of kind.
    pub fn fields(&self) -> &MessageFields {
        match self {
            Self::Notification(n) => &n.message,
            Self::Data(d) => &d.message,
        }
    }

    /// Unique message identifier.
    pub fn id(&self) -> MessageId {
        self.fields().id
    }

    /// The owning subject.
    pub fn user_id(&self) -> UserId {
        self.fields().user_id
    }

    /// When the message should be delivered.
    pub fn scheduled_time(&self) -> DateTime<Utc> {
        self.fields().scheduled_time
    }

    /// The message-kind discriminator used in trigger payloads.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Notification(_) => MessageKind::Notification,
            Self::Data(_) => MessageKind::Data,
        }
    }
}

impl From<Notification> for Message {
    fn from(notification: Notification) -> Self {
        Self::Notification(notification)
    }
}

impl From<DataMessage> for Message {
    fn from(data: DataMessage) -> Self {
        Self::Data(data)
    }
}
