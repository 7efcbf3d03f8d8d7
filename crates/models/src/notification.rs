use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel is a delivery medium for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Email,
    Sms,
    Push,
    InApp,
    Webhook,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Email => "EMAIL",
            Channel::Sms => "SMS",
            Channel::Push => "PUSH",
            Channel::InApp => "IN_APP",
            Channel::Webhook => "WEBHOOK",
        }
    }

    pub fn all() -> &'static [Channel] {
        &[
            Channel::Email,
            Channel::Sms,
            Channel::Push,
            Channel::InApp,
            Channel::Webhook,
        ]
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// NotificationStatus is the delivery lifecycle state of a notification.
///
/// PENDING → SENT → DELIVERED on the success path. A failed send moves to
/// RETRYING while retries remain (returning to PENDING for the next
/// attempt), or to terminal FAILED once they are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
    Retrying,
}

impl NotificationStatus {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Delivered => "DELIVERED",
            NotificationStatus::Failed => "FAILED",
            NotificationStatus::Retrying => "RETRYING",
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NotificationStatus::Delivered | NotificationStatus::Failed
        )
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Notification is one delivery attempt record: one recipient on one
/// channel, derived from exactly one owning Alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Id,
    pub alert_id: String,
    pub channel: Channel,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: NotificationStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    /// Failure reason, set once the notification terminally fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Notification {
    pub fn new(
        id: Id,
        alert_id: impl Into<String>,
        channel: Channel,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        max_retries: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            alert_id: alert_id.into(),
            channel,
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            status: NotificationStatus::Pending,
            retry_count: 0,
            max_retries,
            created_at,
            sent_at: None,
            delivered_at: None,
            error: None,
        }
    }
}
