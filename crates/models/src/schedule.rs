use super::{Alert, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recurrence patterns for scheduled alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    Hourly,
    Daily,
    Weekly,
}

impl Recurrence {
    pub fn name(&self) -> &'static str {
        match self {
            Recurrence::Hourly => "HOURLY",
            Recurrence::Daily => "DAILY",
            Recurrence::Weekly => "WEEKLY",
        }
    }

    /// Parse a recurrence pattern. An empty or unrecognized pattern is
    /// None: the schedule simply has no next execution.
    pub fn parse(pattern: &str) -> Option<Recurrence> {
        for recurrence in [Recurrence::Hourly, Recurrence::Daily, Recurrence::Weekly] {
            if pattern.eq_ignore_ascii_case(recurrence.name()) {
                return Some(recurrence);
            }
        }
        None
    }

    /// The fixed offset between executions.
    pub fn interval(&self) -> chrono::Duration {
        match self {
            Recurrence::Hourly => chrono::Duration::hours(1),
            Recurrence::Daily => chrono::Duration::hours(24),
            Recurrence::Weekly => chrono::Duration::days(7),
        }
    }
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// ScheduleStatus reflects how close a schedule entry is to its trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Scheduled,
    PendingExecution,
}

impl ScheduleStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "SCHEDULED",
            ScheduleStatus::PendingExecution => "PENDING_EXECUTION",
        }
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// ScheduleEntry is an accepted request to deliver an alert at a future
/// time, possibly on a recurring pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub schedule_id: Id,
    pub alert: Alert,
    pub scheduled_for: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    pub status: ScheduleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_execution: Option<DateTime<Utc>>,
    pub estimated_delay_seconds: i64,
}
