use super::{Alert, AlertType, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// AlertGroup is one digest group produced by aggregation: the alerts
/// that shared a grouping key within the aggregation window.
///
/// Invariants: `count == alerts.len()` and `first_alert <= last_alert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertGroup {
    pub key: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub count: usize,
    pub first_alert: DateTime<Utc>,
    pub last_alert: DateTime<Utc>,
    pub title: String,
    pub message: String,
    pub highest_severity: Severity,
    /// Distinct non-empty farm ids touched by the group, sorted.
    pub affected_farms: Vec<String>,
    /// Member alerts, owned by the group only for the duration of the
    /// aggregation call.
    pub alerts: Vec<Alert>,
}
