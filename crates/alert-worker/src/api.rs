//! Request and response shapes of the worker's operations. The
//! transport that carries them is an external, replaceable concern;
//! these structs define the message contract.

use chrono::{DateTime, Utc};
use dispatch::DispatchStats;
use models::{AlertDraft, AlertGroup, ChannelPrefs, Id, Notification, ScheduleStatus};
use pipeline::{Action, RankedAlert, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAlertRequest {
    pub alert: AlertDraft,
    /// Request-scoped preferences; they shadow the worker's shared
    /// preference store for this call only.
    #[serde(default)]
    pub user_preferences: BTreeMap<String, ChannelPrefs>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAlertResponse {
    pub success: bool,
    pub alert_id: String,
    pub processed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_priority: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProcessRequest {
    pub alerts: Vec<AlertDraft>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAlertResult {
    pub alert_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total_alerts: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub processing_time_ms: u64,
    /// Alerts per second, 0 for an instantaneous (or empty) batch.
    pub throughput_per_second: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProcessResponse {
    pub results: Vec<BatchAlertResult>,
    pub stats: BatchStats,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizeRequest {
    pub alerts: Vec<AlertDraft>,
    /// Strategy name; unrecognized input behaves as SEVERITY_FIRST.
    #[serde(default)]
    pub strategy: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizeResponse {
    pub prioritized_alerts: Vec<RankedAlert>,
    pub critical_alert_ids: Vec<String>,
    pub strategy: Strategy,
    /// Drafts that failed validation and were left out of the ranking.
    pub skipped: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub results: Vec<Notification>,
    pub stats: DispatchStats,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
    pub alerts: Vec<AlertDraft>,
    /// Grouping strategy name; unrecognized input behaves as BY_TYPE.
    #[serde(default)]
    pub strategy: String,
    pub time_window_minutes: i64,
    pub min_alerts_to_aggregate: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub groups: Vec<AlertGroup>,
    pub original_alert_count: usize,
    pub aggregated_group_count: usize,
    pub reduction_rate: f64,
    /// Drafts that failed validation and were left out of aggregation.
    pub skipped: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub alert: AlertDraft,
    pub schedule_time: DateTime<Utc>,
    #[serde(default)]
    pub recurrence_pattern: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ScheduleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_execution: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delay_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
