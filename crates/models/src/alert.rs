use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// AlertType classifies the condition an alert describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Climate,
    Market,
    Operational,
    Financial,
    Health,
    Compliance,
}

impl AlertType {
    pub fn name(&self) -> &'static str {
        match self {
            AlertType::Climate => "CLIMATE",
            AlertType::Market => "MARKET",
            AlertType::Operational => "OPERATIONAL",
            AlertType::Financial => "FINANCIAL",
            AlertType::Health => "HEALTH",
            AlertType::Compliance => "COMPLIANCE",
        }
    }

    fn all() -> &'static [AlertType] {
        &[
            AlertType::Climate,
            AlertType::Market,
            AlertType::Operational,
            AlertType::Financial,
            AlertType::Health,
            AlertType::Compliance,
        ]
    }

    pub fn parse(name: &str) -> Option<AlertType> {
        for alert_type in AlertType::all() {
            if name.eq_ignore_ascii_case(alert_type.name()) {
                return Some(*alert_type);
            }
        }
        None
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Severity is the ordinal urgency of an alert.
/// Variant order is load-bearing: the derived `Ord` gives
/// INFO < WARNING < CRITICAL < EMERGENCY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Emergency => "EMERGENCY",
        }
    }

    fn all() -> &'static [Severity] {
        &[
            Severity::Info,
            Severity::Warning,
            Severity::Critical,
            Severity::Emergency,
        ]
    }

    pub fn parse(name: &str) -> Option<Severity> {
        for severity in Severity::all() {
            if name.eq_ignore_ascii_case(severity.name()) {
                return Some(*severity);
            }
        }
        None
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// AlertDraft is the wire shape of an inbound alert, exactly as a caller
/// submitted it. Classification fields are uninterpreted strings: an empty
/// or unrecognized type or severity is a validation violation, not a parse
/// fault. Validation turns a draft into a typed [`Alert`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertDraft {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub source: String,
    pub farm_id: String,
    pub user_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub metadata: BTreeMap<String, String>,
}

/// Alert is a validated alert event. Immutable once constructed;
/// enrichment derives a copy rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    /// Originating subsystem, may be empty.
    pub source: String,
    /// Farm the alert concerns, may be empty for farm-agnostic alerts.
    pub farm_id: String,
    /// Owning user, may be empty for unattributed alerts.
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Per-recipient notification opt-in flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelPrefs {
    pub email_enabled: bool,
    pub sms_enabled: bool,
}
