use chrono::{DateTime, Utc};
use models::{Alert, AlertType};
use serde::{Deserialize, Serialize};

/// Derive an enriched copy of an alert, stamping processing metadata.
/// The input alert is never mutated.
pub fn enrich(alert: &Alert, now: DateTime<Utc>, processor: &str) -> Alert {
    let mut enriched = alert.clone();
    enriched
        .metadata
        .insert("enriched_at".to_string(), now.timestamp().to_string());
    enriched
        .metadata
        .insert("processor".to_string(), processor.to_string());
    enriched
}

/// Action is a follow-up the pipeline commits to for a processed alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    NotifyImmediately,
    LogIncident,
    NotifyUsers,
    UpdateForecast,
    UpdatePrices,
    StoreAlert,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::NotifyImmediately => "NOTIFY_IMMEDIATELY",
            Action::LogIncident => "LOG_INCIDENT",
            Action::NotifyUsers => "NOTIFY_USERS",
            Action::UpdateForecast => "UPDATE_FORECAST",
            Action::UpdatePrices => "UPDATE_PRICES",
            Action::StoreAlert => "STORE_ALERT",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The action plan for an alert at a given ordinal priority. Rules
/// accumulate rather than exclude one another, and STORE_ALERT always
/// closes the plan.
pub fn plan_actions(alert: &Alert, priority: u8) -> Vec<Action> {
    let mut actions = Vec::new();

    if priority >= 4 {
        actions.push(Action::NotifyImmediately);
        actions.push(Action::LogIncident);
    }
    if priority >= 3 {
        actions.push(Action::NotifyUsers);
    }
    if alert.alert_type == AlertType::Climate {
        actions.push(Action::UpdateForecast);
    }
    if alert.alert_type == AlertType::Market {
        actions.push(Action::UpdatePrices);
    }
    actions.push(Action::StoreAlert);

    actions
}
