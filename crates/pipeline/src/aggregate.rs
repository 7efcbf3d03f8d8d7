use chrono::{DateTime, Utc};
use models::{Alert, AlertGroup};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// GroupBy selects the key alerts are bucketed under before windowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupBy {
    ByType,
    BySeverity,
    ByFarm,
    ByTypeAndFarm,
}

impl GroupBy {
    pub fn name(&self) -> &'static str {
        match self {
            GroupBy::ByType => "BY_TYPE",
            GroupBy::BySeverity => "BY_SEVERITY",
            GroupBy::ByFarm => "BY_FARM",
            GroupBy::ByTypeAndFarm => "BY_TYPE_AND_FARM",
        }
    }

    /// Parse a caller-supplied strategy name, defaulting to BY_TYPE.
    pub fn parse(name: &str) -> GroupBy {
        for group_by in [
            GroupBy::ByType,
            GroupBy::BySeverity,
            GroupBy::ByFarm,
            GroupBy::ByTypeAndFarm,
        ] {
            if name.eq_ignore_ascii_case(group_by.name()) {
                return group_by;
            }
        }
        GroupBy::ByType
    }

    fn key(&self, alert: &Alert) -> String {
        match self {
            GroupBy::ByType => alert.alert_type.name().to_string(),
            GroupBy::BySeverity => alert.severity.name().to_string(),
            GroupBy::ByFarm => alert.farm_id.clone(),
            GroupBy::ByTypeAndFarm => format!("{}_{}", alert.alert_type, alert.farm_id),
        }
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub groups: Vec<AlertGroup>,
    pub original_count: usize,
    /// (original − groups) / original, or 0 for empty input.
    pub reduction_rate: f64,
}

/// Group alerts by key, keep members created within the trailing window,
/// and drop groups smaller than `min_to_aggregate`. Groups are emitted in
/// key order for deterministic responses.
pub fn aggregate(
    alerts: &[Alert],
    group_by: GroupBy,
    window_minutes: i64,
    min_to_aggregate: usize,
    now: DateTime<Utc>,
) -> Aggregation {
    let mut buckets: BTreeMap<String, Vec<&Alert>> = BTreeMap::new();
    for alert in alerts {
        buckets.entry(group_by.key(alert)).or_default().push(alert);
    }

    let cutoff = now - chrono::Duration::minutes(window_minutes);
    let mut groups = Vec::new();

    for (key, members) in buckets {
        let windowed: Vec<&Alert> = members
            .into_iter()
            .filter(|alert| alert.created_at > cutoff)
            .collect();

        if windowed.is_empty() || windowed.len() < min_to_aggregate {
            continue;
        }

        let first_alert = windowed.iter().map(|a| a.created_at).min().unwrap();
        let last_alert = windowed.iter().map(|a| a.created_at).max().unwrap();
        let highest_severity = windowed.iter().map(|a| a.severity).max().unwrap();
        let affected_farms: BTreeSet<String> = windowed
            .iter()
            .filter(|a| !a.farm_id.is_empty())
            .map(|a| a.farm_id.clone())
            .collect();

        groups.push(AlertGroup {
            title: format!("{} {} alerts", windowed.len(), windowed[0].alert_type),
            message: format!(
                "Aggregated {} similar alerts within the trailing {}-minute window ({})",
                windowed.len(),
                window_minutes,
                group_by,
            ),
            key,
            alert_type: windowed[0].alert_type,
            count: windowed.len(),
            first_alert,
            last_alert,
            highest_severity,
            affected_farms: affected_farms.into_iter().collect(),
            alerts: windowed.into_iter().cloned().collect(),
        });
    }

    let reduction_rate = if alerts.is_empty() {
        0.0
    } else {
        (alerts.len() - groups.len()) as f64 / alerts.len() as f64
    };

    Aggregation {
        groups,
        original_count: alerts.len(),
        reduction_rate,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use models::{AlertType, Severity};

    fn alert(
        id: &str,
        alert_type: AlertType,
        severity: Severity,
        farm_id: &str,
        age_minutes: i64,
        now: DateTime<Utc>,
    ) -> Alert {
        Alert {
            id: id.to_string(),
            alert_type,
            severity,
            title: "t".to_string(),
            message: "m".to_string(),
            source: String::new(),
            farm_id: farm_id.to_string(),
            user_id: String::new(),
            created_at: now - chrono::Duration::minutes(age_minutes),
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_five_climate_alerts_form_one_group() {
        let now = Utc::now();
        let alerts: Vec<Alert> = (0..5)
            .map(|i| {
                alert(
                    &format!("a{i}"),
                    AlertType::Climate,
                    Severity::Warning,
                    "farm-1",
                    i,
                    now,
                )
            })
            .collect();

        let result = aggregate(&alerts, GroupBy::ByType, 60, 3, now);
        assert_eq!(result.groups.len(), 1);

        let group = &result.groups[0];
        assert_eq!(group.key, "CLIMATE");
        assert_eq!(group.count, 5);
        assert_eq!(group.count, group.alerts.len());
        assert!(group.first_alert <= group.last_alert);
        assert_eq!(group.title, "5 CLIMATE alerts");
        assert_eq!(group.affected_farms, vec!["farm-1"]);
        assert_eq!(result.reduction_rate, 4.0 / 5.0);
    }

    #[test]
    fn test_window_excludes_old_alerts() {
        let now = Utc::now();
        let alerts = vec![
            alert("a1", AlertType::Climate, Severity::Info, "f1", 5, now),
            alert("a2", AlertType::Climate, Severity::Info, "f1", 10, now),
            alert("a3", AlertType::Climate, Severity::Info, "f1", 90, now),
        ];

        let result = aggregate(&alerts, GroupBy::ByType, 60, 2, now);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].count, 2);
    }

    #[test]
    fn test_groups_below_minimum_are_dropped() {
        let now = Utc::now();
        let alerts = vec![
            alert("a1", AlertType::Climate, Severity::Info, "f1", 1, now),
            alert("a2", AlertType::Climate, Severity::Info, "f1", 2, now),
            alert("a3", AlertType::Market, Severity::Info, "f1", 3, now),
        ];

        let result = aggregate(&alerts, GroupBy::ByType, 60, 2, now);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].key, "CLIMATE");
        // Emitted groups never undercut the caller's minimum.
        assert!(result.groups.iter().all(|g| g.count >= 2));
    }

    #[test]
    fn test_composite_key_and_highest_severity() {
        let now = Utc::now();
        let alerts = vec![
            alert("a1", AlertType::Climate, Severity::Info, "f1", 1, now),
            alert("a2", AlertType::Climate, Severity::Emergency, "f1", 2, now),
            alert("a3", AlertType::Climate, Severity::Info, "f2", 3, now),
        ];

        let result = aggregate(&alerts, GroupBy::ByTypeAndFarm, 60, 1, now);
        let keys: Vec<_> = result.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["CLIMATE_f1", "CLIMATE_f2"]);
        assert_eq!(result.groups[0].highest_severity, Severity::Emergency);
        assert_eq!(result.groups[1].highest_severity, Severity::Info);
    }

    #[test]
    fn test_empty_input_is_a_defined_no_op() {
        let result = aggregate(&[], GroupBy::ByType, 60, 1, Utc::now());
        assert!(result.groups.is_empty());
        assert_eq!(result.original_count, 0);
        assert_eq!(result.reduction_rate, 0.0);
    }

    #[test]
    fn test_member_counts_never_exceed_input() {
        let now = Utc::now();
        let alerts = vec![
            alert("a1", AlertType::Climate, Severity::Info, "f1", 1, now),
            alert("a2", AlertType::Market, Severity::Info, "f2", 2, now),
            alert("a3", AlertType::Health, Severity::Info, "f3", 200, now),
        ];
        let result = aggregate(&alerts, GroupBy::ByType, 60, 1, now);
        let total: usize = result.groups.iter().map(|g| g.count).sum();
        assert!(total <= alerts.len());
        assert!(result.reduction_rate >= 0.0 && result.reduction_rate <= 1.0);
    }
}
