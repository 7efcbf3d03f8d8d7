use chrono::{DateTime, Utc};
use models::{Alert, AlertType, Severity};
use serde::{Deserialize, Serialize};

/// Ordinal priority bucket in 1..=5, used for SLA selection and action
/// gating. Severity sets the base; climate and health alerts are bumped
/// one bucket because they degrade fastest if ignored.
pub fn ordinal_priority(alert: &Alert) -> u8 {
    let base: u8 = match alert.severity {
        Severity::Info => 1,
        Severity::Warning => 2,
        Severity::Critical => 4,
        Severity::Emergency => 5,
    };
    let bumped = match alert.alert_type {
        AlertType::Climate | AlertType::Health => base + 1,
        _ => base,
    };
    bumped.clamp(1, 5)
}

/// Strategy parameterizes the ranking score used for batch
/// prioritization. It never affects the ordinal priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    SeverityFirst,
    TimeSensitive,
    ImpactBased,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::SeverityFirst => "SEVERITY_FIRST",
            Strategy::TimeSensitive => "TIME_SENSITIVE",
            Strategy::ImpactBased => "IMPACT_BASED",
        }
    }

    /// Parse a caller-supplied strategy name. Unrecognized input behaves
    /// as SEVERITY_FIRST.
    pub fn parse(name: &str) -> Strategy {
        for strategy in [
            Strategy::SeverityFirst,
            Strategy::TimeSensitive,
            Strategy::ImpactBased,
        ] {
            if name.eq_ignore_ascii_case(strategy.name()) {
                return strategy;
            }
        }
        Strategy::SeverityFirst
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ranking score of a single alert under the given strategy.
pub fn ranking_score(alert: &Alert, strategy: Strategy, now: DateTime<Utc>) -> f64 {
    let mut score: f64 = match alert.severity {
        Severity::Emergency => 100.0,
        Severity::Critical => 80.0,
        Severity::Warning => 50.0,
        Severity::Info => 20.0,
    };

    match strategy {
        Strategy::SeverityFirst => (), // Severity already dominates.
        Strategy::TimeSensitive => {
            let age = now.signed_duration_since(alert.created_at);
            if age < chrono::Duration::minutes(5) {
                score += 20.0;
            } else if age < chrono::Duration::minutes(30) {
                score += 10.0;
            }
        }
        Strategy::ImpactBased => {
            if matches!(alert.alert_type, AlertType::Climate | AlertType::Health) {
                score += 15.0;
            }
        }
    }

    score
}

/// Response SLA in minutes for a given ranking score.
pub fn recommended_sla_minutes(score: f64) -> u32 {
    if score >= 90.0 {
        5
    } else if score >= 70.0 {
        15
    } else if score >= 50.0 {
        60
    } else {
        240
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAlert {
    pub alert: Alert,
    pub priority_score: f64,
    /// 1-based position after the stable descending sort.
    pub rank: u32,
    pub recommended_sla_minutes: u32,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub ranked: Vec<RankedAlert>,
    /// Ids of the top ceil(20%) by rank, plus any alert scoring above 80.
    pub critical_ids: Vec<String>,
}

/// Rank a batch of alerts by strategy score, descending. The sort is
/// stable: equal scores keep their relative input order.
pub fn prioritize(alerts: Vec<Alert>, strategy: Strategy, now: DateTime<Utc>) -> Ranking {
    let mut scored: Vec<(Alert, f64)> = alerts
        .into_iter()
        .map(|alert| {
            let score = ranking_score(&alert, strategy, now);
            (alert, score)
        })
        .collect();
    scored.sort_by(|(_, l), (_, r)| r.total_cmp(l));

    let critical_cutoff = scored.len().div_ceil(5); // ceil(0.2 × N)
    let mut critical_ids = Vec::new();

    let ranked: Vec<RankedAlert> = scored
        .into_iter()
        .enumerate()
        .map(|(index, (alert, score))| {
            if index < critical_cutoff || score > 80.0 {
                critical_ids.push(alert.id.clone());
            }
            let reasoning = format!(
                "score {score:.1} under {strategy}: severity {}, type {}",
                alert.severity, alert.alert_type,
            );
            RankedAlert {
                priority_score: score,
                rank: (index + 1) as u32,
                recommended_sla_minutes: recommended_sla_minutes(score),
                reasoning,
                alert,
            }
        })
        .collect();

    Ranking {
        ranked,
        critical_ids,
    }
}
