use crate::validate::{self, Violation};
use chrono::{DateTime, Utc};
use models::{AlertDraft, Id, Recurrence, ScheduleEntry, ScheduleStatus};

/// Schedules within this horizon are already pending execution.
const PENDING_EXECUTION_WITHIN_MINUTES: i64 = 5;

/// Why a schedule request was refused. Both variants are business
/// failures reported in the response, not faults.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule time must be in the future")]
    NotInFuture,
    #[error("invalid alert: {}", format_violations(.0))]
    InvalidAlert(Vec<Violation>),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate and register a future delivery of the drafted alert.
///
/// The schedule time is checked before the draft: a past-dated request is
/// refused outright, whatever else is wrong with it.
pub fn schedule(
    draft: &AlertDraft,
    scheduled_for: DateTime<Utc>,
    recurrence_pattern: &str,
    schedule_id: Id,
    now: DateTime<Utc>,
) -> Result<ScheduleEntry, ScheduleError> {
    if scheduled_for <= now {
        return Err(ScheduleError::NotInFuture);
    }

    let alert = validate::parse_draft(draft, now).map_err(ScheduleError::InvalidAlert)?;

    let recurrence = Recurrence::parse(recurrence_pattern);
    let next_execution = recurrence.map(|r| scheduled_for + r.interval());

    let delay = scheduled_for.signed_duration_since(now);
    let status = if delay < chrono::Duration::minutes(PENDING_EXECUTION_WITHIN_MINUTES) {
        ScheduleStatus::PendingExecution
    } else {
        ScheduleStatus::Scheduled
    };

    Ok(ScheduleEntry {
        schedule_id,
        alert,
        scheduled_for,
        recurrence,
        status,
        next_execution,
        estimated_delay_seconds: delay.num_seconds(),
    })
}
