//! Pure computation stages of the alert pipeline: validation, priority
//! scoring, enrichment and action planning, recipient and channel
//! resolution, burst aggregation, and schedule computation.
//!
//! Every function here is a deterministic function of its inputs; "now"
//! is always an explicit argument so callers (and tests) own the clock.

pub mod aggregate;
pub mod enrich;
pub mod priority;
pub mod recipients;
pub mod schedule;
pub mod validate;

pub use aggregate::{aggregate, Aggregation, GroupBy};
pub use enrich::{enrich, plan_actions, Action};
pub use priority::{ordinal_priority, prioritize, ranking_score, Ranking, RankedAlert, Strategy};
pub use recipients::{channels, recipients, PreferenceLookup};
pub use schedule::{schedule, ScheduleError};
pub use validate::{parse_draft, violations, Violation};
