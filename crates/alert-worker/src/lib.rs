//! The alert worker service: validates and scores inbound alerts,
//! resolves who gets told and how, dispatches notifications with retry
//! handling, aggregates alert bursts, and schedules future deliveries.
//!
//! Collaborators are injected capabilities: an [`AlertStore`] cache, a
//! shared [`PreferenceStore`], and a `ChannelSender` that performs the
//! actual provider sends.

use anyhow::Context;
use chrono::Utc;
use dispatch::{ChannelSender, DispatchPolicy, Dispatcher};
use itertools::Itertools;
use models::{Alert, ChannelPrefs, IdGenerator, Notification};
use pipeline::{GroupBy, PreferenceLookup, Strategy};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub mod api;
mod render;
mod store;

pub use dispatch::confirm_delivery;
pub use store::{AlertStore, MemoryStore, PreferenceStore};

use api::*;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Processor identifier stamped into enrichment metadata.
    pub processor: String,
    /// On-call distribution address added for CRITICAL and EMERGENCY
    /// alerts.
    pub on_call_address: String,
    /// How long until a processed alert is due for review.
    pub review_interval: chrono::Duration,
    pub dispatch: DispatchPolicy,
    /// Shard stamped into generated notification and schedule ids.
    pub id_shard: u16,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            processor: "alert-worker".to_string(),
            on_call_address: "oncall@fieldline.dev".to_string(),
            review_interval: chrono::Duration::hours(1),
            dispatch: DispatchPolicy::default(),
            id_shard: 1,
        }
    }
}

pub struct AlertWorker<S, C: ChannelSender> {
    processor: String,
    on_call_address: String,
    review_interval: chrono::Duration,
    store: S,
    preferences: PreferenceStore,
    dispatcher: Dispatcher<C>,
    ids: Mutex<IdGenerator>,
}

/// Request-scoped preferences shadow the shared store.
struct OverlayPrefs<'a> {
    request: &'a BTreeMap<String, ChannelPrefs>,
    shared: &'a PreferenceStore,
}

impl PreferenceLookup for OverlayPrefs<'_> {
    fn prefs(&self, recipient: &str) -> Option<ChannelPrefs> {
        self.request
            .get(recipient)
            .copied()
            .or_else(|| self.shared.prefs(recipient))
    }
}

impl<S: AlertStore, C: ChannelSender> AlertWorker<S, C> {
    pub fn new(store: S, sender: C, config: WorkerConfig) -> Self {
        Self {
            processor: config.processor,
            on_call_address: config.on_call_address,
            review_interval: config.review_interval,
            store,
            preferences: PreferenceStore::new(),
            dispatcher: Dispatcher::new(sender, config.dispatch),
            ids: Mutex::new(IdGenerator::new(config.id_shard)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The shared preference store, for out-of-band opt-in updates.
    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Process one alert through the full intake pipeline, producing its
    /// action plan and the PENDING notifications to dispatch.
    #[tracing::instrument(skip_all, fields(alert_id = %req.alert.id))]
    pub async fn process_alert(
        &self,
        req: ProcessAlertRequest,
    ) -> anyhow::Result<ProcessAlertResponse> {
        let now = Utc::now();

        let alert = match pipeline::parse_draft(&req.alert, now) {
            Ok(alert) => alert,
            Err(violations) => {
                tracing::debug!(violations = violations.len(), "alert failed validation");
                return Ok(ProcessAlertResponse {
                    success: false,
                    alert_id: req.alert.id.clone(),
                    processed_at: now,
                    validation_errors: violations.iter().map(|v| v.to_string()).collect(),
                    calculated_priority: None,
                    actions: Vec::new(),
                    notifications: Vec::new(),
                    next_review_at: None,
                });
            }
        };

        let priority = pipeline::ordinal_priority(&alert);
        let enriched = pipeline::enrich(&alert, now, &self.processor);
        let actions = pipeline::plan_actions(&enriched, priority);

        // Re-processing an alert supersedes its outstanding retries.
        self.dispatcher.cancel_pending(&enriched.id);

        let prefs = OverlayPrefs {
            request: &req.user_preferences,
            shared: &self.preferences,
        };
        let mut notifications = Vec::new();
        for recipient in pipeline::recipients(&enriched, &self.on_call_address) {
            for channel in pipeline::channels(&recipient, enriched.severity, &prefs) {
                notifications.push(Notification::new(
                    self.ids.lock().unwrap().next(),
                    enriched.id.as_str(),
                    channel,
                    recipient.as_str(),
                    render::subject(&enriched),
                    render::body(&enriched, channel),
                    self.dispatcher.policy().default_max_retries,
                    now,
                ));
            }
        }

        self.store.put(enriched);
        tracing::info!(
            priority,
            actions = actions.len(),
            notifications = notifications.len(),
            "alert processed"
        );

        Ok(ProcessAlertResponse {
            success: true,
            alert_id: alert.id,
            processed_at: now,
            validation_errors: Vec::new(),
            calculated_priority: Some(priority),
            actions,
            notifications,
            next_review_at: Some(now + self.review_interval),
        })
    }

    /// Validate and score a batch. One bad alert never aborts the rest.
    #[tracing::instrument(skip_all, fields(alerts = req.alerts.len()))]
    pub async fn batch_process(
        &self,
        req: BatchProcessRequest,
    ) -> anyhow::Result<BatchProcessResponse> {
        let started = std::time::Instant::now();
        let now = Utc::now();

        let mut results = Vec::with_capacity(req.alerts.len());
        let mut success_count = 0;
        let mut failure_count = 0;

        for draft in &req.alerts {
            match pipeline::parse_draft(draft, now) {
                Ok(alert) => {
                    let priority = pipeline::ordinal_priority(&alert);
                    success_count += 1;
                    results.push(BatchAlertResult {
                        alert_id: alert.id,
                        success: true,
                        priority: Some(priority),
                        error_message: None,
                    });
                }
                Err(violations) => {
                    failure_count += 1;
                    results.push(BatchAlertResult {
                        alert_id: draft.id.clone(),
                        success: false,
                        priority: None,
                        error_message: Some(violations.iter().join("; ")),
                    });
                }
            }
        }

        let elapsed = started.elapsed();
        let throughput_per_second = if elapsed.as_secs_f64() > 0.0 {
            req.alerts.len() as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Ok(BatchProcessResponse {
            results,
            stats: BatchStats {
                total_alerts: req.alerts.len(),
                success_count,
                failure_count,
                processing_time_ms: elapsed.as_millis() as u64,
                throughput_per_second,
            },
            processed_at: now,
        })
    }

    /// Rank a batch of alerts under the requested strategy.
    #[tracing::instrument(skip_all, fields(alerts = req.alerts.len(), strategy = %req.strategy))]
    pub async fn prioritize(&self, req: PrioritizeRequest) -> anyhow::Result<PrioritizeResponse> {
        let now = Utc::now();
        let strategy = Strategy::parse(&req.strategy);

        let mut skipped = 0;
        let alerts: Vec<Alert> = req
            .alerts
            .iter()
            .filter_map(|draft| match pipeline::parse_draft(draft, now) {
                Ok(alert) => Some(alert),
                Err(_) => {
                    skipped += 1;
                    None
                }
            })
            .collect();
        if skipped > 0 {
            tracing::debug!(skipped, "dropping invalid drafts from ranking");
        }

        let ranking = pipeline::prioritize(alerts, strategy, now);

        Ok(PrioritizeResponse {
            prioritized_alerts: ranking.ranked,
            critical_alert_ids: ranking.critical_ids,
            strategy,
            skipped,
            timestamp: now,
        })
    }

    /// Dispatch notifications through the channel sender. Only an
    /// unavailable provider fails the call; per-notification failures
    /// are reported in the results.
    #[tracing::instrument(skip_all, fields(notifications = req.notifications.len()))]
    pub async fn dispatch(&self, req: DispatchRequest) -> anyhow::Result<DispatchResponse> {
        let outcome = self
            .dispatcher
            .dispatch(req.notifications)
            .await
            .context("dispatching notifications")?;

        Ok(DispatchResponse {
            results: outcome.results,
            stats: outcome.stats,
            timestamp: Utc::now(),
        })
    }

    /// Group a burst of alerts into digest groups.
    #[tracing::instrument(skip_all, fields(alerts = req.alerts.len(), strategy = %req.strategy))]
    pub async fn aggregate(&self, req: AggregateRequest) -> anyhow::Result<AggregateResponse> {
        let now = Utc::now();
        let group_by = GroupBy::parse(&req.strategy);

        let mut skipped = 0;
        let alerts: Vec<Alert> = req
            .alerts
            .iter()
            .filter_map(|draft| match pipeline::parse_draft(draft, now) {
                Ok(alert) => Some(alert),
                Err(_) => {
                    skipped += 1;
                    None
                }
            })
            .collect();

        let aggregation = pipeline::aggregate(
            &alerts,
            group_by,
            req.time_window_minutes,
            req.min_alerts_to_aggregate,
            now,
        );

        Ok(AggregateResponse {
            aggregated_group_count: aggregation.groups.len(),
            original_alert_count: aggregation.original_count,
            reduction_rate: aggregation.reduction_rate,
            groups: aggregation.groups,
            skipped,
            timestamp: now,
        })
    }

    /// Register a future delivery of the drafted alert.
    #[tracing::instrument(skip_all, fields(alert_id = %req.alert.id))]
    pub async fn schedule_alert(&self, req: ScheduleRequest) -> anyhow::Result<ScheduleResponse> {
        let now = Utc::now();
        let schedule_id = self.ids.lock().unwrap().next();

        match pipeline::schedule(
            &req.alert,
            req.schedule_time,
            &req.recurrence_pattern,
            schedule_id,
            now,
        ) {
            Ok(entry) => Ok(ScheduleResponse {
                success: true,
                schedule_id: Some(entry.schedule_id),
                status: Some(entry.status),
                scheduled_for: Some(entry.scheduled_for),
                next_execution: entry.next_execution,
                estimated_delay_seconds: Some(entry.estimated_delay_seconds),
                error_message: None,
            }),
            Err(err) => {
                tracing::debug!(error = %err, "schedule request refused");
                Ok(ScheduleResponse {
                    success: false,
                    schedule_id: None,
                    status: None,
                    scheduled_for: None,
                    next_execution: None,
                    estimated_delay_seconds: None,
                    error_message: Some(err.to_string()),
                })
            }
        }
    }

    /// Look up a previously processed alert in the cache.
    pub fn cached_alert(&self, alert_id: &str) -> Option<Alert> {
        self.store.get(alert_id)
    }
}
