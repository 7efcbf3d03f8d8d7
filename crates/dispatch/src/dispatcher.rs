use crate::{ChannelSender, SendError, SendOutcome};
use chrono::{DateTime, Utc};
use futures::stream::{StreamExt, TryStreamExt};
use models::{Channel, Notification, NotificationStatus};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Tunable delivery policy. The retry delay is fixed (no exponential
/// growth) and defaults to five minutes.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub retry_delay: std::time::Duration,
    pub default_max_retries: u32,
    /// In-flight send limit for one dispatch call.
    pub max_in_flight: usize,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            retry_delay: std::time::Duration::from_secs(5 * 60),
            default_max_retries: 3,
            max_in_flight: Channel::all().len(),
        }
    }
}

/// A dispatch call could not make progress at all.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification dispatch cannot make progress")]
    SenderUnavailable(#[source] SendError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStats {
    pub total: usize,
    /// Notifications that ended SENT or DELIVERED.
    pub success_count: usize,
    /// Notifications that ended terminally FAILED.
    pub failure_count: usize,
    /// successes / total, 0 when the batch was empty.
    pub success_rate: f64,
    pub channel_breakdown: BTreeMap<Channel, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    /// One entry per input notification, in input order.
    pub results: Vec<Notification>,
    pub stats: DispatchStats,
}

/// Dispatcher owns the notification lifecycle state machine.
///
/// Each notification is attempted through the channel sender; transient
/// failures are retried after a fixed, cancellable backoff until either
/// the send succeeds or retries are exhausted. Retry waits for an alert
/// can be cancelled through [`Dispatcher::cancel_pending`] when the
/// alert is superseded, so a stale notification is never delivered
/// twice.
pub struct Dispatcher<S> {
    sender: S,
    policy: DispatchPolicy,
    pending: Mutex<HashMap<String, CancellationToken>>,
}

impl<S: ChannelSender> Dispatcher<S> {
    pub fn new(sender: S, policy: DispatchPolicy) -> Self {
        Self {
            sender,
            policy,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Cancel outstanding retry waits for the given alert. Its
    /// notifications terminate FAILED with a superseded reason rather
    /// than attempting delivery again.
    pub fn cancel_pending(&self, alert_id: &str) {
        if let Some(token) = self.pending.lock().unwrap().remove(alert_id) {
            tracing::info!(%alert_id, "cancelling outstanding notification retries");
            token.cancel();
        }
    }

    /// Dispatch a batch of notifications with bounded parallelism,
    /// returning per-notification results in input order plus aggregate
    /// stats. Only an unavailable provider fails the call itself.
    pub async fn dispatch(
        &self,
        notifications: Vec<Notification>,
    ) -> Result<DispatchOutcome, DispatchError> {
        if notifications.is_empty() {
            return Ok(DispatchOutcome {
                results: Vec::new(),
                stats: DispatchStats::default(),
            });
        }

        let alert_ids: Vec<String> = notifications.iter().map(|n| n.alert_id.clone()).collect();
        let tokens: Vec<CancellationToken> = {
            let mut pending = self.pending.lock().unwrap();
            notifications
                .iter()
                .map(|n| {
                    pending
                        .entry(n.alert_id.clone())
                        .or_insert_with(CancellationToken::new)
                        .clone()
                })
                .collect()
        };

        let attempts = notifications
            .into_iter()
            .zip(tokens)
            .map(|(notification, token)| self.deliver(notification, token));

        let results: Result<Vec<Notification>, DispatchError> = futures::stream::iter(attempts)
            .buffered(self.policy.max_in_flight)
            .try_collect()
            .await;

        {
            let mut pending = self.pending.lock().unwrap();
            for alert_id in alert_ids {
                pending.remove(&alert_id);
            }
        }

        let results = results?;
        let stats = tally(&results);
        Ok(DispatchOutcome { results, stats })
    }

    /// Drive one notification through the state machine until terminal
    /// or accepted-pending-confirmation.
    #[tracing::instrument(
        skip_all,
        fields(id = %notification.id, channel = %notification.channel, recipient = %notification.recipient),
    )]
    async fn deliver(
        &self,
        mut notification: Notification,
        cancel: CancellationToken,
    ) -> Result<Notification, DispatchError> {
        loop {
            match self.sender.send(&notification).await {
                Ok(outcome) => {
                    let now = Utc::now();
                    notification.status = NotificationStatus::Sent;
                    notification.sent_at = Some(now);
                    if outcome == SendOutcome::Delivered {
                        notification.status = NotificationStatus::Delivered;
                        notification.delivered_at = Some(now);
                    }
                    tracing::debug!(status = %notification.status, "notification sent");
                    return Ok(notification);
                }
                Err(err @ SendError::Unavailable { .. }) => {
                    tracing::error!(error = %err, "channel provider unavailable");
                    return Err(DispatchError::SenderUnavailable(err));
                }
                Err(SendError::Transient { reason }) => {
                    if notification.retry_count >= notification.max_retries {
                        tracing::warn!(
                            retry_count = notification.retry_count,
                            %reason,
                            "delivery failed and retries are exhausted"
                        );
                        notification.status = NotificationStatus::Failed;
                        notification.error = Some(reason);
                        return Ok(notification);
                    }

                    notification.retry_count += 1;
                    notification.status = NotificationStatus::Retrying;
                    tracing::debug!(
                        retry_count = notification.retry_count,
                        max_retries = notification.max_retries,
                        delay_secs = self.policy.retry_delay.as_secs(),
                        %reason,
                        "delivery failed, retry scheduled"
                    );

                    tokio::select! {
                        () = tokio::time::sleep(self.policy.retry_delay) => {
                            notification.status = NotificationStatus::Pending;
                        }
                        () = cancel.cancelled() => {
                            tracing::info!("retry cancelled, alert was superseded");
                            notification.status = NotificationStatus::Failed;
                            notification.error =
                                Some("retry cancelled: alert superseded".to_string());
                            return Ok(notification);
                        }
                    }
                }
            }
        }
    }
}

/// Apply an out-of-band delivery confirmation: SENT → DELIVERED.
/// Returns false (and changes nothing) from any other state; terminal
/// states never transition again.
pub fn confirm_delivery(notification: &mut Notification, at: DateTime<Utc>) -> bool {
    if notification.status != NotificationStatus::Sent {
        return false;
    }
    notification.status = NotificationStatus::Delivered;
    notification.delivered_at = Some(at);
    true
}

fn tally(results: &[Notification]) -> DispatchStats {
    let mut stats = DispatchStats {
        total: results.len(),
        ..Default::default()
    };
    for notification in results {
        *stats
            .channel_breakdown
            .entry(notification.channel)
            .or_default() += 1;
        match notification.status {
            NotificationStatus::Sent | NotificationStatus::Delivered => stats.success_count += 1,
            _ => stats.failure_count += 1,
        }
    }
    if stats.total > 0 {
        stats.success_rate = stats.success_count as f64 / stats.total as f64;
    }
    stats
}

#[cfg(test)]
mod test {
    use super::*;
    use models::Id;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A sender that replays a script of outcomes per recipient, so
    /// behavior is deterministic under concurrent dispatch.
    #[derive(Default)]
    struct ScriptedSender {
        scripts: Mutex<HashMap<String, VecDeque<Result<SendOutcome, SendError>>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSender {
        fn script(
            &self,
            recipient: &str,
            outcomes: impl IntoIterator<Item = Result<SendOutcome, SendError>>,
        ) {
            self.scripts
                .lock()
                .unwrap()
                .insert(recipient.to_string(), outcomes.into_iter().collect());
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ChannelSender for Arc<ScriptedSender> {
        async fn send<'s>(
            &'s self,
            notification: &'s Notification,
        ) -> Result<SendOutcome, SendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.scripts
                .lock()
                .unwrap()
                .get_mut(&notification.recipient)
                .and_then(|script| script.pop_front())
                .unwrap_or(Ok(SendOutcome::Delivered))
        }
    }

    fn transient(reason: &str) -> SendError {
        SendError::Transient {
            reason: reason.to_string(),
        }
    }

    fn notification(alert_id: &str, channel: Channel, recipient: &str) -> Notification {
        static SEQ: AtomicUsize = AtomicUsize::new(1);
        let seq = SEQ.fetch_add(1, Ordering::SeqCst) as u16;
        Notification::new(
            Id::from_parts(1, seq, 1),
            alert_id,
            channel,
            recipient,
            "subject",
            "body",
            3,
            Utc::now(),
        )
    }

    fn dispatcher(sender: &Arc<ScriptedSender>) -> Dispatcher<Arc<ScriptedSender>> {
        Dispatcher::new(sender.clone(), DispatchPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_delivery() {
        let sender = Arc::new(ScriptedSender::default());
        let dispatcher = dispatcher(&sender);

        let outcome = dispatcher
            .dispatch(vec![notification("a1", Channel::Email, "u1")])
            .await
            .unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.status, NotificationStatus::Delivered);
        assert!(result.sent_at.is_some());
        assert!(result.delivered_at.is_some());
        assert_eq!(result.retry_count, 0);
        assert_eq!(outcome.stats.success_count, 1);
        assert_eq!(outcome.stats.success_rate, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_awaits_confirmation() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script("u1", [Ok(SendOutcome::Accepted)]);
        let dispatcher = dispatcher(&sender);

        let outcome = dispatcher
            .dispatch(vec![notification("a1", Channel::Push, "u1")])
            .await
            .unwrap();

        let mut result = outcome.results[0].clone();
        assert_eq!(result.status, NotificationStatus::Sent);
        assert!(result.sent_at.is_some());
        assert!(result.delivered_at.is_none());
        // SENT still counts as a dispatch success.
        assert_eq!(outcome.stats.success_count, 1);

        let confirmed_at = Utc::now();
        assert!(confirm_delivery(&mut result, confirmed_at));
        assert_eq!(result.status, NotificationStatus::Delivered);
        assert_eq!(result.delivered_at, Some(confirmed_at));

        // A second confirmation is a no-op: DELIVERED is terminal.
        assert!(!confirm_delivery(&mut result, Utc::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retry_until_success() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script(
            "u1",
            [
                Err(transient("mailbox busy")),
                Err(transient("mailbox busy")),
                Ok(SendOutcome::Delivered),
            ],
        );
        let dispatcher = dispatcher(&sender);

        let outcome = dispatcher
            .dispatch(vec![notification("a1", Channel::Email, "u1")])
            .await
            .unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.status, NotificationStatus::Delivered);
        assert_eq!(result.retry_count, 2);
        assert_eq!(sender.calls(), 3);
        assert!(result.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fail_terminally() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script(
            "u1",
            std::iter::repeat_with(|| Err(transient("smtp 451")))
                .take(10)
                .collect::<Vec<_>>(),
        );
        let dispatcher = dispatcher(&sender);

        let outcome = dispatcher
            .dispatch(vec![notification("a1", Channel::Email, "u1")])
            .await
            .unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.status, NotificationStatus::Failed);
        assert_eq!(result.retry_count, result.max_retries);
        assert_eq!(result.error.as_deref(), Some("smtp 451"));
        // First attempt plus max_retries re-attempts.
        assert_eq!(sender.calls(), 1 + result.max_retries as usize);
        assert_eq!(outcome.stats.failure_count, 1);
        assert_eq!(outcome.stats.success_rate, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_aborts_retry_wait() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script("u1", [Err(transient("gateway timeout"))]);
        let dispatcher = Arc::new(dispatcher(&sender));

        let handle = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move {
                dispatcher
                    .dispatch(vec![notification("a1", Channel::Sms, "u1")])
                    .await
            }
        });

        // Let the first attempt fail and park in its five minute backoff,
        // then supersede the alert.
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        dispatcher.cancel_pending("a1");

        let outcome = handle.await.unwrap().unwrap();
        let result = &outcome.results[0];
        assert_eq!(result.status, NotificationStatus::Failed);
        assert_eq!(
            result.error.as_deref(),
            Some("retry cancelled: alert superseded")
        );
        // The scripted failure was the only send; no retry fired.
        assert_eq!(sender.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_provider_fails_the_call() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script(
            "u1",
            [Err(SendError::Unavailable {
                reason: "provider maintenance".to_string(),
            })],
        );
        let dispatcher = dispatcher(&sender);

        let err = dispatcher
            .dispatch(vec![notification("a1", Channel::Webhook, "u1")])
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::SenderUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_results_keep_input_order() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script(
            "flaky",
            std::iter::repeat_with(|| Err(transient("boom")))
                .take(10)
                .collect::<Vec<_>>(),
        );
        let dispatcher = dispatcher(&sender);

        let batch = vec![
            notification("a1", Channel::Email, "ok-1"),
            notification("a2", Channel::Sms, "flaky"),
            notification("a3", Channel::Push, "ok-2"),
        ];
        let ids: Vec<_> = batch.iter().map(|n| n.id).collect();

        let outcome = dispatcher.dispatch(batch).await.unwrap();
        let result_ids: Vec<_> = outcome.results.iter().map(|n| n.id).collect();
        assert_eq!(result_ids, ids);

        assert_eq!(outcome.stats.total, 3);
        assert_eq!(outcome.stats.success_count, 2);
        assert_eq!(outcome.stats.failure_count, 1);
        assert_eq!(
            outcome.stats.success_count + outcome.stats.failure_count,
            outcome.stats.total
        );
        assert_eq!(outcome.stats.channel_breakdown[&Channel::Email], 1);
        assert_eq!(outcome.stats.channel_breakdown[&Channel::Sms], 1);
        assert_eq!(outcome.stats.channel_breakdown[&Channel::Push], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch_is_a_defined_no_op() {
        let sender = Arc::new(ScriptedSender::default());
        let dispatcher = dispatcher(&sender);

        let outcome = dispatcher.dispatch(Vec::new()).await.unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.stats.total, 0);
        assert_eq!(outcome.stats.success_rate, 0.0);
        assert_eq!(sender.calls(), 0);
    }
}
