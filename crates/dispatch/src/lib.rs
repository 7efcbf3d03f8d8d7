//! Notification delivery: the lifecycle state machine, the abstract
//! channel-sender capability, and bounded-concurrency batch dispatch
//! with cancellable retry backoff.

use models::Notification;

mod dispatcher;
pub use dispatcher::{
    confirm_delivery, DispatchError, DispatchOutcome, DispatchPolicy, DispatchStats, Dispatcher,
};

/// Outcome of a successful hand-off to a channel provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The provider confirmed delivery synchronously.
    Delivered,
    /// The provider accepted the message; delivery confirmation arrives
    /// later (or never) through [`confirm_delivery`].
    Accepted,
}

/// Why a send did not succeed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    /// A per-notification failure worth retrying.
    #[error("transient delivery failure: {reason}")]
    Transient { reason: String },
    /// The provider itself is down. No notification can make progress,
    /// so this fails the dispatch call rather than the one notification.
    #[error("channel provider unavailable: {reason}")]
    Unavailable { reason: String },
}

/// ChannelSender is the capability that performs one delivery attempt
/// over a notification's channel. Implementations wrap real providers;
/// tests substitute deterministic fakes.
pub trait ChannelSender: Send + Sync + 'static {
    fn send<'s>(
        &'s self,
        notification: &'s Notification,
    ) -> impl std::future::Future<Output = Result<SendOutcome, SendError>> + Send + 's;
}
