use async_trait::async_trait;

use crate::compose::Notification;

/// Errors raised while delivering a notification.
///
/// These never reach the code that emitted the log; the supervisor reports
/// them as diagnostics and counts them.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("failed to serialize webhook payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to post to webhook: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook responded with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Asynchronous destination for composed [`Notification`]s.
///
/// [`DiscordWebhook`](crate::discord::DiscordWebhook) posts to a real
/// webhook; other implementations can capture or discard notifications.
/// `send` runs on a delivery task and is never awaited by the code that
/// emitted the log.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification, in a single attempt.
    ///
    /// **Returns**
    /// - `Ok(())` if the destination accepted it.
    /// - `Err(..)` on serialization, transport or HTTP status failures.
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;
}
