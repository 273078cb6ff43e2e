use crate::compose::Notification;
use crate::sink::{DeliveryError, NotificationSink};
use async_trait::async_trait;

/// A sink that simply drops all notifications.
///
/// Useful for measuring the overhead of snapshotting and rendering without
/// any network I/O, and for tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl NotificationSink for NoopSink {
    async fn send(&self, _notification: &Notification) -> Result<(), DeliveryError> {
        Ok(())
    }
}
