#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing_discord_hook::compose::Notification;
use tracing_discord_hook::sink::{DeliveryError, NotificationSink};
use tracing_discord_hook::DiscordHook;

/// Sink that keeps every notification it receives.
#[derive(Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// A hook with default levels whose deliveries land in the returned sink.
pub fn recording_hook() -> (DiscordHook, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let hook = DiscordHook::new("https://discord.test/api/webhooks/1/token", &[]).with_sink(sink.clone());
    (hook, sink)
}
