use std::sync::Arc;
use std::time::Duration;

use crate::compose::{compose, DEFAULT_USERNAME};
use crate::discord::DiscordWebhook;
use crate::level::{classify, effective_levels, Classification, Level};
use crate::record::LogEvent;
use crate::sink::NotificationSink;
use crate::supervisor::{DeliveryStats, DeliverySupervisor};

/// Errors returned synchronously from [`DiscordHook::fire`].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum HookError {
    #[error("Discord webhook url is empty")]
    EmptyWebhookUrl,
}

/// Settings for a [`DiscordHook`].
///
/// **Fields**
/// - `webhook_url`: destination of every notification. An empty URL makes
///   every `fire` fail.
/// - `levels`: subscribed levels; empty means [`DEFAULT_LEVELS`](crate::level::DEFAULT_LEVELS).
/// - `username`: display name of the posts.
/// - `max_in_flight`: optional bound on concurrent deliveries; events past
///   the bound are dropped. `Some(0)` is treated as `Some(1)`.
#[derive(Clone, Debug)]
pub struct HookConfig {
    pub webhook_url: String,
    pub levels: Vec<Level>,
    pub username: String,
    pub max_in_flight: Option<usize>,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            levels: Vec::new(),
            username: DEFAULT_USERNAME.to_string(),
            max_in_flight: None,
        }
    }
}

/// Forwards log events to a Discord webhook without blocking the caller.
///
/// Cloning is cheap; clones share the transport and the delivery
/// supervisor.
#[derive(Clone)]
pub struct DiscordHook {
    webhook_url: Arc<str>,
    levels: Arc<[Level]>,
    username: Arc<str>,
    sink: Arc<dyn NotificationSink>,
    supervisor: Arc<DeliverySupervisor>,
}

impl DiscordHook {
    /// Create a hook posting to `webhook_url`.
    ///
    /// **Parameters**
    /// - `webhook_url`: Discord webhook URL.
    /// - `levels`: levels to subscribe to; pass `&[]` for the default
    ///   `Panic`, `Fatal`, `Error` and `Warn`.
    pub fn new(webhook_url: impl Into<String>, levels: &[Level]) -> Self {
        Self::from_config(HookConfig {
            webhook_url: webhook_url.into(),
            levels: levels.to_vec(),
            ..HookConfig::default()
        })
    }

    pub fn from_config(config: HookConfig) -> Self {
        let sink = Arc::new(DiscordWebhook::new(config.webhook_url.clone()));
        DiscordHook {
            webhook_url: config.webhook_url.into(),
            levels: effective_levels(&config.levels).into(),
            username: config.username.into(),
            sink,
            supervisor: Arc::new(DeliverySupervisor::new(config.max_in_flight)),
        }
    }

    /// Replace the transport, e.g. with a recording or no-op sink.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Levels this hook wants to receive.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn is_subscribed(&self, level: Level) -> bool {
        self.classify(level).subscribed
    }

    pub fn classify(&self, level: Level) -> Classification {
        classify(level, &self.levels)
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Deliver `event` in the background.
    ///
    /// Any live request payload is snapshotted before this returns, so the
    /// caller may keep using the request (including its body) right away.
    /// Delivery failures are only reported as diagnostics.
    ///
    /// **Returns**
    /// - `Err(HookError::EmptyWebhookUrl)` without attempting delivery when
    ///   the hook has no URL.
    pub fn fire(&self, event: LogEvent<'_>) -> Result<(), HookError> {
        if self.webhook_url.is_empty() {
            return Err(HookError::EmptyWebhookUrl);
        }

        let captured = event.capture();
        let sink = Arc::clone(&self.sink);
        let username = Arc::clone(&self.username);

        self.supervisor.spawn(async move {
            let notification = compose(&captured, &username);
            sink.send(&notification).await
        });
        Ok(())
    }

    pub fn stats(&self) -> &DeliveryStats {
        self.supervisor.stats()
    }

    /// Wait for every delivery fired so far.
    pub async fn drain(&self) {
        self.supervisor.drain().await;
    }

    /// Stop delivering, allowing in-flight deliveries `grace` to complete.
    pub async fn shutdown(&self, grace: Duration) {
        self.supervisor.shutdown(grace).await;
    }
}

impl std::fmt::Debug for DiscordHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordHook")
            .field("levels", &self.levels)
            .field("username", &self.username)
            .field("in_flight", &self.supervisor.in_flight())
            .finish_non_exhaustive()
    }
}
