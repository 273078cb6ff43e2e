use std::fmt::Write as _;

use tracing::field::{Field, Visit};
use tracing::{warn, Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::hook::DiscordHook;
use crate::level::Level;
use crate::record::LogEvent;

/// Targets whose events are never forwarded: this crate's own diagnostics
/// and the HTTP stack used for delivery.
const IGNORED_TARGETS: &[&str] = &[env!("CARGO_CRATE_NAME"), "reqwest", "hyper", "hyper_util", "h2", "rustls"];

/// `tracing_subscriber` layer that forwards subscribed events to a
/// [`DiscordHook`].
///
/// The event's `message` becomes the notification message and an `error`
/// field fills the error description. Other fields are appended to the
/// message as `key=value`. Delivery happens on a background task; the
/// thread emitting the event only pays for building the [`LogEvent`].
#[derive(Clone, Debug)]
pub struct DiscordLayer {
    hook: DiscordHook,
}

impl DiscordLayer {
    pub fn new(hook: DiscordHook) -> Self {
        DiscordLayer { hook }
    }

    pub fn hook(&self) -> &DiscordHook {
        &self.hook
    }
}

fn is_ignored(target: &str) -> bool {
    IGNORED_TARGETS.iter().any(|ignored| {
        target == *ignored
            || target
                .strip_prefix(ignored)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

impl<S> Layer<S> for DiscordLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_ignored(meta.target()) {
            return;
        }
        let level = Level::from(meta.level());
        if !self.hook.is_subscribed(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let error = visitor.error.take();
        let mut log_event = LogEvent::new(level, visitor.into_message());
        log_event.error = error;

        if let Err(e) = self.hook.fire(log_event) {
            warn!(error = %e, "failed to forward log event to Discord");
        }
    }
}

/// Collects the message, the `error` field and any other fields of an
/// event.
#[derive(Default)]
pub struct FieldVisitor {
    pub message: Option<String>,
    pub error: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl FieldVisitor {
    /// The message followed by ` key=value` for every other field.
    pub fn into_message(self) -> String {
        let mut out = self.message.unwrap_or_default();
        for (key, value) in &self.fields {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{key}={value}");
        }
        out
    }

    fn record_value(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "error" => self.error = Some(value),
            name => self.fields.push((name.to_string(), value)),
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_value(field, format!("{:?}", value));
    }
}
