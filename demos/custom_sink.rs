use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};
use tracing_discord_hook::{
    compose::Notification,
    init::init_tracing,
    sink::{DeliveryError, NotificationSink},
    DiscordHook,
};

/// Example of replacing the webhook transport by implementing
/// `NotificationSink` directly. Imagine this forwards to an internal
/// chat relay instead of Discord.
struct StdoutSink;

#[async_trait]
impl NotificationSink for StdoutSink {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        println!("{}", serde_json::to_string_pretty(&notification.document)?);
        if let Some(attachment) = &notification.attachment {
            println!("[{} bytes in {}]", attachment.content.len(), attachment.file_name);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Any non-empty URL; the sink never uses it.
    let hook = DiscordHook::new("stdout://", &[]).with_sink(Arc::new(StdoutSink));
    init_tracing(hook.clone())?;

    info!("custom sink example started");
    error!(relay = "stdout", "simulated error sent via custom sink");

    hook.drain().await;
    hook.shutdown(Duration::from_secs(1)).await;
    Ok(())
}
