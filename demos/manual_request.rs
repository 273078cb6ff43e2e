use std::time::Duration;

use tracing_discord_hook::{DiscordHook, Level, LogEvent, ManualRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("DISCORD_WEBHOOK_URL").unwrap_or_default();
    let hook = DiscordHook::new(url, &[Level::Error, Level::Warn]);

    let request = ManualRequest::new("POST", "https://api.example.com/users")
        .body(r#"{"name": "John"}"#)
        .headers("Content-Type: application/json");

    hook.fire(
        LogEvent::new(Level::Error, "User creation failed")
            .with_error("duplicate email")
            .with_request(request.into()),
    )?;

    // Messages over 500 bytes are sent as a log.txt attachment.
    let dump = (0..100).map(|i| format!("line {i}\n")).collect::<String>();
    hook.fire(LogEvent::new(Level::Warn, dump))?;

    hook.shutdown(Duration::from_secs(5)).await;
    Ok(())
}
