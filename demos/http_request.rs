use std::time::Duration;

use tracing_discord_hook::{DiscordHook, Level, LogEvent, RequestBody, RequestPayload};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("DISCORD_WEBHOOK_URL").unwrap_or_default();
    let hook = DiscordHook::new(url, &[]);

    let mut request = http::Request::builder()
        .method("POST")
        .uri("https://api.example.com/users")
        .header("content-type", "application/json")
        .body(RequestBody::from(r#"{"name":"John","email":"john@example.com"}"#))?;

    let event = LogEvent::new(Level::Error, "API call failed")
        .with_error("upstream returned 502")
        .with_request(RequestPayload::Live(&mut request));
    hook.fire(event)?;

    // The handler can still consume the body after logging.
    let mut body = String::new();
    std::io::Read::read_to_string(request.body_mut(), &mut body)?;
    println!("handler still sees body: {body}");

    hook.shutdown(Duration::from_secs(5)).await;
    Ok(())
}
