use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

use tracing_discord_hook::noop_sink::NoopSink;
use tracing_discord_hook::{DiscordHook, HookConfig, Level, LogEvent, ManualRequest};

#[tokio::main]
async fn main() {
    let config = HookConfig {
        webhook_url: "noop://".to_string(),
        max_in_flight: Some(1_000),
        ..HookConfig::default()
    };
    let hook = DiscordHook::from_config(config).with_sink(Arc::new(NoopSink));

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let request = ManualRequest::new("POST", "https://api.example.com/orders")
            .body(format!(r#"{{"order":{i}}}"#));
        let _ = hook.fire(
            LogEvent::new(Level::Error, "custom load test error").with_request(request.into()),
        );
    }

    let elapsed = start.elapsed();
    println!("bounded: fired {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    hook.shutdown(Duration::from_secs(2)).await;
    let stats = hook.stats();
    println!(
        "delivered {}, dropped {}, failed {}",
        stats.delivered(),
        stats.dropped(),
        stats.failed()
    );
}
