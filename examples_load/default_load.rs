use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use tracing_discord_hook::init::{init_tracing_with_config, LayerConfig};
use tracing_discord_hook::noop_sink::NoopSink;
use tracing_discord_hook::DiscordHook;

#[tokio::main]
async fn main() {
    let hook = DiscordHook::new("noop://", &[]).with_sink(Arc::new(NoopSink));
    init_tracing_with_config(hook.clone(), LayerConfig { enable_stdout: false })
        .expect("set global subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!("unbounded: fired {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    hook.drain().await;
    println!("delivered {} notifications", hook.stats().delivered());
}
