use std::time::Duration;

use tracing::{error, info, warn};

use tracing_discord_hook::init::init_tracing;
use tracing_discord_hook::{DiscordHook, HookConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reads DISCORD_WEBHOOK_URL, DISCORD_HOOK_LEVELS, ...
    let hook = DiscordHook::from_config(HookConfig::from_env()?);
    init_tracing(hook.clone())?;

    info!("starting service");
    warn!(queue = "emails", depth = 1200, "queue is backing up");
    error!(error = "invalid password", user_id = 42, "authentication failed");

    hook.shutdown(Duration::from_secs(5)).await;
    Ok(())
}
