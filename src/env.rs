//! Environment variable names used by this crate for convenient
//! configuration of the hook from services.
//!
//! These are purely helpers; [`DiscordHook`](crate::hook::DiscordHook)
//! itself never reads the environment.

use crate::hook::HookConfig;
use crate::level::{Level, ParseLevelError};

/// Discord webhook URL.
pub const DISCORD_WEBHOOK_URL_ENV: &str = "DISCORD_WEBHOOK_URL";

/// Comma-separated level names, e.g. `error,warn`.
pub const DISCORD_HOOK_LEVELS_ENV: &str = "DISCORD_HOOK_LEVELS";

/// Optional display name of the posts.
pub const DISCORD_HOOK_USERNAME_ENV: &str = "DISCORD_HOOK_USERNAME";

/// Optional bound on concurrent deliveries.
pub const DISCORD_HOOK_MAX_IN_FLIGHT_ENV: &str = "DISCORD_HOOK_MAX_IN_FLIGHT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("DISCORD_HOOK_LEVELS: {0}")]
    Levels(#[from] ParseLevelError),

    #[error("DISCORD_HOOK_MAX_IN_FLIGHT: {0}")]
    MaxInFlight(#[from] std::num::ParseIntError),

    #[error("DISCORD_HOOK_MAX_IN_FLIGHT: must be at least 1")]
    ZeroMaxInFlight,
}

/// Parse a comma-separated list of level names. Blank entries are skipped.
pub fn parse_levels(list: &str) -> Result<Vec<Level>, ParseLevelError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

impl HookConfig {
    /// Build a config from `DISCORD_*` environment variables, keeping the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = HookConfig {
            webhook_url: env_or(DISCORD_WEBHOOK_URL_ENV, ""),
            ..HookConfig::default()
        };

        if let Ok(levels) = std::env::var(DISCORD_HOOK_LEVELS_ENV) {
            config.levels = parse_levels(&levels)?;
        }
        if let Ok(username) = std::env::var(DISCORD_HOOK_USERNAME_ENV) {
            if !username.is_empty() {
                config.username = username;
            }
        }
        if let Ok(max) = std::env::var(DISCORD_HOOK_MAX_IN_FLIGHT_ENV) {
            let max: usize = max.trim().parse()?;
            if max == 0 {
                return Err(ConfigError::ZeroMaxInFlight);
            }
            config.max_in_flight = Some(max);
        }

        Ok(config)
    }
}
