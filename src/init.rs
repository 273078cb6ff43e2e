use crate::hook::DiscordHook;
use crate::layer::DiscordLayer;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the installed subscriber.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added next to [`DiscordLayer`] so events, including this crate's
///   delivery diagnostics, are also printed to the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { enable_stdout: true }
    }
}

/// Install a global `tracing` subscriber that forwards events to `hook`.
///
/// **Parameters**
/// - `hook`: [`DiscordHook`] receiving every subscribed event.
/// - `config`: [`LayerConfig`] controlling console output.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_tracing_with_config(hook: DiscordHook, config: LayerConfig) -> Result<(), SetGlobalDefaultError> {
    let layer = DiscordLayer::new(hook);

    // The two branches produce different subscriber types.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(hook: DiscordHook) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(hook, LayerConfig::default())
}
