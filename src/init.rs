use crate::format::{Formatter, TextFormatter};
use crate::hook::Hook;
use crate::layer::HookLayer;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Settings for the subscriber installed by [`init_tracing_with_config`].
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is added
///   next to the [`HookLayer`] so events also show up on the console.
/// - `formatter`: renders the `entry` key of each written document.
#[derive(Clone)]
pub struct LayerConfig {
    pub enable_stdout: bool,
    pub formatter: Arc<dyn Formatter>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
            formatter: Arc::new(TextFormatter::default()),
        }
    }
}

/// Install a global `tracing` subscriber that fires `hook` for every event.
///
/// **Parameters**
/// - `hook`: receives a [`LogEntry`](crate::entry::LogEntry) per event it
///   subscribed to through [`Hook::levels`].
/// - `config`: [`LayerConfig`] controlling console output and rendering.
///
/// **Errors**
///
/// Fails if a global subscriber was already installed.
pub fn init_tracing_with_config(
    hook: Arc<dyn Hook>,
    config: LayerConfig,
) -> Result<(), SetGlobalDefaultError> {
    let layer = HookLayer::new(hook).with_formatter(config.formatter);

    // Two branches because the layered subscriber types differ.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Equivalent to [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(hook: Arc<dyn Hook>) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(hook, LayerConfig::default())
}
