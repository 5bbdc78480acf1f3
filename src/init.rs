use crate::layer::PipelineLayer;
use crate::logger::Logger;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the `tracing` bridge.
///
/// **Fields**
/// - `max_level`: least severe `tracing` level forwarded to the
///   [`Logger`].
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to [`PipelineLayer`], so events are also printed in
///   the usual `tracing` format. This includes this crate's own delivery
///   warnings, which the pipeline layer skips.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub max_level: tracing::Level,
    pub enable_stdout: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_level: tracing::Level::TRACE,
            enable_stdout: false,
        }
    }
}

/// Install a global `tracing` subscriber that forwards events into
/// `logger`.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with [`PipelineLayer`] as the
/// global default subscriber. Fails if a global subscriber is already set.
pub fn init_tracing_with_config(logger: Arc<Logger>, config: BridgeConfig) -> Result<(), SetGlobalDefaultError> {
    let layer = PipelineLayer::new(logger).with_max_level(config.max_level);

    // The two subscriber shapes have different types, hence two calls.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Equivalent to [`init_tracing_with_config`] with
/// [`BridgeConfig::default`].
pub fn init_tracing(logger: Arc<Logger>) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(logger, BridgeConfig::default())
}
