//! Log output for the server process.
//!
//! Tracing starts at `info` before the configuration is read so that config
//! problems are visible. Once loaded, `logging.level` replaces the filter
//! unless `RUST_LOG` is set.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

const BOOT_LEVEL: &str = "info";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Where the active log filter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    /// A non-empty `RUST_LOG`.
    Environment,
    /// `logging.level` from the configuration.
    Config,
}

fn select_directive(rust_log: Option<&str>, configured: &str) -> (String, FilterSource) {
    match rust_log.map(str::trim).filter(|v| !v.is_empty()) {
        Some(env) => (env.to_string(), FilterSource::Environment),
        None => (configured.trim().to_string(), FilterSource::Config),
    }
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init_tracing() {
    let rust_log = std::env::var("RUST_LOG").ok();
    let (directive, _) = select_directive(rust_log.as_deref(), BOOT_LEVEL);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(BOOT_LEVEL));

    let (filter_layer, handle) = reload::Layer::new(filter);
    if tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer())
        .try_init()
        .is_ok()
    {
        let _ = FILTER_HANDLE.set(handle);
    }
}

/// Swaps in the configured level and reports which source won.
pub fn apply_logging_config(cfg: &LoggingConfig) -> FilterSource {
    let rust_log = std::env::var("RUST_LOG").ok();
    let (directive, source) = select_directive(rust_log.as_deref(), &cfg.level);

    if source == FilterSource::Config
        && let Some(handle) = FILTER_HANDLE.get()
    {
        match EnvFilter::try_new(&directive) {
            Ok(filter) => {
                if let Err(err) = handle.reload(filter) {
                    tracing::warn!(error = %err, "Could not replace log filter");
                }
            }
            Err(err) => {
                tracing::warn!(directive, error = %err, "Ignoring invalid logging.level");
            }
        }
    }

    tracing::debug!(directive, ?source, "Log filter selected");
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_wins_when_set() {
        let (directive, source) = select_directive(Some("carebase_server=trace"), "warn");
        assert_eq!(directive, "carebase_server=trace");
        assert_eq!(source, FilterSource::Environment);
    }

    #[test]
    fn configured_level_used_otherwise() {
        assert_eq!(
            select_directive(None, "debug"),
            ("debug".to_string(), FilterSource::Config)
        );
        // A blank RUST_LOG counts as unset.
        assert_eq!(
            select_directive(Some("  "), " warn "),
            ("warn".to_string(), FilterSource::Config)
        );
    }

    #[test]
    fn configured_levels_parse_as_filters() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let (directive, _) = select_directive(None, level);
            assert!(EnvFilter::try_new(&directive).is_ok(), "{level}");
        }
    }
}
