//! Environment variable names used by this crate for configuring a
//! [`Logger`](crate::Logger) without code changes.
//!
//! These are purely helpers; [`Options`] stays decoupled from the
//! environment unless [`Options::from_env`] is called.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::{FilterOptions, Options, OutputMode};
use crate::error::ConfigError;
use crate::level::Level;

/// Output mode: `console`, `file`, `both` or `callback`.
pub const DEBUG_LOG_OUTPUT_ENV: &str = "DEBUG_LOG_OUTPUT";

/// Path of the log file for the `file` and `both` modes.
pub const DEBUG_LOG_FILE_ENV: &str = "DEBUG_LOG_FILE";

/// Console colors, boolean.
pub const DEBUG_LOG_COLORS_ENV: &str = "DEBUG_LOG_COLORS";

/// JSON output, boolean.
pub const DEBUG_LOG_JSON_ENV: &str = "DEBUG_LOG_JSON";

/// Stack capture for every event, boolean.
pub const DEBUG_LOG_STACK_ENV: &str = "DEBUG_LOG_STACK";

/// Text template, e.g. `{level} {message}`.
pub const DEBUG_LOG_FORMAT_ENV: &str = "DEBUG_LOG_FORMAT";

/// Comma-separated default tags.
pub const DEBUG_LOG_TAGS_ENV: &str = "DEBUG_LOG_TAGS";

/// Comma-separated levels accepted by the level filter.
pub const DEBUG_LOG_LEVELS_ENV: &str = "DEBUG_LOG_LEVELS";

/// Remote endpoint; setting it also enables remote delivery.
pub const DEBUG_LOG_REMOTE_URL_ENV: &str = "DEBUG_LOG_REMOTE_URL";

impl Options {
    /// Collect options from the `DEBUG_LOG_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut options = Options::default();

        if let Some(v) = lookup(DEBUG_LOG_OUTPUT_ENV) {
            options.output = Some(v.parse::<OutputMode>()?);
        }
        if let Some(v) = lookup(DEBUG_LOG_FILE_ENV) {
            options.log_file = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup(DEBUG_LOG_COLORS_ENV) {
            options.use_colors = Some(parse_bool("use_colors", &v)?);
        }
        if let Some(v) = lookup(DEBUG_LOG_JSON_ENV) {
            options.json_mode = Some(parse_bool("json_mode", &v)?);
        }
        if let Some(v) = lookup(DEBUG_LOG_STACK_ENV) {
            options.stack_enabled = Some(parse_bool("stack_enabled", &v)?);
        }
        if let Some(v) = lookup(DEBUG_LOG_FORMAT_ENV) {
            options.format = Some(v);
        }
        if let Some(v) = lookup(DEBUG_LOG_TAGS_ENV) {
            options.tags = Some(split_list(&v).map(str::to_string).collect());
        }
        if let Some(v) = lookup(DEBUG_LOG_LEVELS_ENV) {
            let levels = split_list(&v)
                .map(str::parse::<Level>)
                .collect::<Result<BTreeSet<_>, _>>()?;
            options.filters = Some(FilterOptions {
                levels: Some(levels),
                ..FilterOptions::default()
            });
        }
        if let Some(v) = lookup(DEBUG_LOG_REMOTE_URL_ENV) {
            options.remote_url = Some(v);
            options.remote_enabled = Some(true);
        }

        Ok(options)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(option: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            option,
            value: value.to_string(),
        }),
    }
}
