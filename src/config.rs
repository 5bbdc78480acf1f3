use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{BoxError, ConfigError};
use crate::event::Event;
use crate::level::Level;

/// Default text template.
pub const DEFAULT_FORMAT: &str = "[{time}] [{level}] {location} {tags} - {message}";

/// Default file used by the FILE and BOTH output modes.
pub const DEFAULT_LOG_FILE: &str = "debug.log";

/// User function receiving every rendered event when the output mode is
/// [`OutputMode::Callback`].
///
/// Errors and panics raised here are caught at the sink boundary. The
/// callback runs while the pipeline lock is held. Events it logs into the
/// same [`crate::Logger`], directly or through a `tracing` macro while
/// [`crate::init::init_tracing`] is installed, are dropped and counted as
/// filtered. Other loggers can be used freely.
pub type Callback = Arc<dyn Fn(&str, &Event) -> Result<(), BoxError> + Send + Sync>;

/// Selects the local sinks that receive accepted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Console,
    File,
    Both,
    Callback,
}

impl OutputMode {
    pub fn writes_console(&self) -> bool {
        matches!(self, OutputMode::Console | OutputMode::Both)
    }

    pub fn writes_file(&self) -> bool {
        matches!(self, OutputMode::File | OutputMode::Both)
    }
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(OutputMode::Console),
            "file" => Ok(OutputMode::File),
            "both" => Ok(OutputMode::Both),
            "callback" => Ok(OutputMode::Callback),
            _ => Err(ConfigError::InvalidValue {
                option: "output",
                value: s.to_string(),
            }),
        }
    }
}

/// Accept/reject restrictions. An empty set leaves its dimension
/// unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub levels: BTreeSet<Level>,
    pub modules: BTreeSet<String>,
    pub functions: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty() && self.modules.is_empty() && self.functions.is_empty() && self.tags.is_empty()
    }
}

/// Partial filter update: dimensions left as `None` keep their current
/// restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterOptions {
    pub levels: Option<BTreeSet<Level>>,
    pub modules: Option<BTreeSet<String>>,
    pub functions: Option<BTreeSet<String>>,
    pub tags: Option<BTreeSet<String>>,
}

impl FilterOptions {
    pub fn apply_to(self, filters: &mut Filters) {
        if let Some(levels) = self.levels {
            filters.levels = levels;
        }
        if let Some(modules) = self.modules {
            filters.modules = modules;
        }
        if let Some(functions) = self.functions {
            filters.functions = functions;
        }
        if let Some(tags) = self.tags {
            filters.tags = tags;
        }
    }
}

/// Full pipeline configuration.
///
/// Owned by a [`crate::Logger`] behind its lock; callers only ever see
/// clones of it.
#[derive(Clone)]
pub struct Config {
    pub output: OutputMode,
    pub log_file: Option<PathBuf>,
    /// Console only.
    pub use_colors: bool,
    /// Overrides the text template for console and file output.
    pub json_mode: bool,
    pub format: String,
    pub stack_enabled: bool,
    /// Merged into the tags of every event.
    pub tags: BTreeSet<String>,
    pub filters: Filters,
    /// Levels that are emitted at all.
    pub enabled_levels: BTreeSet<Level>,
    /// When non-empty, only events from these modules are emitted.
    pub whitelist: BTreeSet<String>,
    pub remote_url: Option<String>,
    pub remote_enabled: bool,
    pub callback: Option<Callback>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputMode::Console,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            use_colors: true,
            json_mode: false,
            format: DEFAULT_FORMAT.to_string(),
            stack_enabled: false,
            tags: BTreeSet::new(),
            filters: Filters::default(),
            enabled_levels: Level::ALL.into_iter().collect(),
            whitelist: BTreeSet::new(),
            remote_url: None,
            remote_enabled: false,
            callback: None,
        }
    }
}

impl Config {
    /// Check cross-field requirements.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.writes_file() && self.log_file.is_none() {
            return Err(ConfigError::MissingLogFile(self.output));
        }
        if self.output == OutputMode::Callback && self.callback.is_none() {
            return Err(ConfigError::MissingCallback);
        }
        if let Some(url) = &self.remote_url {
            validate_url(url)?;
        }
        Ok(())
    }

    /// URL for remote delivery, if remote delivery is both enabled and
    /// possible.
    pub fn remote_target(&self) -> Option<&str> {
        if self.remote_enabled {
            self.remote_url.as_deref()
        } else {
            None
        }
    }
}

pub(crate) fn validate_url(url: &str) -> Result<(), ConfigError> {
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("http://")
        .or_else(|| lower.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::InvalidUrl(url.to_string())),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("output", &self.output)
            .field("log_file", &self.log_file)
            .field("use_colors", &self.use_colors)
            .field("json_mode", &self.json_mode)
            .field("format", &self.format)
            .field("stack_enabled", &self.stack_enabled)
            .field("tags", &self.tags)
            .field("filters", &self.filters)
            .field("enabled_levels", &self.enabled_levels)
            .field("whitelist", &self.whitelist)
            .field("remote_url", &self.remote_url)
            .field("remote_enabled", &self.remote_enabled)
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Callbacks compare by identity.
impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        let same_callback = match (&self.callback, &other.callback) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_callback
            && self.output == other.output
            && self.log_file == other.log_file
            && self.use_colors == other.use_colors
            && self.json_mode == other.json_mode
            && self.format == other.format
            && self.stack_enabled == other.stack_enabled
            && self.tags == other.tags
            && self.filters == other.filters
            && self.enabled_levels == other.enabled_levels
            && self.whitelist == other.whitelist
            && self.remote_url == other.remote_url
            && self.remote_enabled == other.remote_enabled
    }
}

/// Bulk configuration update for [`crate::Logger::configure`].
///
/// Every field is optional; only the ones that are set are applied. Build
/// it with struct update syntax, from JSON with [`Options::from_json`], or
/// from the environment with [`Options::from_env`].
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    pub output: Option<OutputMode>,
    pub log_file: Option<PathBuf>,
    pub use_colors: Option<bool>,
    pub json_mode: Option<bool>,
    pub stack_enabled: Option<bool>,
    pub format: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub filters: Option<FilterOptions>,
    pub enabled_levels: Option<BTreeSet<Level>>,
    pub whitelist: Option<BTreeSet<String>>,
    pub remote_url: Option<String>,
    pub remote_enabled: Option<bool>,
    #[serde(skip)]
    pub callback: Option<Callback>,
}

impl Options {
    /// Parse options from a JSON object. Unknown keys are rejected.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(document).map_err(|e| match unknown_field(&e) {
            Some(name) => ConfigError::UnknownOption(name),
            None => ConfigError::Malformed(e),
        })
    }

    /// Apply the set fields onto `config`. Does not validate.
    pub fn apply_to(self, config: &mut Config) {
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(path) = self.log_file {
            config.log_file = Some(path);
        }
        if let Some(v) = self.use_colors {
            config.use_colors = v;
        }
        if let Some(v) = self.json_mode {
            config.json_mode = v;
        }
        if let Some(v) = self.stack_enabled {
            config.stack_enabled = v;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(tags) = self.tags {
            config.tags = tags;
        }
        if let Some(filters) = self.filters {
            filters.apply_to(&mut config.filters);
        }
        if let Some(levels) = self.enabled_levels {
            config.enabled_levels = levels;
        }
        if let Some(whitelist) = self.whitelist {
            config.whitelist = whitelist;
        }
        if let Some(url) = self.remote_url {
            config.remote_url = Some(url);
        }
        if let Some(v) = self.remote_enabled {
            config.remote_enabled = v;
        }
        if let Some(callback) = self.callback {
            config.callback = Some(callback);
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("output", &self.output)
            .field("log_file", &self.log_file)
            .field("use_colors", &self.use_colors)
            .field("json_mode", &self.json_mode)
            .field("stack_enabled", &self.stack_enabled)
            .field("format", &self.format)
            .field("tags", &self.tags)
            .field("filters", &self.filters)
            .field("enabled_levels", &self.enabled_levels)
            .field("whitelist", &self.whitelist)
            .field("remote_url", &self.remote_url)
            .field("remote_enabled", &self.remote_enabled)
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

// serde_json reports `unknown field `name`, expected one of ...`.
fn unknown_field(e: &serde_json::Error) -> Option<String> {
    let text = e.to_string();
    let rest = text.strip_prefix("unknown field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.output, OutputMode::Console);
        assert_eq!(config.log_file, Some(PathBuf::from("debug.log")));
        assert!(config.use_colors);
        assert!(!config.json_mode);
        assert_eq!(config.format, DEFAULT_FORMAT);
        assert_eq!(config.enabled_levels.len(), 5);
        assert!(config.filters.is_empty());
        assert!(config.remote_target().is_none());
        config.validate().unwrap();
    }

    #[test]
    fn options_from_json_apply_only_set_fields() {
        let options = Options::from_json(
            r#"{"output": "both", "json_mode": true, "tags": ["api"], "filters": {"levels": ["ERROR"]}}"#,
        )
        .unwrap();
        let mut config = Config::default();
        config.filters.tags.insert("db".to_string());
        options.apply_to(&mut config);

        assert_eq!(config.output, OutputMode::Both);
        assert!(config.json_mode);
        assert!(config.use_colors);
        assert_eq!(config.tags, BTreeSet::from(["api".to_string()]));
        assert_eq!(config.filters.levels, BTreeSet::from([Level::Error]));
        assert_eq!(config.filters.tags, BTreeSet::from(["db".to_string()]));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = Options::from_json(r#"{"colour": true}"#).unwrap_err();
        match err {
            ConfigError::UnknownOption(name) => assert_eq!(name, "colour"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_filter_dimension_is_rejected() {
        let err = Options::from_json(r#"{"filters": {"threads": ["main"]}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOption(name) if name == "threads"));
    }

    #[test]
    fn invalid_level_value_is_malformed() {
        let err = Options::from_json(r#"{"enabled_levels": ["TRACE"]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn validate_requires_file_and_callback() {
        let config = Config {
            output: OutputMode::File,
            log_file: None,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MissingLogFile(OutputMode::File))));

        let config = Config {
            output: OutputMode::Callback,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MissingCallback)));
    }

    #[test]
    fn validate_checks_remote_url() {
        assert!(validate_url("http://127.0.0.1:9000/ingest").is_ok());
        assert!(validate_url("HTTPS://logs.example.com").is_ok());
        assert!(validate_url("ftp://logs.example.com").is_err());
        assert!(validate_url("http://").is_err());
    }

    #[test]
    fn remote_target_requires_enabled_and_url() {
        let mut config = Config {
            remote_enabled: true,
            ..Config::default()
        };
        assert!(config.remote_target().is_none());
        config.remote_url = Some("http://localhost:1".to_string());
        assert_eq!(config.remote_target(), Some("http://localhost:1"));
        config.remote_enabled = false;
        assert!(config.remote_target().is_none());
    }
}
