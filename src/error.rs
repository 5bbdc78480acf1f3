use std::error::Error;

/// Boxed error used by user callbacks and remote transports.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Error returned by configuration setters and [`crate::Logger::configure`].
///
/// A failed call leaves the active configuration untouched.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unknown configuration option `{0}`")]
    UnknownOption(String),

    #[error("invalid value `{value}` for option `{option}`")]
    InvalidValue { option: &'static str, value: String },

    #[error("output mode {0:?} requires a log file path")]
    MissingLogFile(crate::config::OutputMode),

    #[error("callback output selected but no callback is installed")]
    MissingCallback,

    #[error("invalid remote url `{0}`: expected an http:// or https:// url")]
    InvalidUrl(String),

    #[error("malformed options document: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Failure of a single sink to deliver a single event.
///
/// These never escape [`crate::Logger::log`]; they are counted and reported
/// through `tracing` instead.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("callback returned an error: {0}")]
    Callback(#[source] BoxError),

    #[error("callback panicked: {0}")]
    CallbackPanicked(String),

    #[error("remote transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("remote delivery timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("remote endpoint answered with status {0}")]
    Status(u16),
}

/// Raised by [`crate::Logger::assert_log`] after the failed assertion has
/// been logged at ERROR level.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("assertion failed: {message}")]
pub struct AssertionFailure {
    pub message: String,
}
