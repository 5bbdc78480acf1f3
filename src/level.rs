use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Level of a log event.
///
/// The ordering only exists so levels can live in ordered sets; it is not a
/// severity scale and nothing in the pipeline escalates or compares levels
/// beyond membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Debug,
    Warn,
    Error,
    Timer,
}

impl Level {
    pub const ALL: [Level; 5] = [Level::Info, Level::Debug, Level::Warn, Level::Error, Level::Timer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Timer => "TIMER",
        }
    }

    /// ANSI escape used when console colors are enabled.
    pub(crate) fn color(&self) -> &'static str {
        match self {
            Level::Info => "\x1b[96m",
            Level::Debug => "\x1b[92m",
            Level::Warn => "\x1b[93m",
            Level::Error => "\x1b[91m",
            Level::Timer => "\x1b[95m",
        }
    }
}

pub(crate) const RESET: &str = "\x1b[0m";

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "TIMER" => Ok(Level::Timer),
            _ => Err(ConfigError::InvalidValue {
                option: "level",
                value: s.to_string(),
            }),
        }
    }
}
