//! In-process debug logging.
//!
//! Every call goes through one pipeline: the event is stamped with its
//! location and time, checked against the filters, rendered as text or
//! JSON, and written to the local sinks selected by the output mode
//! (console, file or a callback). Remote HTTP delivery, when enabled, is
//! layered on top and runs on a background task.
//!
//! ```no_run
//! use debug_log::{log, watch, Level, Logger};
//!
//! let logger = Logger::new();
//! logger.set_tags(["api"]);
//! log!(logger, Level::Info, "listening on {}", 8080);
//!
//! let retries = 3;
//! watch!(logger, retries);
//!
//! let double = logger.timeit(Some("double"), |n: u64| n * 2);
//! assert_eq!(double(21), 42);
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod init;
pub mod instrument;
pub mod layer;
pub mod level;
pub mod logger;
mod macros;
pub mod remote;
pub mod sink;
pub mod stats;

pub use config::{Callback, Config, FilterOptions, Filters, Options, OutputMode};
pub use error::{AssertionFailure, BoxError, ConfigError, SinkError};
pub use event::{Event, Location};
pub use format::JsonRecord;
pub use instrument::TimerGuard;
pub use level::Level;
pub use logger::{LogOptions, Logger};
pub use remote::{NoopTransport, RemoteConfig, RemoteTransport};
#[cfg(feature = "remote")]
pub use remote::HttpTransport;
pub use stats::StatsSnapshot;
