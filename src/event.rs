use chrono::{DateTime, Utc};
use serde::Serialize;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::level::Level;

/// Upper bound on captured stack frames.
const MAX_STACK_FRAMES: usize = 32;

/// Call-site location of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
    /// Module path (`crate::a::b`) when captured by a macro, the file stem
    /// when captured through `#[track_caller]`.
    pub module: &'static str,
    /// Enclosing function, or `?` when it cannot be determined.
    pub function: &'static str,
}

impl Location {
    pub const fn new(file: &'static str, line: u32, module: &'static str, function: &'static str) -> Self {
        Self { file, line, module, function }
    }

    /// Location of the caller, as far as `#[track_caller]` can see it.
    ///
    /// Rust does not expose the enclosing function here, so `function` is
    /// `?`; use the [`here!`](crate::here) macro for full locations.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        Self {
            file: loc.file(),
            line: loc.line(),
            module: file_stem(loc.file()),
            function: "?",
        }
    }

    pub fn file_name(&self) -> &'static str {
        Path::new(self.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.file)
    }
}

/// Renders as `file:line in function()`, with the file reduced to its base
/// name.
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} in {}()", self.file_name(), self.line, self.function)
    }
}

fn file_stem(file: &'static str) -> &'static str {
    Path::new(file)
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("?")
}

/// Extract the enclosing function from the type name of a nested marker
/// function, e.g. `app::net::connect::f` or `app::run::{{closure}}::f`.
#[doc(hidden)]
pub fn function_name(marker: &'static str) -> &'static str {
    short_type_name(marker.strip_suffix("::f").unwrap_or(marker))
}

/// Last path segment of a function's type name, looking through closures.
pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    let mut name = name;
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// One logging occurrence.
///
/// Built once per call by the pipeline and then only handed out by shared
/// reference, so sinks observe the same value.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub tags: BTreeSet<String>,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
}

/// Capture the current call stack as one string per frame.
///
/// Returns `None` when the platform cannot produce a backtrace.
pub(crate) fn capture_stack() -> Option<Vec<String>> {
    let backtrace = Backtrace::force_capture();
    if backtrace.status() != BacktraceStatus::Captured {
        return None;
    }
    let rendered = backtrace.to_string();
    let frames = parse_frames(&rendered);
    if frames.is_empty() {
        None
    } else {
        Some(frames)
    }
}

fn parse_frames(rendered: &str) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    for line in rendered.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(at) = line.strip_prefix("at ") {
            if let Some(last) = frames.last_mut() {
                last.push_str(" at ");
                last.push_str(at);
            }
            continue;
        }
        let symbol = match line.split_once(": ") {
            Some((index, symbol)) if index.chars().all(|c| c.is_ascii_digit()) => symbol,
            _ => line,
        };
        frames.push(symbol.to_string());
    }

    // Drop the frames of the capture machinery and of this crate.
    let skip = frames
        .iter()
        .take_while(|f| f.starts_with("std::backtrace") || f.starts_with("debug_log::"))
        .count();
    frames.into_iter().skip(skip).take(MAX_STACK_FRAMES).collect()
}
