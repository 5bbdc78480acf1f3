use std::any::Any;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::config::Callback;
use crate::error::SinkError;
use crate::event::Event;

/// Local destination for rendered events.
///
/// The pipeline calls `emit` while holding its lock, one event at a time,
/// so implementations see events in order and never concurrently.
/// Implementations should be fast; anything slow belongs in the remote
/// path.
pub trait LogSink: Send {
    /// Deliver one rendered event.
    ///
    /// **Parameters**
    /// - `rendered`: the formatted line, without trailing newline.
    /// - `event`: the event it was rendered from.
    ///
    /// **Returns**
    /// - `Ok(())` if the sink accepted the line.
    /// - `Err(..)` on delivery failure. The pipeline counts and reports it
    ///   and carries on with the remaining sinks.
    fn emit(&mut self, rendered: &str, event: &Event) -> Result<(), SinkError>;

    /// Short name used when reporting failures.
    fn name(&self) -> &'static str;
}

/// Writes each line to standard output.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn emit(&mut self, rendered: &str, _event: &Event) -> Result<(), SinkError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", rendered)
            .and_then(|_| out.flush())
            .map_err(|source| SinkError::Io {
                path: "<stdout>".to_string(),
                source,
            })
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Appends lines to a file, opened (and created) on first use and kept
/// open afterwards.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<LineWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl LogSink for FileSink {
    fn emit(&mut self, rendered: &str, _event: &Event) -> Result<(), SinkError> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|e| self.io_error(e))?;
            self.file = Some(LineWriter::new(file));
        }

        let written = match self.file.as_mut() {
            Some(w) => writeln!(w, "{}", rendered).and_then(|_| w.flush()),
            None => Ok(()),
        };
        written.map_err(|e| {
            // Reopen on the next event.
            self.file = None;
            self.io_error(e)
        })
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Hands each rendered event to a user callback, containing its errors and
/// panics.
pub struct CallbackSink {
    callback: Callback,
}

impl CallbackSink {
    pub fn new(callback: Callback) -> Self {
        Self { callback }
    }
}

impl LogSink for CallbackSink {
    fn emit(&mut self, rendered: &str, event: &Event) -> Result<(), SinkError> {
        let callback = &self.callback;
        match catch_unwind(AssertUnwindSafe(|| callback(rendered, event))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SinkError::Callback(e)),
            Err(payload) => Err(SinkError::CallbackPanicked(panic_message(payload.as_ref()))),
        }
    }

    fn name(&self) -> &'static str {
        "callback"
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
