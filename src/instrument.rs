use std::fmt;
use std::time::Instant;

use crate::error::AssertionFailure;
use crate::event::{short_type_name, Location};
use crate::level::Level;
use crate::logger::{LogOptions, Logger};

impl Logger {
    /// Log the given name/value pairs at DEBUG, in the order given, as
    /// `WATCH: a=1, b="x"`. Values are rendered with their `Debug`
    /// implementation. `name`, when given, becomes a tag.
    #[track_caller]
    pub fn watch(&self, name: Option<&str>, variables: &[(&str, &dyn fmt::Debug)]) {
        self.watch_at(Location::caller(), name, variables);
    }

    pub fn watch_at(&self, location: Location, name: Option<&str>, variables: &[(&str, &dyn fmt::Debug)]) {
        let pairs: Vec<String> = variables
            .iter()
            .map(|(key, value)| format!("{}={:?}", key, value))
            .collect();
        let mut options = LogOptions::level(Level::Debug);
        if let Some(name) = name {
            options.tags.push(name.to_string());
        }
        self.log_at(location, format!("WATCH: {}", pairs.join(", ")), options);
    }

    /// Check `condition`; when it is false, log `ASSERT: <message>` at
    /// ERROR with a stack trace and return the failure.
    ///
    /// The [`assert_log!`](crate::assert_log) macro panics on the failure
    /// instead, like `assert!`.
    #[track_caller]
    pub fn assert_log(&self, condition: bool, message: impl Into<String>) -> Result<(), AssertionFailure> {
        self.assert_log_at(Location::caller(), condition, message)
    }

    pub fn assert_log_at(
        &self,
        location: Location,
        condition: bool,
        message: impl Into<String>,
    ) -> Result<(), AssertionFailure> {
        if condition {
            return Ok(());
        }
        let message = message.into();
        self.log_at(
            location,
            format!("ASSERT: {}", message),
            LogOptions::level(Level::Error).include_stack(true),
        );
        Err(AssertionFailure { message })
    }

    /// Start a timer that logs `<label> took <ms>ms` at TIMER level when
    /// dropped, including during unwinding.
    #[track_caller]
    pub fn start_timer(&self, label: impl Into<String>) -> TimerGuard<'_> {
        TimerGuard::new(self, label.into(), Location::caller())
    }

    /// Run `f` and log how long it took. The result, `Err` included, is
    /// returned unchanged; a panic still produces the timing event.
    ///
    /// Without a label, the name of `f` is used.
    #[track_caller]
    pub fn time<F, R>(&self, label: Option<&str>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let label = label_or_name::<F>(label);
        let _timer = TimerGuard::new(self, label, Location::caller());
        f()
    }

    /// Wrap `f` so that every call is timed like [`Logger::time`].
    ///
    /// Functions of several arguments can be wrapped by taking a tuple.
    #[track_caller]
    pub fn timeit<'a, A, R, F>(&'a self, label: Option<&str>, f: F) -> impl Fn(A) -> R + 'a
    where
        F: Fn(A) -> R + 'a,
        A: 'a,
        R: 'a,
    {
        let label = label_or_name::<F>(label);
        let location = Location::caller();
        move |args: A| {
            let _timer = TimerGuard::new(self, label.clone(), location);
            f(args)
        }
    }
}

fn label_or_name<F>(label: Option<&str>) -> String {
    match label {
        Some(label) => label.to_string(),
        None => short_type_name(std::any::type_name::<F>()).to_string(),
    }
}

/// Measures from creation to drop and logs the elapsed time at TIMER
/// level.
pub struct TimerGuard<'a> {
    logger: &'a Logger,
    label: String,
    location: Location,
    start: Instant,
}

impl<'a> TimerGuard<'a> {
    fn new(logger: &'a Logger, label: String, location: Location) -> Self {
        Self {
            logger,
            label,
            location,
            start: Instant::now(),
        }
    }
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.logger.log_at(
            self.location,
            format!("{} took {:.2}ms", self.label, elapsed_ms),
            LogOptions::level(Level::Timer),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use std::sync::{Arc, Mutex};

    fn capture(logger: &Logger) -> Arc<Mutex<Vec<Event>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        logger.set_output_callback(move |_: &str, event: &Event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });
        events
    }

    fn fetch_user(id: u32) -> u32 {
        id + 1
    }

    #[test]
    fn watch_keeps_given_order() {
        let logger = Logger::new();
        let events = capture(&logger);

        logger.watch(Some("loop"), &[("counter", &10 as &dyn fmt::Debug), ("user", &"Bob" as &dyn fmt::Debug)]);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::Debug);
        assert_eq!(events[0].message, "WATCH: counter=10, user=\"Bob\"");
        assert!(events[0].tags.contains("loop"));
    }

    #[test]
    fn timeit_uses_function_name_without_label() {
        let logger = Logger::new();
        let events = capture(&logger);

        let timed = logger.timeit(None, fetch_user);
        assert_eq!(timed(41), 42);
        assert_eq!(timed(1), 2);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.level == Level::Timer));
        assert!(events[0].message.starts_with("fetch_user took "));
        assert!(events[0].message.ends_with("ms"));
    }

    #[test]
    fn timer_guard_logs_on_drop() {
        let logger = Logger::new();
        let events = capture(&logger);
        {
            let _timer = logger.start_timer("block");
            assert!(events.lock().unwrap().is_empty());
        }
        assert!(events.lock().unwrap()[0].message.starts_with("block took "));
    }

    #[test]
    fn assert_log_passes_silently() {
        let logger = Logger::new();
        let events = capture(&logger);
        assert!(logger.assert_log(1 + 1 == 2, "ok").is_ok());
        assert!(events.lock().unwrap().is_empty());
    }
}
