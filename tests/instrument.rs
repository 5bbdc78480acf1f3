use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use debug_log::{assert_log, watch, Event, Level, Logger};

fn capture(logger: &Logger) -> Arc<Mutex<Vec<Event>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    logger.set_output_callback(move |_: &str, event: &Event| {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    });
    events
}

fn of_level(events: &Mutex<Vec<Event>>, level: Level) -> Vec<Event> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.level == level)
        .cloned()
        .collect()
}

// "fetch took 100.42ms" -> 100.42
fn elapsed_ms(message: &str) -> f64 {
    let value = message
        .rsplit(" took ")
        .next()
        .and_then(|rest| rest.strip_suffix("ms"))
        .unwrap();
    value.parse().unwrap()
}

#[derive(Debug, PartialEq)]
struct QuotaExceeded;

#[test]
fn assert_log_true_is_silent() {
    let logger = Logger::new();
    let events = capture(&logger);

    assert_eq!(logger.assert_log(1 + 1 == 2, "ok"), Ok(()));
    assert_log!(logger, 1 + 1 == 2, "ok");

    assert!(of_level(&events, Level::Error).is_empty());
}

#[test]
fn assert_log_false_logs_then_fails() {
    let logger = Logger::new();
    let events = capture(&logger);

    let failure = logger.assert_log(false, "bad").unwrap_err();
    assert_eq!(failure.message, "bad");

    let errors = of_level(&events, Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("bad"));
    assert_eq!(errors[0].message, "ASSERT: bad");
}

#[test]
fn assert_log_macro_panics_after_logging() {
    let logger = Logger::new();
    let events = capture(&logger);
    let balance = -5;

    let result = catch_unwind(AssertUnwindSafe(|| {
        assert_log!(logger, balance >= 0, "balance went negative: {}", balance);
    }));

    assert!(result.is_err());
    let errors = of_level(&events, Level::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "ASSERT: balance went negative: -5");
    assert_eq!(errors[0].location.function, "assert_log_macro_panics_after_logging");
}

#[test]
#[should_panic(expected = "assertion failed: ready")]
fn assert_log_macro_without_message_uses_condition() {
    let logger = Logger::new();
    let _events = capture(&logger);
    let ready = false;
    assert_log!(logger, ready);
}

#[test]
fn timeit_measures_successful_call() {
    let logger = Logger::new();
    let events = capture(&logger);

    let slow = logger.timeit(Some("slow_op"), |ms: u64| {
        std::thread::sleep(Duration::from_millis(ms));
        ms * 2
    });
    assert_eq!(slow(100), 200);

    let timers = of_level(&events, Level::Timer);
    assert_eq!(timers.len(), 1);
    assert!(timers[0].message.starts_with("slow_op took "));
    let ms = elapsed_ms(&timers[0].message);
    assert!(ms >= 100.0, "measured {ms}ms");
    assert!(ms < 400.0, "measured {ms}ms");
}

#[test]
fn timeit_returns_errors_unchanged() {
    let logger = Logger::new();
    let events = capture(&logger);

    let charge = logger.timeit(Some("charge"), |amount: u32| -> Result<u32, QuotaExceeded> {
        if amount > 10 {
            Err(QuotaExceeded)
        } else {
            Ok(amount)
        }
    });

    assert_eq!(charge(50), Err(QuotaExceeded));
    assert_eq!(charge(5), Ok(5));
    assert_eq!(of_level(&events, Level::Timer).len(), 2);
}

#[test]
fn time_logs_even_when_the_call_panics() {
    let logger = Logger::new();
    let events = capture(&logger);

    let result = catch_unwind(AssertUnwindSafe(|| {
        logger.time(Some("explodes"), || -> u32 { panic!("boom") })
    }));

    let payload = result.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));
    let timers = of_level(&events, Level::Timer);
    assert_eq!(timers.len(), 1);
    assert!(timers[0].message.starts_with("explodes took "));
}

#[test]
fn time_without_label_uses_enclosing_name() {
    let logger = Logger::new();
    let events = capture(&logger);

    let value = logger.time(None, || 7);

    assert_eq!(value, 7);
    let timers = of_level(&events, Level::Timer);
    assert!(timers[0].message.starts_with("time_without_label_uses_enclosing_name took "));
}

#[test]
fn watch_renders_pairs_in_given_order() {
    let logger = Logger::new();
    let events = capture(&logger);
    let counter = 10;
    let user = "Bob";

    watch!(logger, counter = counter, user = user);
    watch!(logger, user, counter);
    watch!(logger, name = "session"; active = true);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.level == Level::Debug));
    assert_eq!(events[0].message, "WATCH: counter=10, user=\"Bob\"");
    assert_eq!(events[1].message, "WATCH: user=\"Bob\", counter=10");
    assert_eq!(events[2].message, "WATCH: active=true");
    assert!(events[2].tags.contains("session"));
}

#[test]
fn helpers_respect_filters() {
    let logger = Logger::new();
    let events = capture(&logger);
    logger.disable_level(Level::Timer);
    logger.disable_level(Level::Debug);

    let counter = 1;
    watch!(logger, counter);
    logger.time(Some("hidden"), || ());

    assert!(events.lock().unwrap().is_empty());
    assert_eq!(logger.stats().events_filtered, 2);
}
