use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::event::Location;
use crate::level::Level;
use crate::logger::{LogOptions, Logger};

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// `tracing_subscriber` layer that feeds `tracing` events into a
/// [`Logger`], so libraries instrumented with `tracing` share the same
/// filters and sinks.
///
/// The message becomes the event message, other fields are appended as
/// `key=value`, and the innermost span name stands in for the function.
/// Events emitted by this crate itself are ignored.
pub struct PipelineLayer {
    logger: Arc<Logger>,
    max_level: tracing::Level,
}

impl PipelineLayer {
    /// Forward every event, TRACE included.
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            max_level: tracing::Level::TRACE,
        }
    }

    /// Forward only events at `max_level` or more severe.
    pub fn with_max_level(self, max_level: tracing::Level) -> Self {
        Self { max_level, ..self }
    }
}

fn is_own(target: &str) -> bool {
    target == OWN_TARGET
        || target
            .strip_prefix(OWN_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}

impl<S> Layer<S> for PipelineLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_own(meta.target()) || *meta.level() > self.max_level {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let mut text = message.unwrap_or_default();
        for (key, value) in &fields {
            if !text.is_empty() {
                text.push(' ');
            }
            match value {
                serde_json::Value::String(s) => text.push_str(&format!("{}={}", key, s)),
                other => text.push_str(&format!("{}={}", key, other)),
            }
        }

        let function = ctx.event_span(event).map(|span| span.name()).unwrap_or("?");
        let location = Location::new(
            meta.file().unwrap_or("?"),
            meta.line().unwrap_or(0),
            meta.module_path().unwrap_or(meta.target()),
            function,
        );

        self.logger
            .log_at(location, text, LogOptions::level(map_level(meta.level())));
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
