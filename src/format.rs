use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::event::Event;
use crate::level::{Level, RESET};

/// Timestamp layout used by both text and JSON output: local time with
/// millisecond precision and the UTC offset, e.g.
/// `2024-03-05 15:07:09.042+01:00`.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f%:z";

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

/// JSON shape of an event, shared by `json_mode` output and the remote
/// wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRecord {
    pub timestamp: String,
    pub level: Level,
    /// `file:line in function()`
    pub location: String,
    pub tags: Vec<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
}

impl JsonRecord {
    pub fn from_event(event: &Event) -> Self {
        JsonRecord {
            timestamp: format_timestamp(&event.timestamp),
            level: event.level,
            location: event.location.to_string(),
            tags: event.tags.iter().cloned().collect(),
            message: event.message.clone(),
            stack: event.stack.clone(),
        }
    }
}

/// Render `event` for the file and callback sinks.
pub fn render(event: &Event, config: &Config) -> String {
    if config.json_mode {
        render_json(event)
    } else {
        render_text(event, &config.format, event.level.as_str())
    }
}

/// Render `event` for the console: same as [`render`], with the level
/// segment colored when colors are enabled in text mode.
pub fn render_console(event: &Event, config: &Config) -> String {
    if config.json_mode || !config.use_colors {
        return render(event, config);
    }
    let level = format!("{}{}{}", event.level.color(), event.level.as_str(), RESET);
    render_text(event, &config.format, &level)
}

pub fn render_json(event: &Event) -> String {
    serde_json::to_string(&JsonRecord::from_event(event)).unwrap_or_else(|_| "{}".to_string())
}

/// Substitute the known placeholders in one pass. Unknown placeholders
/// and placeholder-like text inside substituted values stay verbatim.
fn render_text(event: &Event, template: &str, level: &str) -> String {
    let mut out = String::with_capacity(template.len() + event.message.len() + 32);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let end = match candidate.find('}') {
            Some(end) => end,
            None => {
                out.push_str(candidate);
                rest = "";
                break;
            }
        };
        let placeholder = &candidate[1..end];
        match placeholder {
            "time" => out.push_str(&format_timestamp(&event.timestamp)),
            "level" => out.push_str(level),
            "location" => out.push_str(&event.location.to_string()),
            "tags" => out.push_str(&render_tags(event)),
            "message" => out.push_str(&event.message),
            _ => {
                // Not ours; emit the brace and keep scanning after it.
                out.push('{');
                rest = &candidate[1..];
                continue;
            }
        }
        rest = &candidate[end + 1..];
    }
    out.push_str(rest);
    out
}

fn render_tags(event: &Event) -> String {
    if event.tags.is_empty() {
        return String::new();
    }
    let joined: Vec<&str> = event.tags.iter().map(String::as_str).collect();
    format!("[{}]", joined.join(","))
}
