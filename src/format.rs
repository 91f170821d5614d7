use crate::entry::LogEntry;
use crate::error::RenderError;
use crate::level::Level;
use chrono::SecondsFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Renders a [`LogEntry`] to the string stored in the `entry` key.
pub trait Formatter: Send + Sync {
    fn format(&self, entry: &LogEntry) -> Result<String, RenderError>;
}

/// `key=value` line format: `time="..." level=info msg="..." user_id=42`.
///
/// Fields follow the fixed keys in key order. Values that contain spaces,
/// quotes or `=` are quoted.
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    pub disable_timestamp: bool,
}

impl Formatter for TextFormatter {
    fn format(&self, entry: &LogEntry) -> Result<String, RenderError> {
        let mut out = String::new();
        if !self.disable_timestamp {
            push_pair(&mut out, "time", &rfc3339(entry));
        }
        push_pair(&mut out, "level", entry.level.as_str());
        push_pair(&mut out, "msg", &entry.message);
        for (key, value) in &entry.fields {
            match value {
                serde_json::Value::String(s) => push_pair(&mut out, key, s),
                other => push_pair(&mut out, key, &other.to_string()),
            }
        }
        Ok(out)
    }
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    if needs_quoting(value) {
        // writing into a String cannot fail
        let _ = write!(out, "{key}={value:?}");
    } else {
        let _ = write!(out, "{key}={value}");
    }
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=' || c.is_control())
}

/// One JSON object per entry: `{"level":"info","msg":"...","time":"...",...fields}`.
///
/// A field named `time`, `level` or `msg` is kept under `fields.<name>`
/// instead of replacing the fixed key.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub pretty_print: bool,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    time: String,
    level: Level,
    msg: &'a str,
    #[serde(flatten)]
    fields: BTreeMap<String, &'a serde_json::Value>,
}

impl Formatter for JsonFormatter {
    fn format(&self, entry: &LogEntry) -> Result<String, RenderError> {
        let fields = entry
            .fields
            .iter()
            .map(|(key, value)| match key.as_str() {
                "time" | "level" | "msg" => (format!("fields.{key}"), value),
                _ => (key.clone(), value),
            })
            .collect();

        let line = JsonLine {
            time: rfc3339(entry),
            level: entry.level,
            msg: &entry.message,
            fields,
        };

        let rendered = if self.pretty_print {
            serde_json::to_string_pretty(&line)?
        } else {
            serde_json::to_string(&line)?
        };
        Ok(rendered)
    }
}

fn rfc3339(entry: &LogEntry) -> String {
    entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
