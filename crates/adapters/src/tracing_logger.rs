//! Logger adapter that forwards [`LogEvent`]s to `tracing`.
//!
//! Formatting and sinks belong to whatever subscriber the binary installs.
//! Structured fields travel as one JSON-encoded `fields` value so that dynamic
//! keys survive the static field sets `tracing` requires.

use serde_json::Value;
use slicer_profile_ports::{LogEvent, LogFields, LogLevel, LoggerPort};

/// [`LoggerPort`] backed by the `tracing` macros.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    base_fields: LogFields,
    min_level: LogLevel,
}

impl TracingLogger {
    /// Logger emitting every level, with no base fields.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base_fields: LogFields::new(),
            min_level: LogLevel::Debug,
        }
    }

    /// Set base fields applied to every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Drop events below `level` before they reach `tracing`.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn merged_fields(&self, extra: Option<LogFields>) -> LogFields {
        let mut fields = self.base_fields.clone();
        if let Some(extra) = extra {
            fields.extend(extra);
        }
        fields
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        if event.level < self.min_level {
            return;
        }

        let fields = render_fields(&self.merged_fields(event.fields));
        let error = event.error.as_ref().map_or_else(String::new, Value::to_string);
        let name = event.event.as_ref();
        let message = event.message.as_ref();

        match event.level {
            LogLevel::Debug => {
                tracing::debug!(event = name, fields = %fields, error = %error, "{message}");
            }
            LogLevel::Info => {
                tracing::info!(event = name, fields = %fields, error = %error, "{message}");
            }
            LogLevel::Warn => {
                tracing::warn!(event = name, fields = %fields, error = %error, "{message}");
            }
            LogLevel::Error => {
                tracing::error!(event = name, fields = %fields, error = %error, "{message}");
            }
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self {
            base_fields: self.merged_fields(Some(fields)),
            min_level: self.min_level,
        })
    }
}

fn render_fields(fields: &LogFields) -> String {
    if fields.is_empty() {
        return String::new();
    }
    let map: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    Value::Object(map).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer_profile_ports::log_fields;

    #[test]
    fn child_fields_override_base_fields() {
        let logger = TracingLogger::new()
            .with_base_fields(log_fields([("engine", "cura"), ("profile", "draft")]));
        let merged = logger.merged_fields(Some(log_fields([("profile", "vase")])));

        assert_eq!(merged.get("engine"), Some(&Value::from("cura")));
        assert_eq!(merged.get("profile"), Some(&Value::from("vase")));
    }

    #[test]
    fn rendered_fields_are_sorted_json() {
        let rendered = render_fields(&log_fields([("b", 2), ("a", 1)]));
        assert_eq!(rendered, r#"{"a":1,"b":2}"#);
        assert_eq!(render_fields(&LogFields::new()), "");
    }
}
