//! Structured logging boundary contract.

use slicer_profile_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

/// Additional event fields.
pub type LogFields = BTreeMap<Box<str>, serde_json::Value>;

/// Build [`LogFields`] from key/value pairs.
pub fn log_fields<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> LogFields
where
    K: Into<Box<str>>,
    V: Into<serde_json::Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Structured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Stable event name (e.g. `profile.fetch.start`).
    pub event: Box<str>,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: Box<str>,
    /// Optional structured fields.
    pub fields: Option<LogFields>,
    /// Optional error payload.
    pub error: Option<serde_json::Value>,
}

impl LogEvent {
    /// Event without fields or error.
    #[must_use]
    pub fn new(level: LogLevel, event: &str, message: &str) -> Self {
        Self {
            event: event.into(),
            level,
            message: message.into(),
            fields: None,
            error: None,
        }
    }

    /// Attach structured fields.
    #[must_use]
    pub fn with_fields(mut self, fields: LogFields) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Attach an error envelope as `{ code, message, metadata }`.
    #[must_use]
    pub fn with_error(mut self, error: &ErrorEnvelope) -> Self {
        self.error = Some(serde_json::json!({
            "code": error.code.to_string(),
            "message": error.message,
            "metadata": error.metadata,
        }));
        self
    }
}

/// Boundary contract for structured logging.
pub trait LoggerPort: Send + Sync {
    /// Emit a structured event.
    fn log(&self, event: LogEvent);

    /// Create a child logger with base fields applied to every event.
    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort>;

    /// Convenience: debug event.
    fn debug(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(LogLevel::Debug, event, message)
        });
    }

    /// Convenience: info event.
    fn info(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(LogLevel::Info, event, message)
        });
    }

    /// Convenience: warn event.
    fn warn(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(LogLevel::Warn, event, message)
        });
    }

    /// Convenience: error event.
    fn error(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(LogLevel::Error, event, message)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer_profile_shared::ErrorCode;

    #[test]
    fn log_fields_collects_pairs() {
        let fields = log_fields([("engine", "cura"), ("profile", "draft")]);
        assert_eq!(
            fields.get("engine"),
            Some(&serde_json::Value::from("cura"))
        );
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn error_payload_carries_code() {
        let envelope = ErrorEnvelope::expected(ErrorCode::not_found(), "missing profile")
            .with_metadata("profile", "draft");
        let event = LogEvent::new(LogLevel::Error, "profile.fetch.failed", "fetch failed")
            .with_error(&envelope);

        let error = event.error.unwrap_or_default();
        assert_eq!(error["code"], "core:not_found");
        assert_eq!(error["metadata"]["profile"], "draft");
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
    }
}
