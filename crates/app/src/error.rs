//! Session error type.

use slicer_profile_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// Failures raised by [`OverridesSession`](crate::OverridesSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A field was read or written before any profile was loaded.
    NoProfileLoaded,
    /// A catalog engine was asked to set a key outside the field catalog.
    UnknownKey {
        /// Offending key.
        key: String,
        /// Engine of the loaded profile.
        engine: &'static str,
    },
    /// A catalog key was given a value of the wrong shape.
    InvalidValue {
        /// Offending key.
        key: String,
        /// Shape the key accepts.
        expected: &'static str,
    },
    /// A dynamic-schema payload had no `metadata.octoprint_settings` object.
    MissingEmbeddedSettings {
        /// Engine whose payload shape was expected.
        engine: &'static str,
    },
}

impl SessionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::NoProfileLoaded => ErrorCode::new("session", "no_profile_loaded"),
            Self::UnknownKey { .. } => ErrorCode::new("session", "unknown_key"),
            Self::InvalidValue { .. } => ErrorCode::new("session", "invalid_value"),
            Self::MissingEmbeddedSettings { .. } => {
                ErrorCode::new("session", "missing_embedded_settings")
            },
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProfileLoaded => formatter.write_str("no profile has been loaded"),
            Self::UnknownKey { key, engine } => {
                write!(formatter, "`{key}` is not a {engine} setting")
            },
            Self::InvalidValue { key, expected } => {
                write!(formatter, "`{key}` expects a {expected} value")
            },
            Self::MissingEmbeddedSettings { engine } => write!(
                formatter,
                "{engine} payload has no metadata.octoprint_settings object"
            ),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SessionError> for ErrorEnvelope {
    fn from(error: SessionError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            SessionError::NoProfileLoaded => envelope,
            SessionError::UnknownKey { key, engine } => envelope
                .with_metadata("key", key)
                .with_metadata("engine", engine),
            SessionError::InvalidValue { key, expected } => envelope
                .with_metadata("key", key)
                .with_metadata("expected", expected),
            SessionError::MissingEmbeddedSettings { engine } => {
                envelope.with_metadata("engine", engine)
            },
        }
    }
}
