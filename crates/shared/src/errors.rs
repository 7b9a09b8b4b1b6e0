//! Structured error envelope used at every crate boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, io};

/// Diagnostic key/value pairs attached to an error.
pub type ErrorMetadata = BTreeMap<String, String>;

/// Where an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller-visible failures: bad input, missing profile, cancellation.
    Expected,
    /// A broken internal invariant.
    Invariant,
    /// I/O and other failures outside our control.
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Expected => "expected",
            Self::Invariant => "invariant",
            Self::Unexpected => "unexpected",
        })
    }
}

/// Whether retrying the failed operation can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Safe to retry.
    Retriable,
    /// Retrying will fail the same way.
    NonRetriable,
}

impl ErrorClass {
    /// Returns true for [`ErrorClass::Retriable`].
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Retriable)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Retriable => "retriable",
            Self::NonRetriable => "non-retriable",
        })
    }
}

/// Namespaced, stable error code (`namespace:code`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Build a code from its namespace and identifier.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// `core:cancelled`
    pub fn cancelled() -> Self {
        Self::new("core", "cancelled")
    }

    /// `core:invalid_input`
    pub fn invalid_input() -> Self {
        Self::new("core", "invalid_input")
    }

    /// `core:not_found`
    pub fn not_found() -> Self {
        Self::new("core", "not_found")
    }

    /// `core:permission_denied`
    pub fn permission_denied() -> Self {
        Self::new("core", "permission_denied")
    }

    /// `core:io`
    pub fn io() -> Self {
        Self::new("core", "io")
    }

    /// `core:internal`
    pub fn internal() -> Self {
        Self::new("core", "internal")
    }

    /// Map an I/O error kind onto a core code.
    pub fn from_io_kind(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => Self::not_found(),
            io::ErrorKind::PermissionDenied => Self::permission_denied(),
            io::ErrorKind::Interrupted => Self::cancelled(),
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => Self::invalid_input(),
            _ => Self::io(),
        }
    }

    /// Namespace portion (`core`, `profile`, `config`, ...).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Identifier within the namespace.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Error value returned by every fallible boundary operation in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Origin category.
    pub kind: ErrorKind,
    /// Retry classification.
    pub class: ErrorClass,
    /// Stable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Diagnostic metadata (profile name, key, path, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    fn build(kind: ErrorKind, class: ErrorClass, code: ErrorCode, message: String) -> Self {
        Self {
            kind,
            class,
            code,
            message,
            metadata: ErrorMetadata::new(),
        }
    }

    /// Non-retriable expected failure.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Expected,
            ErrorClass::NonRetriable,
            code,
            message.into(),
        )
    }

    /// Invariant violation (never retriable).
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Invariant,
            ErrorClass::NonRetriable,
            code,
            message.into(),
        )
    }

    /// Unexpected failure with an explicit retry class.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>, class: ErrorClass) -> Self {
        Self::build(ErrorKind::Unexpected, class, code, message.into())
    }

    /// Cancellation (a superseded or aborted request).
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::cancelled(), message)
    }

    /// True when this error is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::cancelled()
    }

    /// Attach one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {} {}: {}",
            self.kind, self.class, self.code, self.message
        )
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        let kind = error.kind();
        let class = if is_retriable_io(kind) {
            ErrorClass::Retriable
        } else {
            ErrorClass::NonRetriable
        };
        Self::unexpected(ErrorCode::from_io_kind(kind), error.to_string(), class)
    }
}

const fn is_retriable_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
