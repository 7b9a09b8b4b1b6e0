use slicer_profile_shared::{ErrorCode, ErrorEnvelope, ErrorKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    InvalidInput = 2,
    Io = 3,
    Internal = 1,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug)]
pub enum CliError {
    InvalidInput(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Envelope(ErrorEnvelope),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
            Self::Envelope(envelope) => envelope_exit_code(envelope),
        }
    }
}

/// Expected failures are caller mistakes; unexpected `core:*` failures come from the OS.
pub fn envelope_exit_code(envelope: &ErrorEnvelope) -> ExitCode {
    match envelope.kind {
        ErrorKind::Expected => ExitCode::InvalidInput,
        ErrorKind::Invariant => ExitCode::Internal,
        ErrorKind::Unexpected => {
            if envelope.code.namespace() == "core" && envelope.code != ErrorCode::internal() {
                ExitCode::Io
            } else {
                ExitCode::Internal
            }
        },
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(formatter, "invalid input: {message}"),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
            Self::Envelope(envelope) => write!(formatter, "{}: {}", envelope.code, envelope.message),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

impl From<ErrorEnvelope> for CliError {
    fn from(error: ErrorEnvelope) -> Self {
        Self::Envelope(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer_profile_shared::ErrorClass;

    #[test]
    fn envelopes_map_to_exit_codes() {
        let expected = ErrorEnvelope::expected(ErrorCode::not_found(), "profile not found");
        assert_eq!(envelope_exit_code(&expected), ExitCode::InvalidInput);

        let io = ErrorEnvelope::unexpected(ErrorCode::io(), "disk", ErrorClass::NonRetriable);
        assert_eq!(envelope_exit_code(&io), ExitCode::Io);

        let internal = ErrorEnvelope::invariant(ErrorCode::internal(), "broken");
        assert_eq!(envelope_exit_code(&internal), ExitCode::Internal);
    }
}
