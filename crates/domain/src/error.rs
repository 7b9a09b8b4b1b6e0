//! Domain error type.

use slicer_profile_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// Failures raised by profile lookups and conversions.
///
/// `normalize` and `denormalize` never fail; these errors only come from
/// catalog queries and from parsing caller input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The slicer identifier does not name a supported engine.
    UnknownEngine {
        /// Raw identifier as supplied.
        value: String,
    },
    /// `enum_values_of` was called on a key that is not enumerated.
    NotAnEnumKey {
        /// Offending key.
        key: String,
    },
    /// A raw profile document must be a JSON object.
    DocumentNotObject {
        /// JSON type that was found instead.
        found: &'static str,
    },
}

impl ProfileError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnknownEngine { .. } => ErrorCode::new("profile", "unknown_engine"),
            Self::NotAnEnumKey { .. } => ErrorCode::new("profile", "not_an_enum_key"),
            Self::DocumentNotObject { .. } => ErrorCode::new("profile", "document_not_object"),
        }
    }
}

impl fmt::Display for ProfileError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEngine { value } => {
                write!(
                    formatter,
                    "unknown slicer engine `{value}` (expected cura, slic3r, or PBCuraEngine)"
                )
            },
            Self::NotAnEnumKey { key } => write!(formatter, "`{key}` is not an enumerated setting"),
            Self::DocumentNotObject { found } => {
                write!(formatter, "profile document must be an object, found {found}")
            },
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<ProfileError> for ErrorEnvelope {
    fn from(error: ProfileError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            ProfileError::UnknownEngine { value } => envelope.with_metadata("engine", value),
            ProfileError::NotAnEnumKey { key } => envelope.with_metadata("key", key),
            ProfileError::DocumentNotObject { found } => envelope.with_metadata("found", found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_code_and_metadata() {
        let envelope = ErrorEnvelope::from(ProfileError::NotAnEnumKey {
            key: "layer_height".into(),
        });
        assert_eq!(envelope.code, ErrorCode::new("profile", "not_an_enum_key"));
        assert_eq!(
            envelope.metadata.get("key").map(String::as_str),
            Some("layer_height")
        );
    }
}
