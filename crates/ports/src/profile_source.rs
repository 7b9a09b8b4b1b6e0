//! Profile retrieval boundary contract.

use crate::BoxFuture;
use slicer_profile_domain::EngineKind;
use slicer_profile_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::fmt;

/// Profile name validated for use as a single path or URL segment.
///
/// Rejects empty names, path separators, `..`, and control characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileName(Box<str>);

impl ProfileName {
    /// Validate an untrusted profile name.
    pub fn new(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid_name(input, "profile name must be non-empty"));
        }
        if trimmed.contains(['/', '\\']) {
            return Err(invalid_name(
                input,
                "profile name must not contain path separators",
            ));
        }
        if trimmed == "." || trimmed.contains("..") {
            return Err(invalid_name(input, "path traversal is not allowed"));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(invalid_name(
                input,
                "profile name must not contain control characters",
            ));
        }
        Ok(Self(trimmed.into()))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

fn invalid_name(input: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::invalid_input(), message).with_metadata("profile", input)
}

/// The (engine, profile) pair a caller wants loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileSelection {
    /// Engine whose profile store is queried.
    pub engine: EngineKind,
    /// Profile within that store.
    pub profile: ProfileName,
}

impl ProfileSelection {
    /// Pair an engine with a validated profile name.
    #[must_use]
    pub const fn new(engine: EngineKind, profile: ProfileName) -> Self {
        Self { engine, profile }
    }

    /// Validate `profile` and pair it with `engine`.
    pub fn parse(engine: EngineKind, profile: &str) -> Result<Self> {
        Ok(Self::new(engine, ProfileName::new(profile)?))
    }
}

impl fmt::Display for ProfileSelection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.engine, self.profile)
    }
}

/// Boundary contract for loading raw profile payloads.
///
/// The payload is the host's profile envelope. For the dynamic-schema engine
/// the settings live under `metadata.octoprint_settings`; for catalog engines
/// the payload is the settings document itself.
pub trait ProfileSourcePort: Send + Sync {
    /// Fetch the payload for `selection`.
    ///
    /// Implementations should return a `core:cancelled` error once `ctx` is
    /// cancelled and `core:not_found` for unknown profiles.
    fn fetch_profile(
        &self,
        ctx: &RequestContext,
        selection: &ProfileSelection,
    ) -> BoxFuture<'_, Result<serde_json::Value>>;
}
