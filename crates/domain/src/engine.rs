//! Slicer engine identity.

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an engine's profile keys are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Keys are interpreted through the static field catalog.
    Catalog,
    /// Keys are engine-defined and passed through untouched.
    Dynamic,
}

/// Slicer engine whose profile format is being read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EngineKind {
    /// Legacy Cura engine: catalog keys, arrays for temperatures and G-code.
    Cura,
    /// Slic3r: catalog keys, flat strings, `\n` escaped in G-code.
    Slic3r,
    /// Cura 4 via the `PBCuraEngine` plugin: dynamic keys under `metadata.octoprint_settings`.
    PbCuraEngine,
}

impl EngineKind {
    /// Every supported engine.
    pub const ALL: [Self; 3] = [Self::Cura, Self::Slic3r, Self::PbCuraEngine];

    /// Identifier used by the host application.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Cura => "cura",
            Self::Slic3r => "slic3r",
            Self::PbCuraEngine => "PBCuraEngine",
        }
    }

    /// Key interpretation for this engine.
    #[must_use]
    pub const fn schema(self) -> SchemaMode {
        match self {
            Self::Cura | Self::Slic3r => SchemaMode::Catalog,
            Self::PbCuraEngine => SchemaMode::Dynamic,
        }
    }

    /// True when multi-line G-code is stored with literal `\n` sequences.
    #[must_use]
    pub const fn escapes_newlines(self) -> bool {
        matches!(self, Self::Slic3r)
    }

    /// Parse a host slicer identifier (ASCII case-insensitive, surrounding whitespace ignored).
    pub fn parse(input: &str) -> Result<Self, ProfileError> {
        let trimmed = input.trim();
        Self::ALL
            .into_iter()
            .find(|engine| engine.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ProfileError::UnknownEngine {
                value: trimmed.to_string(),
            })
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.id())
    }
}

impl FromStr for EngineKind {
    type Err = ProfileError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl TryFrom<String> for EngineKind {
    type Error = ProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EngineKind> for String {
    fn from(engine: EngineKind) -> Self {
        engine.id().to_string()
    }
}
