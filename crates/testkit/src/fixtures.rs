//! Fixture loading for the JSON and TOML files under `crates/testkit/fixtures`.

use serde::de::DeserializeOwned;
use serde_json::Value;
use slicer_profile_ports::EngineKind;
use std::path::{Path, PathBuf};
use std::{fmt, fs};

/// Errors raised while loading fixtures.
#[derive(Debug)]
pub enum FixtureError {
    /// Fixture file does not exist.
    MissingFixture {
        /// Path that could not be found.
        path: PathBuf,
    },
    /// Fixture file could not be read.
    FixtureRead {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Fixture file could not be parsed.
    FixtureParse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

impl fmt::Display for FixtureError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFixture { path } => {
                write!(formatter, "missing fixture: {}", path.display())
            },
            Self::FixtureRead { path, source } => {
                write!(
                    formatter,
                    "failed to read fixture {}: {}",
                    path.display(),
                    source
                )
            },
            Self::FixtureParse { path, source } => {
                write!(
                    formatter,
                    "failed to parse fixture {}: {}",
                    path.display(),
                    source
                )
            },
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingFixture { .. } => None,
            Self::FixtureRead { source, .. } => Some(source),
            Self::FixtureParse { source, .. } => Some(source),
        }
    }
}

/// Root of the fixture tree.
pub fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Absolute path of a fixture, relative to [`fixtures_root`].
pub fn fixture_path(relative: &str) -> PathBuf {
    fixtures_root().join(relative)
}

/// Directory laid out as `<engine-id>/<profile>.json`, usable as a profile root.
pub fn profile_fixtures_root() -> PathBuf {
    fixture_path("profiles")
}

/// Read a fixture as text.
pub fn read_fixture_text(relative: &str) -> Result<String, FixtureError> {
    let path = fixture_path(relative);
    if !path.exists() {
        return Err(FixtureError::MissingFixture { path });
    }
    fs::read_to_string(&path).map_err(|source| FixtureError::FixtureRead { path, source })
}

/// Read and deserialize a JSON fixture.
pub fn read_fixture_json<T: DeserializeOwned>(relative: &str) -> Result<T, FixtureError> {
    let contents = read_fixture_text(relative)?;
    serde_json::from_str(&contents).map_err(|source| FixtureError::FixtureParse {
        path: fixture_path(relative),
        source,
    })
}

/// Raw payload of a stored profile.
pub fn profile_fixture(engine: EngineKind, name: &str) -> Result<Value, FixtureError> {
    read_fixture_json(&format!("profiles/{}/{name}.json", engine.id()))
}
