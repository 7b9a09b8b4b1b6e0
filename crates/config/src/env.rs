//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a variable that is present but empty or
//! unrecognized fails instead of being ignored.

use crate::schema::{LogFormat, LogLevel, ProfileConfig, ValidatedProfileConfig};
use slicer_profile_domain::EngineKind;
use slicer_profile_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: default slicer engine.
pub const ENV_ENGINE: &str = "SLICER_PROFILE_ENGINE";
/// Env var: filesystem profile source root.
pub const ENV_PROFILE_ROOT: &str = "SLICER_PROFILE_ROOT";
/// Env var: log level.
pub const ENV_LOG_LEVEL: &str = "SLICER_PROFILE_LOG_LEVEL";
/// Env var: log format.
pub const ENV_LOG_FORMAT: &str = "SLICER_PROFILE_LOG_FORMAT";

const ENV_VARS: [&str; 4] = [ENV_ENGINE, ENV_PROFILE_ROOT, ENV_LOG_LEVEL, ENV_LOG_FORMAT];

/// Typed env-derived overrides for `ProfileConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileEnv {
    /// Override for `defaultEngine`.
    pub engine: Option<EngineKind>,
    /// Override for `profileRoot`.
    pub profile_root: Option<Box<str>>,
    /// Override for `logging.level`.
    pub log_level: Option<LogLevel>,
    /// Override for `logging.format`.
    pub log_format: Option<LogFormat>,
}

impl ProfileEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            engine: parse_optional_enum(map, ENV_ENGINE, |value| EngineKind::parse(value).ok())?,
            profile_root: parse_optional_trimmed_string(map, ENV_PROFILE_ROOT)?,
            log_level: parse_optional_enum(map, ENV_LOG_LEVEL, LogLevel::parse)?,
            log_format: parse_optional_enum(map, ENV_LOG_FORMAT, LogFormat::parse)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ENV_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }

        Self::from_map(&map)
    }

    /// True when no variable was set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.engine.is_none()
            && self.profile_root.is_none()
            && self.log_level.is_none()
            && self.log_format.is_none()
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: ProfileConfig,
    env: &ProfileEnv,
) -> Result<ValidatedProfileConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(engine) = env.engine {
        config.default_engine = Some(engine);
    }
    if let Some(root) = env.profile_root.as_deref() {
        config.profile_root = Some(root.into());
    }
    if let Some(level) = env.log_level {
        config.logging.level = level;
    }
    if let Some(format) = env.log_format {
        config.logging.format = format;
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidEnum { var, value } => {
                write!(formatter, "{var} has an unsupported value: {value}")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", value),
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_enum<T>(
    map: &BTreeMap<String, String>,
    var: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };

    parse(&raw).map(Some).ok_or_else(|| EnvParseError::InvalidEnum {
        var,
        value: raw.into_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn env_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn missing_vars_default_to_none() -> Result<(), Box<dyn Error>> {
        let env = ProfileEnv::from_map(&BTreeMap::new())?;
        assert!(env.is_empty());
        Ok(())
    }

    #[test]
    fn values_are_trimmed_and_parsed() -> Result<(), Box<dyn Error>> {
        let env = ProfileEnv::from_map(&env_map(&[
            (ENV_ENGINE, " SLIC3R "),
            (ENV_PROFILE_ROOT, " /srv/profiles "),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_FORMAT, "JSON"),
        ]))?;

        assert_eq!(env.engine, Some(EngineKind::Slic3r));
        assert_eq!(env.profile_root.as_deref(), Some("/srv/profiles"));
        assert_eq!(env.log_level, Some(LogLevel::Debug));
        assert_eq!(env.log_format, Some(LogFormat::Json));
        Ok(())
    }

    #[test]
    fn empty_values_fail() {
        let error = ProfileEnv::from_map(&env_map(&[(ENV_PROFILE_ROOT, "  ")])).err();
        assert_eq!(
            error,
            Some(EnvParseError::EmptyValue {
                var: ENV_PROFILE_ROOT
            })
        );
    }

    #[test]
    fn unknown_engine_reports_env_var() -> Result<(), Box<dyn Error>> {
        let error = ProfileEnv::from_map(&env_map(&[(ENV_ENGINE, "kisslicer")]))
            .err()
            .ok_or_else(|| std::io::Error::other("expected enum error"))?;
        let envelope: ErrorEnvelope = error.into();

        assert_eq!(envelope.code, ErrorCode::new("config", "invalid_env_enum"));
        assert_eq!(
            envelope.metadata.get("env_var").map(String::as_str),
            Some(ENV_ENGINE)
        );
        assert_eq!(
            envelope.metadata.get("value").map(String::as_str),
            Some("kisslicer")
        );
        Ok(())
    }

    #[test]
    fn env_wins_over_file_values() -> Result<(), Box<dyn Error>> {
        let mut base = ProfileConfig::default();
        base.default_engine = Some(EngineKind::Cura);
        base.logging.level = LogLevel::Error;

        let env = ProfileEnv::from_map(&env_map(&[
            (ENV_ENGINE, "PBCuraEngine"),
            (ENV_LOG_LEVEL, "trace"),
        ]))?;
        let config = apply_env_overrides(base, &env)?;

        assert_eq!(config.default_engine, Some(EngineKind::PbCuraEngine));
        assert_eq!(config.logging.level, LogLevel::Trace);
        assert_eq!(config.logging.format, LogFormat::Text);
        Ok(())
    }
}
