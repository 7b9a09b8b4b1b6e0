//! Profile tooling configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Configured forced-setting rules are compiled into an `OverrideRuleTable`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slicer_profile_domain::{EngineKind, OverrideRule, OverrideRuleTable, json_type_name};
use slicer_profile_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Maximum number of configured forced-setting rules.
pub const FORCED_RULES_MAX: usize = 64;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ProfileConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Engine assumed when a command does not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_engine: Option<EngineKind>,
    /// Root directory of the filesystem profile source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_root: Option<Box<str>>,
    /// Forced-setting rules applied on submission.
    pub forced_settings: ForcedSettingsConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            default_engine: None,
            profile_root: None,
            forced_settings: ForcedSettingsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProfileConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedProfileConfig, ConfigSchemaError> {
        self.validate_version()?;
        normalize_optional_trimmed(&mut self.profile_root);
        self.forced_settings.normalize();
        let rules = self.forced_settings.validate_and_compile()?;

        Ok(ValidatedProfileConfig { raw: self, rules })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }
}

/// Validated config wrapper carrying the compiled rule table.
#[derive(Debug, Clone)]
pub struct ValidatedProfileConfig {
    raw: ProfileConfig,
    rules: OverrideRuleTable,
}

impl ValidatedProfileConfig {
    /// Rule table used on submission: built-in rules first (unless disabled),
    /// then configured rules in file order.
    #[must_use]
    pub const fn rule_table(&self) -> &OverrideRuleTable {
        &self.rules
    }

    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &ProfileConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> ProfileConfig {
        self.raw
    }
}

impl AsRef<ProfileConfig> for ValidatedProfileConfig {
    fn as_ref(&self) -> &ProfileConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedProfileConfig {
    type Target = ProfileConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Parse a config from a JSON string, applying validation and normalization.
pub fn parse_profile_config_json(input: &str) -> Result<ValidatedProfileConfig, ErrorEnvelope> {
    let config: ProfileConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a config from a TOML string, applying validation and normalization.
pub fn parse_profile_config_toml(input: &str) -> Result<ValidatedProfileConfig, ErrorEnvelope> {
    let config: ProfileConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Forced-setting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ForcedSettingsConfig {
    /// Keep the built-in spiral vase rule ahead of configured rules.
    pub include_defaults: bool,
    /// Additional rules, evaluated in order after the built-in ones.
    pub rules: Vec<ForcedRuleConfig>,
}

impl Default for ForcedSettingsConfig {
    fn default() -> Self {
        Self {
            include_defaults: true,
            rules: Vec::new(),
        }
    }
}

impl ForcedSettingsConfig {
    fn normalize(&mut self) {
        for rule in &mut self.rules {
            normalize_boxed_str(&mut rule.trigger_key);
            rule.overrides = std::mem::take(&mut rule.overrides)
                .into_iter()
                .map(|(key, value)| (key.trim().to_string(), value))
                .collect();
        }
    }

    fn validate_and_compile(&self) -> Result<OverrideRuleTable, ConfigSchemaError> {
        if self.rules.len() > FORCED_RULES_MAX {
            return Err(ConfigSchemaError::ListTooLarge {
                section: "forcedSettings",
                field: "rules",
                len: self.rules.len(),
                max: FORCED_RULES_MAX,
            });
        }

        let mut table = if self.include_defaults {
            OverrideRuleTable::builtin()
        } else {
            OverrideRuleTable::empty()
        };
        for (index, rule) in self.rules.iter().enumerate() {
            table.push(rule.compile(index)?);
        }
        Ok(table)
    }
}

/// A configured rule: when `triggerKey` loosely equals `triggerValue`,
/// every entry of `overrides` is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForcedRuleConfig {
    /// Document key tested by the rule.
    pub trigger_key: Box<str>,
    /// Scalar compared against the trigger key's value.
    pub trigger_value: Value,
    /// Settings forced when the rule fires, written in key order.
    pub overrides: BTreeMap<String, Value>,
}

impl ForcedRuleConfig {
    fn compile(&self, index: usize) -> Result<OverrideRule, ConfigSchemaError> {
        if self.trigger_key.is_empty() {
            return Err(ConfigSchemaError::InvalidForcedRule {
                index,
                field: "triggerKey",
                reason: "must be non-empty".to_string(),
            });
        }
        if !is_scalar(&self.trigger_value) {
            return Err(ConfigSchemaError::InvalidForcedRule {
                index,
                field: "triggerValue",
                reason: format!(
                    "must be a string, number, or boolean (got {})",
                    json_type_name(&self.trigger_value)
                ),
            });
        }
        if self.overrides.is_empty() {
            return Err(ConfigSchemaError::InvalidForcedRule {
                index,
                field: "overrides",
                reason: "must contain at least one setting".to_string(),
            });
        }

        let mut rule = OverrideRule::new(self.trigger_key.as_ref(), self.trigger_value.clone());
        for (key, value) in &self.overrides {
            if key.is_empty() {
                return Err(ConfigSchemaError::InvalidForcedRule {
                    index,
                    field: "overrides",
                    reason: "setting keys must be non-empty".to_string(),
                });
            }
            if value.is_null() {
                return Err(ConfigSchemaError::InvalidForcedRule {
                    index,
                    field: "overrides",
                    reason: format!("value for `{key}` must not be null"),
                });
            }
            rule = rule.force(key.as_str(), value.clone());
        }
        Ok(rule)
    }
}

/// Minimum level of emitted log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Debug and above.
    Debug,
    /// Info and above.
    #[default]
    Info,
    /// Warnings and errors.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Lowercase name, usable as a filter directive.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parse a level name (ASCII case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Parse a format name (ASCII case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Minimum level.
    pub level: LogLevel,
    /// Line encoding.
    pub format: LogFormat,
}

/// Typed validation errors for the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A list field exceeds the maximum allowed size.
    ListTooLarge {
        /// Schema section (e.g. `forcedSettings`).
        section: &'static str,
        /// Field name in the config file (e.g. `rules`).
        field: &'static str,
        /// Number of entries.
        len: usize,
        /// Maximum allowed number of entries.
        max: usize,
    },
    /// A forced-setting rule is malformed.
    InvalidForcedRule {
        /// Position of the rule in `forcedSettings.rules`.
        index: usize,
        /// Field name within the rule.
        field: &'static str,
        /// Human readable reason.
        reason: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::ListTooLarge { .. } => ErrorCode::new("config", "list_too_large"),
            Self::InvalidForcedRule { .. } => ErrorCode::new("config", "invalid_forced_rule"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::ListTooLarge {
                section,
                field,
                len,
                max,
            } => write!(
                formatter,
                "{section}.{field} must have at most {max} entries (got {len})"
            ),
            Self::InvalidForcedRule {
                index,
                field,
                reason,
            } => write!(
                formatter,
                "forcedSettings.rules[{index}].{field} {reason}"
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => {
                envelope = envelope
                    .with_metadata("found", found.to_string())
                    .with_metadata("supported", supported.to_string());
            },
            ConfigSchemaError::ListTooLarge {
                section,
                field,
                len,
                max,
            } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field)
                    .with_metadata("len", len.to_string())
                    .with_metadata("max", max.to_string());
            },
            ConfigSchemaError::InvalidForcedRule {
                index,
                field,
                reason,
            } => {
                envelope = envelope
                    .with_metadata("section", "forcedSettings")
                    .with_metadata("field", field)
                    .with_metadata("index", index.to_string())
                    .with_metadata("reason", reason);
            },
        }

        envelope
    }
}

const fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

fn normalize_optional_trimmed(value: &mut Option<Box<str>>) {
    let Some(raw) = value.take() else {
        return;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        *value = None;
    } else {
        *value = Some(trimmed.to_owned().into_boxed_str());
    }
}

fn normalize_boxed_str(value: &mut Box<str>) {
    let trimmed = value.trim();
    if trimmed == value.as_ref() {
        return;
    }
    *value = trimmed.to_owned().into_boxed_str();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error;

    #[test]
    fn defaults_are_applied() -> Result<(), Box<dyn Error>> {
        let config = parse_profile_config_json("{}")?;

        assert_eq!(config.version, CURRENT_CONFIG_VERSION);
        assert_eq!(config.default_engine, None);
        assert!(config.forced_settings.include_defaults);
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.rule_table(), &OverrideRuleTable::builtin());
        Ok(())
    }

    #[test]
    fn unsupported_version_is_rejected() -> Result<(), Box<dyn Error>> {
        let error = parse_profile_config_json(r#"{"version": 2}"#)
            .err()
            .ok_or_else(|| std::io::Error::other("expected version error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "unsupported_version"));
        assert_eq!(error.metadata.get("found").map(String::as_str), Some("2"));
        Ok(())
    }

    #[test]
    fn configured_rules_follow_builtin_rules() -> Result<(), Box<dyn Error>> {
        let payload = json!({
            "forcedSettings": {
                "rules": [{
                    "triggerKey": " support ",
                    "triggerValue": "none",
                    "overrides": { "support_material": 0 }
                }]
            }
        });
        let config = parse_profile_config_json(&payload.to_string())?;
        let rules = config.rule_table().rules();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].trigger_key(), "spiral_vase");
        assert_eq!(rules[1].trigger_key(), "support");
        assert_eq!(rules[1].trigger_value(), &json!("none"));
        Ok(())
    }

    #[test]
    fn builtin_rules_can_be_disabled() -> Result<(), Box<dyn Error>> {
        let payload = json!({ "forcedSettings": { "includeDefaults": false } });
        let config = parse_profile_config_json(&payload.to_string())?;
        assert!(config.rule_table().is_empty());
        Ok(())
    }

    #[test]
    fn non_scalar_trigger_values_are_rejected() -> Result<(), Box<dyn Error>> {
        let payload = json!({
            "forcedSettings": {
                "rules": [{
                    "triggerKey": "spiral_vase",
                    "triggerValue": [1],
                    "overrides": { "perimeters": 1 }
                }]
            }
        });
        let error = parse_profile_config_json(&payload.to_string())
            .err()
            .ok_or_else(|| std::io::Error::other("expected rule error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "invalid_forced_rule"));
        assert_eq!(
            error.metadata.get("field").map(String::as_str),
            Some("triggerValue")
        );
        assert_eq!(error.metadata.get("index").map(String::as_str), Some("0"));
        Ok(())
    }

    #[test]
    fn rules_without_overrides_are_rejected() -> Result<(), Box<dyn Error>> {
        let payload = json!({
            "forcedSettings": {
                "rules": [{ "triggerKey": "cooling", "triggerValue": 1, "overrides": {} }]
            }
        });
        let error = parse_profile_config_json(&payload.to_string())
            .err()
            .ok_or_else(|| std::io::Error::other("expected rule error"))?;
        assert_eq!(
            error.metadata.get("field").map(String::as_str),
            Some("overrides")
        );
        Ok(())
    }

    #[test]
    fn rule_count_is_bounded() -> Result<(), Box<dyn Error>> {
        let rules: Vec<_> = (0..=FORCED_RULES_MAX)
            .map(|idx| {
                json!({
                    "triggerKey": format!("key{idx}"),
                    "triggerValue": 1,
                    "overrides": { "perimeters": 1 }
                })
            })
            .collect();
        let payload = json!({ "forcedSettings": { "rules": rules } });
        let error = parse_profile_config_json(&payload.to_string())
            .err()
            .ok_or_else(|| std::io::Error::other("expected list size error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "list_too_large"));
        Ok(())
    }

    #[test]
    fn blank_profile_root_is_dropped() -> Result<(), Box<dyn Error>> {
        let config = parse_profile_config_json(r#"{"profileRoot": "   "}"#)?;
        assert_eq!(config.profile_root, None);
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = parse_profile_config_json(r#"{"slicer": "cura"}"#);
        assert!(matches!(
            result.err().map(|error| error.code),
            Some(code) if code == ErrorCode::new("config", "invalid_json")
        ));
    }

    #[test]
    fn log_names_parse_case_insensitively() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), None);
        assert_eq!(LogFormat::parse(" Json "), Some(LogFormat::Json));
    }
}
