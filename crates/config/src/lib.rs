//! # slicer-profile-config
//!
//! Configuration schema, validation, and loading for the profile tooling.
//! This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{
    ENV_ENGINE, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_PROFILE_ROOT, EnvParseError, ProfileEnv,
    apply_env_overrides,
};
pub use load::{
    load_profile_config_from_path, load_profile_config_std_env, to_pretty_json, to_pretty_toml,
};
pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, FORCED_RULES_MAX, ForcedRuleConfig,
    ForcedSettingsConfig, LogFormat, LogLevel, LoggingConfig, ProfileConfig,
    ValidatedProfileConfig, parse_profile_config_json, parse_profile_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
