//! Config command handlers.

use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, pretty_json};
use slicer_profile_config::{ValidatedProfileConfig, to_pretty_toml};
use std::path::Path;

/// Print the effective config.
pub fn run_config_show(
    mode: OutputMode,
    config: &ValidatedProfileConfig,
    config_path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "configPath": config_path.map(|path| path.to_string_lossy().to_string()),
            "effectiveConfig": config.as_ref(),
        }))?
    } else {
        to_pretty_toml(config.as_ref())?
    };
    Ok(CliOutput::ok(stdout))
}

/// Report that the effective config loaded and validated.
///
/// Invalid configs never reach this handler; loading fails first.
pub fn run_config_check(
    mode: OutputMode,
    config: &ValidatedProfileConfig,
    config_path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let rules = config.rule_table().len();
    let stdout = if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "configPath": config_path.map(|path| path.to_string_lossy().to_string()),
            "rules": rules,
        }))?
    } else {
        format!("status: ok\nconfig: ok\nrules: {rules}\n")
    };
    Ok(CliOutput::ok(stdout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;
    use slicer_profile_config::ProfileConfig;

    #[test]
    fn default_config_counts_builtin_rules() -> Result<(), Box<dyn std::error::Error>> {
        let config = ProfileConfig::default().validate_and_normalize()?;
        let output = run_config_check(
            OutputMode {
                format: OutputFormat::Text,
            },
            &config,
            None,
        )?;
        assert_eq!(output.stdout, "status: ok\nconfig: ok\nrules: 1\n");
        Ok(())
    }
}
