//! Options command handler.

use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, pretty_json};
use slicer_profile_domain::catalog;
use slicer_profile_shared::ErrorEnvelope;

/// Run the options command.
pub fn run_options(mode: OutputMode, key: &str) -> Result<CliOutput, CliError> {
    let values = catalog().enum_values_of(key).map_err(ErrorEnvelope::from)?;

    let stdout = if mode.is_json() {
        pretty_json(&serde_json::json!({
            "status": "ok",
            "key": key,
            "options": values,
        }))?
    } else {
        let mut out = format!("status: ok\nkey: {key}\noptions:\n");
        for value in values {
            out.push_str("  ");
            out.push_str(value);
            out.push('\n');
        }
        out
    };
    Ok(CliOutput::ok(stdout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;

    #[test]
    fn lists_values_in_display_order() -> Result<(), CliError> {
        let output = run_options(
            OutputMode {
                format: OutputFormat::Text,
            },
            "platform_adhesion",
        )?;
        assert_eq!(
            output.stdout,
            "status: ok\nkey: platform_adhesion\noptions:\n  none\n  brim\n  raft\n"
        );
        Ok(())
    }

    #[test]
    fn scalar_key_is_not_enumerated() {
        let output = run_options(
            OutputMode {
                format: OutputFormat::Json,
            },
            "layer_height",
        );
        assert!(matches!(output, Err(CliError::Envelope(_))));
    }
}
