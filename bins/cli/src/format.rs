//! Output format helpers for CLI commands.

use clap::{Args, ValueEnum};
use serde_json::Value;
use slicer_profile_domain::OverrideReport;

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text output.
    Text,
    /// Machine-friendly JSON output.
    Json,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
}

impl OutputMode {
    /// Build output mode from CLI flags.
    #[must_use]
    pub fn from_args(args: &OutputArgs) -> Self {
        Self {
            format: args.output.unwrap_or(OutputFormat::Text),
        }
    }

    /// Returns true when JSON output is requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

/// Pretty JSON with a trailing newline.
pub fn pretty_json(payload: &Value) -> Result<String, serde_json::Error> {
    let mut output = serde_json::to_string_pretty(payload)?;
    output.push('\n');
    Ok(output)
}

/// `key = value` lines, indented under a heading.
pub fn push_value_lines<'a>(
    out: &mut String,
    heading: &str,
    values: impl IntoIterator<Item = (&'a str, &'a Value)>,
) {
    out.push_str(heading);
    out.push_str(":\n");
    for (key, value) in values {
        out.push_str("  ");
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(&value.to_string());
        out.push('\n');
    }
}

/// One `override:` line per fired rule, then one `conflict:` line per contested key.
pub fn push_override_lines(out: &mut String, report: &OverrideReport) {
    for applied in report.applied() {
        out.push_str("override: rule ");
        out.push_str(&applied.rule_index.to_string());
        out.push_str(" (");
        out.push_str(&applied.trigger_key);
        out.push_str(") forced ");
        out.push_str(&applied.forced_keys.join(", "));
        out.push('\n');
    }
    for key in report.conflicting_keys() {
        out.push_str("conflict: ");
        out.push_str(key);
        out.push('\n');
    }
}
