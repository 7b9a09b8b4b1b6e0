//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod logging;

use clap::{Parser, Subcommand};
use commands::{
    FetchCommandInput, run_config_check, run_config_show, run_denormalize, run_fetch,
    run_normalize, run_options, run_roundtrip,
};
use error::{CliError, ExitCode, envelope_exit_code};
use format::{OutputArgs, OutputMode};
use slicer_profile_config::{
    LoggingConfig, ValidatedProfileConfig, load_profile_config_std_env,
};
use slicer_profile_domain::EngineKind;
use slicer_profile_shared::ErrorEnvelope;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "slicer-profile",
    version,
    about = "Slicer profile normalization and override tooling",
    long_about = None
)]
struct Cli {
    /// Config file path (JSON/TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert an engine profile document into the canonical form.
    Normalize {
        /// Engine the document belongs to (`cura`, `slic3r`, `PBCuraEngine`).
        #[arg(long)]
        engine: Option<EngineKind>,
        /// Input file (defaults to stdin).
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Write a canonical profile back in an engine's shape.
    Denormalize {
        /// Target engine (defaults to the profile's own engine).
        #[arg(long)]
        engine: Option<EngineKind>,
        /// Input file (defaults to stdin).
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Normalize then denormalize a document and report what changed.
    Roundtrip {
        /// Engine the document belongs to.
        #[arg(long)]
        engine: Option<EngineKind>,
        /// Input file (defaults to stdin).
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// List the legal values of an enumerated setting.
    Options {
        /// Setting key (for example `support`).
        #[arg(long)]
        key: String,
    },
    /// Load a stored profile through an overrides session and print its submission.
    Fetch {
        /// Engine of the stored profile.
        #[arg(long)]
        engine: Option<EngineKind>,
        /// Profile name.
        #[arg(long)]
        profile: String,
        /// Profile store root (defaults to `profileRoot` from config).
        #[arg(long)]
        root: Option<PathBuf>,
        /// Field edit applied before submission, as `key=value` (repeatable).
        #[arg(long = "set", value_name = "KEY=VALUE")]
        edits: Vec<String>,
    },
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config after file and env merging.
    Show,
    /// Validate the effective config.
    Check,
}

pub(crate) struct CliOutput {
    stdout: String,
    exit_code: ExitCode,
}

impl CliOutput {
    pub(crate) const fn ok(stdout: String) -> Self {
        Self {
            stdout,
            exit_code: ExitCode::Ok,
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    let config = match load_profile_config_std_env(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            logging::init_tracing(&LoggingConfig::default());
            return finish(Ok(format_error_output(mode, &error)));
        },
    };
    logging::init_tracing(&config.logging);

    let result = match run(&cli.command, mode, &config, cli.config.as_deref()) {
        Err(CliError::Envelope(error)) => Ok(format_error_output(mode, &error)),
        other => other,
    };
    finish(result)
}

fn finish(result: Result<CliOutput, CliError>) -> std::process::ExitCode {
    match result {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(
    command: &Commands,
    mode: OutputMode,
    config: &ValidatedProfileConfig,
    config_path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    tracing::debug!(command = command_name(command), "running command");
    match command {
        Commands::Normalize { engine, input } => {
            run_normalize(mode, config, *engine, input.as_deref())
        },
        Commands::Denormalize { engine, input } => {
            run_denormalize(mode, config, *engine, input.as_deref())
        },
        Commands::Roundtrip { engine, input } => {
            run_roundtrip(mode, config, *engine, input.as_deref())
        },
        Commands::Options { key } => run_options(mode, key),
        Commands::Fetch {
            engine,
            profile,
            root,
            edits,
        } => run_fetch(
            mode,
            config,
            FetchCommandInput {
                engine: *engine,
                profile,
                root: root.as_deref(),
                edits,
            },
        ),
        Commands::Config { command } => match command {
            ConfigCommands::Show => run_config_show(mode, config, config_path),
            ConfigCommands::Check => run_config_check(mode, config, config_path),
        },
    }
}

const fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Normalize { .. } => "normalize",
        Commands::Denormalize { .. } => "denormalize",
        Commands::Roundtrip { .. } => "roundtrip",
        Commands::Options { .. } => "options",
        Commands::Fetch { .. } => "fetch",
        Commands::Config { .. } => "config",
    }
}

fn format_error_output(mode: OutputMode, error: &ErrorEnvelope) -> CliOutput {
    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": error,
        });
        // A CLI boundary: serialization failures fall back to a fixed payload.
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        format_error_text(error)
    };

    CliOutput {
        stdout,
        exit_code: envelope_exit_code(error),
    }
}

fn format_error_text(error: &ErrorEnvelope) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&error.code.to_string());
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    out.push_str("kind: ");
    out.push_str(&error.kind.to_string());
    out.push('\n');
    for (key, value) in &error.metadata {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
