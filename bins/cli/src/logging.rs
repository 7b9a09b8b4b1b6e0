//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays machine-readable. `RUST_LOG` overrides
//! the configured level.

use slicer_profile_config::{LogFormat, LoggingConfig};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    let installed = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if let Err(error) = installed {
        let _ = writeln!(io::stderr(), "warning: tracing subscriber not installed: {error}");
    }
}
