//! CLI command handlers.

pub mod config;
pub mod fetch;
pub mod options;
pub mod transform;

pub use config::{run_config_check, run_config_show};
pub use fetch::{FetchCommandInput, run_fetch};
pub use options::run_options;
pub use transform::{run_denormalize, run_normalize, run_roundtrip};
