//! # slicer-profile-adapters
//!
//! Adapter implementations for ports (filesystem profile source, tracing logger).
//! This crate depends on `ports` and `shared`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod fs_profile_source;
pub mod tracing_logger;

pub use fs_profile_source::FsProfileSource;
pub use tracing_logger::TracingLogger;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
