//! # slicer-profile-shared
//!
//! Foundation types for the slicer-profile workspace:
//!
//! - [`ErrorEnvelope`] and [`ErrorCode`], the error shape every boundary returns
//! - [`Result`] and [`ResultExt`] for attaching context
//! - [`RequestContext`] and [`CancellationToken`] for superseding stale fetches
//!
//! This crate has no workspace dependencies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod concurrency;
pub mod errors;
pub mod result;

pub use concurrency::{CancellationToken, CorrelationId, RequestContext};
pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use result::{Result, ResultExt};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_crate_version_is_set() {
        assert!(!shared_crate_version().is_empty());
    }

    #[test]
    fn reexports_are_usable() {
        let value: Result<u8> = Err(ErrorEnvelope::expected(ErrorCode::invalid_input(), "x"));
        assert!(value.context("parse").is_err());
    }
}
