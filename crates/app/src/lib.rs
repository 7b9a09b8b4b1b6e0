//! # slicer-profile-app
//!
//! Application use cases for editing slicer profile overrides.
//! This crate depends on `ports`, `domain`, and `shared`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod error;
pub mod overrides_session;

pub use error::SessionError;
pub use overrides_session::{
    FetchOutcome, OverridesSession, OverridesSessionDeps, ProfileSummary, SUBMISSION_KEY_PREFIX,
    Submission, settings_document,
};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
