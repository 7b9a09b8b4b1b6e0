//! # slicer-profile-ports
//!
//! Port traits for the slicer-profile hexagonal architecture.
//!
//! This crate defines the interfaces between the application layer and
//! infrastructure. It depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod logger;
pub mod profile_source;

pub use logger::*;
pub use profile_source::*;

// Re-export domain types used in port signatures, so adapter crates can
// implement ports without directly depending on `slicer-profile-domain`.
pub use slicer_profile_domain::EngineKind;
