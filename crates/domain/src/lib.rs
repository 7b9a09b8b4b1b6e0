//! # slicer-profile-domain
//!
//! Engine-agnostic slicer profile model and the transforms around it.
//!
//! - **Engine** - `EngineKind`, `SchemaMode`
//! - **Catalog** - `FieldCatalog`, `FieldCategory`
//! - **Profile** - `CanonicalProfile`, `BooleanEncoding`, `RawDocument`
//! - **Transforms** - `normalize`, `denormalize`
//! - **Overrides** - `OverrideRule`, `OverrideRuleTable`, `apply_overrides`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use slicer_profile_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod catalog;
pub mod denormalize;
pub mod engine;
pub mod error;
pub mod loose;
pub mod normalize;
pub mod overrides;
pub mod profile;

pub use catalog::{ESCAPED_NEWLINE_KEYS, EnumField, FieldCatalog, FieldCategory, catalog};
pub use denormalize::{Denormalized, denormalize, denormalize_with_report};
pub use engine::{EngineKind, SchemaMode};
pub use error::ProfileError;
pub use loose::{is_truthy, loose_eq};
pub use normalize::normalize;
pub use overrides::{
    AppliedOverride, ForcedSetting, OverrideReport, OverrideRule, OverrideRuleTable,
    apply_overrides, spiral_vase_rule,
};
pub use profile::{
    BooleanEncoding, CanonicalProfile, RawDocument, into_raw_document, json_type_name,
    raw_document,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
