//! Core business logic for escola: the lifecycle/status engine.
//!
//! - [`status`]: the closed status vocabulary per entity kind
//! - [`guard`]: pure transition rules and payload requirements
//! - [`expiry`]: time-derived effective states
//! - [`aggregate`]: dashboard rollup math with one rounding policy
//! - [`tenancy`]: the school/chain boundary every call is scoped to
//! - [`services`]: the query/command boundary over the repositories

pub mod aggregate;
pub mod expiry;
pub mod guard;
pub mod services;
pub mod status;
pub mod tenancy;

pub use services::*;
pub use tenancy::TenantScope;

/// Generate a unique ID using ULID.
#[must_use]
pub fn generate_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}
