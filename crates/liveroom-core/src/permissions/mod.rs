//! Entitlements and the host-only operations that change them.

mod engine;
mod types;

pub use engine::{EntitlementChange, PermissionEngine};
pub use types::{Entitlement, EntitlementState};
