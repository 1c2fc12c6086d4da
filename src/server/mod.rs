//! HTTP boundary
//!
//! Only the middleware wiring lives here; route handlers belong to the
//! downstream resource services.

pub mod middleware;

pub use middleware::{CheckPermissions, get_access_grant};
