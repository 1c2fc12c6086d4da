//! HTTP middleware

pub mod auth;
pub mod helpers;

pub use auth::{CheckPermissions, get_access_grant};
pub use helpers::{RequestPlan, SystemHash};
