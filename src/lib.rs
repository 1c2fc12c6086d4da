//! # Stelace Gate
//!
//! A multi-tenant permission and data-visibility gateway guarding resource
//! APIs. For every inbound request it determines, from a heterogeneous set
//! of credential types, which permissions the caller holds, which data
//! namespaces it may read or write, and whether the requested operation is
//! authorized.
//!
//! ## Features
//!
//! - **Credential schemes**: `Basic` (legacy API-key transport), `Bearer`,
//!   and `Stelace-v1` (API key and token in one header)
//! - **Ordered credential sources**: system bypass, workflow bypass, secret
//!   API key, user token, anonymous; first match wins
//! - **Plan gating**: subscription plans withhold nominally-granted
//!   permissions, reported instead of silently dropped
//! - **Organization overrides**: membership roles narrowed by the
//!   organization's own allowed roles, never widened
//! - **Namespace redaction**: `_<namespace>`-tagged `metadata` /
//!   `platformData` keys filtered per caller on both reads and writes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use actix_web::{App, web};
//! use stelace_gate::auth::{PermissionGate, SecurityContext, Services};
//! use stelace_gate::server::CheckPermissions;
//! use stelace_gate::Config;
//! use std::sync::Arc;
//!
//! fn app(services: Services) -> Result<(), stelace_gate::GatewayError> {
//!     let config = Config::from_env()?;
//!     let security = Arc::new(SecurityContext::new(&config.security));
//!     let gate = web::Data::new(PermissionGate::new(services, security, &config.auth));
//!
//!     let _app = App::new().app_data(gate).service(
//!         web::resource("/assets")
//!             .wrap(CheckPermissions::new(["asset:create:all"]))
//!             .route(web::post().to(|| async { "created" })),
//!     );
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

// Public module exports
pub mod auth;
pub mod config;
pub mod expose;
pub mod server;
pub mod utils;

// Re-export main types
pub use auth::{
    AccessGrant, AccessInfo, CheckOptions, CredentialSource, GateRequest,
    PermissionGate, SecurityContext, Services,
};
pub use config::Config;
pub use expose::{Exposable, ExposeOptions, expose, expose_all};
pub use utils::error::{GatewayError, Result};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
