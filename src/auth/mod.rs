//! Authentication and authorization system
//!
//! Everything between a raw `Authorization` header and an [`AccessGrant`]
//! attached to the request: credential parsing, token verification, access
//! info resolution, the permission gate and the request-data namespace
//! guard. All role, permission, key and plan storage lives behind the
//! collaborator traits in [`services`].

pub mod access;
pub mod api_key;
pub mod credentials;
pub mod gate;
pub mod namespaces;
pub mod request_data;
pub mod security;
pub mod services;
pub mod token;
pub mod types;


pub use access::{AccessInfo, AccessParams, compute_access_info};
pub use credentials::{credential_from_headers, parse_authorization_header};
pub use gate::{
    AccessGrant, CheckOptions, CredentialSource, GateRequest, PLATFORM_DATA_EDIT_ALL,
    PUBLIC_ROLE, PermissionGate,
};
pub use request_data::{RequestDataParams, check_request_data};
pub use security::{SecurityContext, SystemHashFn};
pub use services::{
    ApiKeyStore, AuthenticationService, AuthorizationService, GrantedPermissions,
    MembershipErrors, OrganizationMembership, RoleNamespaces, RoleService, Services,
    UserService,
};
pub use token::{TokenVerifier, VerifiedToken};
pub use types::{ApiKey, Claims, Credential, Organization, Plan, Role};
