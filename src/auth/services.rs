//! External collaborator interfaces
//!
//! The gate never stores roles, permissions, keys or plans itself; it calls
//! out to these services on every request. Transient collaborator failures
//! propagate as request failures, retry policy belongs to the collaborator's
//! own transport.

use crate::auth::types::{ApiKey, Organization, Plan};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

/// Permissions granted to a set of roles, after plan filtering
#[derive(Debug, Clone, Default)]
pub struct GrantedPermissions {
    /// Granted-by-role map, keyed by permission
    pub granted_permissions: HashMap<String, bool>,
    /// Permissions a role nominally grants but the plan withholds
    pub missing_plan_permissions: Vec<String>,
}

/// Namespaces inherited by a set of roles, parent chains included
#[derive(Debug, Clone, Default)]
pub struct RoleNamespaces {
    /// Namespaces the roles can read
    pub read_namespaces: Vec<String>,
    /// Namespaces the roles can edit
    pub edit_namespaces: Vec<String>,
}

/// Membership lookup failure discrimination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipErrors {
    /// The user id did not resolve
    pub user_not_found: bool,
    /// The organization id did not resolve
    pub organization_not_found: bool,
}

/// Result of an organization membership check
#[derive(Debug, Clone, Default)]
pub struct OrganizationMembership {
    /// Roles held through the membership
    pub roles: Vec<String>,
    /// The organization, when resolved
    pub organization: Option<Organization>,
    /// Canonical organization id (the supplied id may be an alias)
    pub real_organization_id: Option<String>,
    /// Whether the user is a member
    pub is_org_member: bool,
    /// Which party failed to resolve, if any
    pub errors: MembershipErrors,
}

/// Authentication collaborator: per-platform signing secrets
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthenticationService: Send + Sync {
    /// Signing secret for one platform and environment
    async fn get_auth_secret(&self, platform_id: &str, env: &str) -> Result<String>;
}

/// Authorization collaborator: role grants and plan gating
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    /// Permissions the roles grant among `permissions_to_check`, with the
    /// plan shortfall reported separately
    async fn get_granted_permissions<'a>(
        &self,
        roles: &[String],
        permissions_to_check: &[String],
        plan: Option<&'a Plan>,
        platform_id: &str,
        env: &str,
    ) -> Result<GrantedPermissions>;

    /// Subset of `permissions` the plan actually allows
    async fn filter_permissions_by_plan<'a>(
        &self,
        permissions: &[String],
        plan: Option<&'a Plan>,
        platform_id: &str,
        env: &str,
    ) -> Result<Vec<String>>;
}

/// Role collaborator: namespace inheritance
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoleService: Send + Sync {
    /// Read/edit namespaces accumulated over the roles and their parent
    /// chains
    async fn get_namespaces(
        &self,
        role_values: &[String],
        platform_id: &str,
        env: &str,
    ) -> Result<RoleNamespaces>;
}

/// User collaborator: organization membership
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Membership check for one user against one organization
    async fn is_organization_member(
        &self,
        platform_id: &str,
        env: &str,
        user_id: &str,
        organization_id: &str,
    ) -> Result<OrganizationMembership>;
}

/// API key store
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Resolve a raw key; `None` when unknown
    async fn get_api_key(
        &self,
        raw_key: &str,
        platform_id: &str,
        env: &str,
    ) -> Result<Option<ApiKey>>;
}

/// Handles to every collaborator the gate calls on
#[derive(Clone)]
pub struct Services {
    /// Authentication collaborator
    pub authentication: Arc<dyn AuthenticationService>,
    /// Authorization collaborator
    pub authorization: Arc<dyn AuthorizationService>,
    /// Role collaborator
    pub roles: Arc<dyn RoleService>,
    /// User collaborator
    pub users: Arc<dyn UserService>,
    /// API key store
    pub api_keys: Arc<dyn ApiKeyStore>,
}
