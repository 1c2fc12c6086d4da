//! Shared test infrastructure: in-memory collaborator implementations

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stelace_gate::GatewayError;
use stelace_gate::auth::{
    ApiKey, ApiKeyStore, AuthenticationService, AuthorizationService,
    GrantedPermissions, MembershipErrors, Organization, OrganizationMembership, Plan,
    Role, RoleNamespaces, RoleService, Services, UserService,
};

pub const PLATFORM_ID: &str = "1";
pub const ENV: &str = "test";
pub const PLATFORM_SECRET: &str = "integration-platform-secret";

/// Authentication collaborator with one secret per platform/env
pub struct InMemoryAuthentication {
    pub secrets: HashMap<String, String>,
}

impl InMemoryAuthentication {
    pub fn single(platform_id: &str, env: &str, secret: &str) -> Self {
        let mut secrets = HashMap::new();
        secrets.insert(format!("{}:{}", platform_id, env), secret.to_string());
        Self { secrets }
    }
}

#[async_trait]
impl AuthenticationService for InMemoryAuthentication {
    async fn get_auth_secret(
        &self,
        platform_id: &str,
        env: &str,
    ) -> stelace_gate::Result<String> {
        self.secrets
            .get(&format!("{}:{}", platform_id, env))
            .cloned()
            .ok_or_else(|| GatewayError::external("Unknown platform"))
    }
}

/// Authorization collaborator resolving grants from a role-permission table
/// and gating them by the plan's `allPermissions` list
pub struct InMemoryAuthorization {
    pub role_permissions: HashMap<String, Vec<String>>,
}

impl InMemoryAuthorization {
    fn plan_allowed(plan: Option<&Plan>) -> Option<Vec<String>> {
        plan.and_then(|plan| plan.get("allPermissions"))
            .and_then(|value| value.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|value| value.as_str().map(str::to_string))
                    .collect()
            })
    }
}

#[async_trait]
impl AuthorizationService for InMemoryAuthorization {
    async fn get_granted_permissions<'a>(
        &self,
        roles: &[String],
        permissions_to_check: &[String],
        plan: Option<&'a Plan>,
        _platform_id: &str,
        _env: &str,
    ) -> stelace_gate::Result<GrantedPermissions> {
        let plan_allowed = Self::plan_allowed(plan);
        let mut granted = GrantedPermissions::default();

        for permission in permissions_to_check {
            let granted_by_role = roles.iter().any(|role| {
                self.role_permissions
                    .get(role)
                    .map(|permissions| permissions.iter().any(|p| p == permission))
                    .unwrap_or(false)
            });
            if !granted_by_role {
                continue;
            }

            match &plan_allowed {
                Some(allowed) if !allowed.contains(permission) => {
                    granted.missing_plan_permissions.push(permission.clone());
                }
                _ => {
                    granted.granted_permissions.insert(permission.clone(), true);
                }
            }
        }

        Ok(granted)
    }

    async fn filter_permissions_by_plan<'a>(
        &self,
        permissions: &[String],
        plan: Option<&'a Plan>,
        _platform_id: &str,
        _env: &str,
    ) -> stelace_gate::Result<Vec<String>> {
        match Self::plan_allowed(plan) {
            Some(allowed) => Ok(permissions
                .iter()
                .filter(|permission| allowed.contains(permission))
                .cloned()
                .collect()),
            None => Ok(permissions.to_vec()),
        }
    }
}

/// Role collaborator walking parent chains to accumulate namespaces
pub struct InMemoryRoles {
    pub roles: HashMap<String, Role>,
}

#[async_trait]
impl RoleService for InMemoryRoles {
    async fn get_namespaces(
        &self,
        role_values: &[String],
        _platform_id: &str,
        _env: &str,
    ) -> stelace_gate::Result<RoleNamespaces> {
        let mut namespaces = RoleNamespaces::default();
        let mut visited = HashSet::new();

        let mut pending: Vec<&str> = role_values.iter().map(String::as_str).collect();
        while let Some(value) = pending.pop() {
            if !visited.insert(value.to_string()) {
                continue;
            }
            let Some(role) = self.roles.get(value) else {
                continue;
            };
            for ns in &role.read_namespaces {
                if !namespaces.read_namespaces.contains(ns) {
                    namespaces.read_namespaces.push(ns.clone());
                }
            }
            for ns in &role.edit_namespaces {
                if !namespaces.edit_namespaces.contains(ns) {
                    namespaces.edit_namespaces.push(ns.clone());
                }
            }
            if let Some(parent) = role.parent_id.as_deref() {
                pending.push(parent);
            }
        }

        Ok(namespaces)
    }
}

/// User collaborator with a static membership table
pub struct InMemoryUsers {
    pub users: HashSet<String>,
    pub organizations: HashMap<String, Organization>,
    pub memberships: HashMap<(String, String), Vec<String>>,
}

#[async_trait]
impl UserService for InMemoryUsers {
    async fn is_organization_member(
        &self,
        _platform_id: &str,
        _env: &str,
        user_id: &str,
        organization_id: &str,
    ) -> stelace_gate::Result<OrganizationMembership> {
        let mut membership = OrganizationMembership::default();

        if !self.users.contains(user_id) {
            membership.errors = MembershipErrors {
                user_not_found: true,
                organization_not_found: false,
            };
            return Ok(membership);
        }

        let Some(organization) = self.organizations.get(organization_id) else {
            membership.errors = MembershipErrors {
                user_not_found: false,
                organization_not_found: true,
            };
            return Ok(membership);
        };

        let key = (user_id.to_string(), organization_id.to_string());
        if let Some(roles) = self.memberships.get(&key) {
            membership.roles = roles.clone();
            membership.is_org_member = true;
            membership.real_organization_id = Some(organization.id.clone());
            membership.organization = Some(organization.clone());
        }

        Ok(membership)
    }
}

/// API key store backed by a map of canonical keys
pub struct InMemoryApiKeys {
    pub keys: HashMap<String, ApiKey>,
}

#[async_trait]
impl ApiKeyStore for InMemoryApiKeys {
    async fn get_api_key(
        &self,
        raw_key: &str,
        _platform_id: &str,
        _env: &str,
    ) -> stelace_gate::Result<Option<ApiKey>> {
        Ok(self.keys.get(raw_key).cloned())
    }
}

pub fn role(value: &str, parent: Option<&str>, read: &[&str], edit: &[&str]) -> Role {
    Role {
        id: format!("role_{}", value),
        value: value.to_string(),
        parent_id: parent.map(str::to_string),
        permissions: vec![],
        read_namespaces: read.iter().map(|ns| ns.to_string()).collect(),
        edit_namespaces: edit.iter().map(|ns| ns.to_string()).collect(),
    }
}

pub fn api_key(key: &str, key_type: &str, roles: &[&str]) -> ApiKey {
    ApiKey {
        id: "apik_1".to_string(),
        created_date: Utc::now(),
        updated_date: Utc::now(),
        name: "Integration key".to_string(),
        key: key.to_string(),
        key_type: key_type.to_string(),
        roles: roles.iter().map(|role| role.to_string()).collect(),
        permissions: vec![],
        read_namespaces: vec![],
        edit_namespaces: vec![],
        metadata: json!({}),
        platform_data: json!({}),
    }
}

/// A platform with `public` / `user` / `dev` / `org-member` roles and one
/// secret API key
pub fn default_services() -> Services {
    let role_permissions: HashMap<String, Vec<String>> = [
        ("public", vec!["asset:list:all", "asset:read:all"]),
        ("user", vec!["asset:create", "asset:read:all"]),
        (
            "dev",
            vec![
                "asset:create:all",
                "asset:read:all",
                "platformData:edit:all",
                "webhook:create:all",
            ],
        ),
        ("org-admin", vec!["asset:create:all", "asset:read:all"]),
        ("org-member", vec!["asset:read:all"]),
    ]
    .into_iter()
    .map(|(role, permissions)| {
        (
            role.to_string(),
            permissions.into_iter().map(str::to_string).collect(),
        )
    })
    .collect();

    let roles: HashMap<String, Role> = [
        role("public", None, &[], &[]),
        role("user", Some("public"), &["basics"], &["basics"]),
        role("dev", Some("user"), &["extended"], &["extended"]),
        role("org-admin", None, &["org"], &["org"]),
        role("org-member", None, &["org"], &[]),
    ]
    .into_iter()
    .map(|role| (role.value.clone(), role))
    .collect();

    let mut keys = HashMap::new();
    let secret_key = api_key("seck_test_wakWA41rBTUXs1Y5", "seck", &["dev"]);
    keys.insert(secret_key.key.clone(), secret_key);

    let mut users = HashSet::new();
    users.insert("usr_1".to_string());

    let mut organizations = HashMap::new();
    organizations.insert(
        "org_1".to_string(),
        Organization {
            id: "org_1".to_string(),
            roles: vec!["org-member".to_string()],
        },
    );

    let mut memberships = HashMap::new();
    memberships.insert(
        ("usr_1".to_string(), "org_1".to_string()),
        vec!["org-admin".to_string()],
    );

    Services {
        authentication: Arc::new(InMemoryAuthentication::single(
            PLATFORM_ID,
            ENV,
            PLATFORM_SECRET,
        )),
        authorization: Arc::new(InMemoryAuthorization { role_permissions }),
        roles: Arc::new(InMemoryRoles { roles }),
        users: Arc::new(InMemoryUsers {
            users,
            organizations,
            memberships,
        }),
        api_keys: Arc::new(InMemoryApiKeys { keys }),
    }
}
