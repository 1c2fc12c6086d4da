//! Access-info resolution
//!
//! Combines role grants, directly-attached permissions and namespace
//! inheritance into one per-request `AccessInfo`. The external lookups are
//! independent and issued concurrently; the organization-restriction
//! narrowing runs strictly after the join, and a failure in any lookup fails
//! the whole resolution.

use crate::auth::services::{GrantedPermissions, RoleNamespaces, Services};
use crate::auth::types::Plan;
use crate::utils::error::Result;
use std::collections::HashMap;
use tracing::debug;

/// Effective permissions and namespaces for one request
#[derive(Debug, Clone, Default)]
pub struct AccessInfo {
    /// Roles the resolution ran with
    pub roles: Vec<String>,
    /// Permissions granted by role, keyed by permission
    pub hash_permissions: HashMap<String, bool>,
    /// Permissions granted directly (API key or token scope), already
    /// plan-filtered
    pub array_permissions: Vec<String>,
    /// Namespaces readable by the caller
    pub read_namespaces: Vec<String>,
    /// Namespaces editable by the caller
    pub edit_namespaces: Vec<String>,
    /// Permissions nominally granted but withheld by the plan
    pub missing_plan_permissions: Vec<String>,
}

/// Inputs to one resolution pass
#[derive(Debug, Clone, Default)]
pub struct AccessParams {
    /// Roles to resolve grants and namespaces for
    pub roles: Vec<String>,
    /// Raw directly-attached permissions, to be plan-filtered
    pub permissions: Vec<String>,
    /// Explicitly supplied read namespaces (e.g. from an API key)
    pub read_namespaces: Vec<String>,
    /// Explicitly supplied edit namespaces
    pub edit_namespaces: Vec<String>,
    /// Organization-override roles; resolution narrows to what these grant
    pub restricted_roles: Option<Vec<String>>,
    /// Platform the request runs against
    pub platform_id: String,
    /// Environment, `live` or `test`
    pub env: String,
    /// Subscription plan gating permissions
    pub plan: Option<Plan>,
    /// Permissions the protected operation cares about
    pub permissions_to_check: Vec<String>,
}

/// Resolve the effective access info for one request
pub async fn compute_access_info(
    services: &Services,
    params: AccessParams,
) -> Result<AccessInfo> {
    let AccessParams {
        roles,
        permissions,
        read_namespaces,
        edit_namespaces,
        restricted_roles,
        platform_id,
        env,
        plan,
        permissions_to_check,
    } = params;

    let plan_ref = plan.as_ref();

    let granted_future = async {
        if roles.is_empty() {
            Ok(GrantedPermissions::default())
        } else {
            services
                .authorization
                .get_granted_permissions(
                    &roles,
                    &permissions_to_check,
                    plan_ref,
                    &platform_id,
                    &env,
                )
                .await
        }
    };

    let namespaces_future = async {
        if roles.is_empty() {
            Ok(RoleNamespaces::default())
        } else {
            services
                .roles
                .get_namespaces(&roles, &platform_id, &env)
                .await
        }
    };

    let filtered_future = async {
        if permissions.is_empty() {
            Ok(Vec::new())
        } else {
            services
                .authorization
                .filter_permissions_by_plan(&permissions, plan_ref, &platform_id, &env)
                .await
        }
    };

    let restricted_future = async {
        match restricted_roles.as_deref() {
            Some(restricted) if !restricted.is_empty() => {
                let (granted, namespaces) = futures::try_join!(
                    services.authorization.get_granted_permissions(
                        restricted,
                        &permissions_to_check,
                        plan_ref,
                        &platform_id,
                        &env,
                    ),
                    services
                        .roles
                        .get_namespaces(restricted, &platform_id, &env),
                )?;
                Ok(Some((granted, namespaces)))
            }
            _ => Ok(None),
        }
    };

    let (granted, role_namespaces, array_permissions, restricted) = futures::try_join!(
        granted_future,
        namespaces_future,
        filtered_future,
        restricted_future,
    )?;

    let mut hash_permissions = granted.granted_permissions;
    let mut missing_plan_permissions = granted.missing_plan_permissions;

    // Raw permissions the plan filtered out are reported, never silently
    // granted
    for permission in &permissions {
        if !array_permissions.iter().any(|p| p == permission)
            && !missing_plan_permissions.contains(permission)
        {
            missing_plan_permissions.push(permission.clone());
        }
    }

    let mut read = dedupe(read_namespaces, role_namespaces.read_namespaces);
    let mut edit = dedupe(edit_namespaces, role_namespaces.edit_namespaces);

    // Restriction only narrows: anything the restricted roles do not grant
    // is revoked even if the base roles granted it
    if let Some((restricted_granted, restricted_namespaces)) = restricted {
        hash_permissions.retain(|permission, granted_by_role| {
            *granted_by_role
                && restricted_granted
                    .granted_permissions
                    .get(permission)
                    .copied()
                    .unwrap_or(false)
        });
        read.retain(|ns| restricted_namespaces.read_namespaces.contains(ns));
        edit.retain(|ns| restricted_namespaces.edit_namespaces.contains(ns));

        for missing in restricted_granted.missing_plan_permissions {
            if !missing_plan_permissions.contains(&missing) {
                missing_plan_permissions.push(missing);
            }
        }
    }

    debug!(
        roles = roles.len(),
        permissions = hash_permissions.len() + array_permissions.len(),
        "access info resolved"
    );

    Ok(AccessInfo {
        roles,
        hash_permissions,
        array_permissions,
        read_namespaces: read,
        edit_namespaces: edit,
        missing_plan_permissions,
    })
}

/// Union two namespace lists, preserving first-seen order
pub(crate) fn dedupe(base: Vec<String>, extra: Vec<String>) -> Vec<String> {
    let mut merged = Vec::with_capacity(base.len() + extra.len());
    for value in base.into_iter().chain(extra) {
        if !merged.contains(&value) {
            merged.push(value);
        }
    }
    merged
}
