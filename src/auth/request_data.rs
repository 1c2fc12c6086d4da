//! Request-body namespace validation
//!
//! Writes to `metadata` / `platformData` must stay inside the namespaces the
//! caller can edit. `platformData` is all-or-nothing: it is only editable
//! with the `platformData:edit:all` sentinel permission, there is no partial
//! grant for it.

use crate::auth::gate::PLATFORM_DATA_EDIT_ALL;
use crate::auth::namespaces::{
    PROTECTED_NAMESPACES, WILDCARD_NAMESPACE, is_protected_namespace,
    is_system_namespace, referenced_namespaces,
};
use crate::utils::error::{GatewayError, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::collections::HashMap;

/// Inputs to one request-data check
#[derive(Debug, Clone)]
pub struct RequestDataParams<'a> {
    /// `metadata` object from the request body, if present
    pub metadata: Option<&'a Value>,
    /// `platformData` object from the request body, if present
    pub platform_data: Option<&'a Value>,
    /// Whether the request came through the system bypass
    pub is_system_request: bool,
    /// Permissions matched by the gate for this request
    pub matched_permissions: &'a HashMap<String, bool>,
    /// Namespaces the caller can edit
    pub edit_namespaces: &'a [String],
    /// Whether the operation opted into protected-namespace editing
    pub edit_protected_namespaces: bool,
}

/// Validate metadata / platformData writes against the caller's namespaces
pub fn check_request_data(params: &RequestDataParams<'_>) -> Result<()> {
    let platform_data_present = params
        .platform_data
        .is_some_and(|value| !value.is_null());

    if platform_data_present
        && !params
            .matched_permissions
            .get(PLATFORM_DATA_EDIT_ALL)
            .copied()
            .unwrap_or(false)
    {
        return Err(GatewayError::forbidden("Not allowed to edit platformData"));
    }

    let mut referenced = BTreeSet::new();
    if let Some(metadata) = params.metadata {
        referenced.extend(referenced_namespaces(metadata));
    }
    if let Some(platform_data) = params.platform_data {
        referenced.extend(referenced_namespaces(platform_data));
    }

    if referenced.is_empty() {
        return Ok(());
    }

    let system: Vec<&String> = referenced
        .iter()
        .filter(|ns| is_system_namespace(ns))
        .collect();
    if !params.is_system_request && !system.is_empty() {
        return Err(forbidden_namespaces("Forbidden namespaces", &system));
    }

    let protected: Vec<&String> = referenced
        .iter()
        .filter(|ns| is_protected_namespace(ns))
        .collect();
    if !params.edit_protected_namespaces && !protected.is_empty() {
        return Err(forbidden_namespaces("Forbidden namespaces", &protected));
    }

    let wildcard = params
        .edit_namespaces
        .iter()
        .any(|ns| ns == WILDCARD_NAMESPACE);
    if wildcard {
        return Ok(());
    }

    let unauthorized: Vec<&String> = referenced
        .iter()
        .filter(|ns| {
            // System namespaces were vetted above for system callers
            if params.is_system_request && is_system_namespace(ns) {
                return false;
            }
            !params.edit_namespaces.iter().any(|edit| edit == ns.as_str())
                && !PROTECTED_NAMESPACES.contains(&ns.as_str())
        })
        .collect();
    if !unauthorized.is_empty() {
        return Err(forbidden_namespaces(
            "Forbidden namespace edition",
            &unauthorized,
        ));
    }

    Ok(())
}

fn forbidden_namespaces(message: &str, namespaces: &[&String]) -> GatewayError {
    let named: Vec<&str> = namespaces.iter().map(|ns| ns.as_str()).collect();
    GatewayError::forbidden(format!("{}: {}", message, named.join(", ")))
}
