//! Namespace tags for `metadata` / `platformData` keys
//!
//! A key named `_<namespace>` belongs to that namespace; unprefixed keys are
//! visible and editable by anyone with base access to the object. Two fixed
//! namespace categories are reserved.

use serde_json::Value;
use std::collections::BTreeSet;

/// Namespaces only visible and editable through the system bypass
pub const SYSTEM_NAMESPACES: &[&str] = &["system", "stelace"];

/// Namespaces editable only when an operation explicitly opts in
pub const PROTECTED_NAMESPACES: &[&str] = &["private", "protected"];

/// Catch-all namespace granting access to every non-reserved namespace
pub const WILDCARD_NAMESPACE: &str = "*";

/// Namespace tag of an object key, if the key carries one.
///
/// `_system` maps to `system`; a bare `_` carries no tag.
pub fn namespace_of_key(key: &str) -> Option<&str> {
    let tag = key.strip_prefix('_')?;
    if tag.is_empty() { None } else { Some(tag) }
}

/// Whether a namespace belongs to the reserved system set
pub fn is_system_namespace(namespace: &str) -> bool {
    SYSTEM_NAMESPACES.contains(&namespace)
}

/// Whether a namespace belongs to the protected set
pub fn is_protected_namespace(namespace: &str) -> bool {
    PROTECTED_NAMESPACES.contains(&namespace)
}

/// Collect the namespace tags referenced by the top-level keys of a JSON
/// object. Non-object values reference nothing.
pub fn referenced_namespaces(value: &Value) -> BTreeSet<String> {
    let mut namespaces = BTreeSet::new();
    if let Value::Object(map) = value {
        for key in map.keys() {
            if let Some(ns) = namespace_of_key(key) {
                namespaces.insert(ns.to_string());
            }
        }
    }
    namespaces
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_namespace_of_key() {
        assert_eq!(namespace_of_key("_system"), Some("system"));
        assert_eq!(namespace_of_key("_custom"), Some("custom"));
        assert_eq!(namespace_of_key("plain"), None);
        assert_eq!(namespace_of_key("_"), None);
    }

    #[test]
    fn test_reserved_sets() {
        assert!(is_system_namespace("system"));
        assert!(is_system_namespace("stelace"));
        assert!(!is_system_namespace("private"));
        assert!(is_protected_namespace("private"));
        assert!(is_protected_namespace("protected"));
        assert!(!is_protected_namespace("system"));
    }

    #[test]
    fn test_referenced_namespaces() {
        let value = json!({
            "_system": {"x": 1},
            "_custom": true,
            "plain": "kept",
            "_": "no tag",
        });
        let namespaces = referenced_namespaces(&value);
        assert_eq!(
            namespaces.into_iter().collect::<Vec<_>>(),
            vec!["custom".to_string(), "system".to_string()]
        );

        assert!(referenced_namespaces(&json!(null)).is_empty());
        assert!(referenced_namespaces(&json!([1, 2])).is_empty());
    }
}
