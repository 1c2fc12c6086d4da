//! Entity exposure
//!
//! The redaction step between an internal entity and what a caller is
//! allowed to see. Each entity type declares per-access-level field
//! whitelists and an optional transform through the [`Exposable`] trait; the
//! generic algorithm picks whitelisted fields, strips namespaced
//! `metadata` / `platformData` keys the caller cannot read, and appends the
//! derived `livemode` flag.
//!
//! Redaction fails closed: an access level the entity does not declare
//! exposes an empty object, never the raw entity.

pub mod entities;


use crate::auth::namespaces::{is_system_namespace, namespace_of_key, WILDCARD_NAMESPACE};
use serde_json::{Map, Value};

/// Context for one exposure pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ExposeOptions<'a> {
    /// Access level selecting the field whitelist, e.g. `api`
    pub access: &'a str,
    /// Namespaces the caller can read
    pub namespaces: &'a [String],
    /// Environment, drives the derived `livemode` flag
    pub env: &'a str,
    /// Whether the caller is the system bypass source
    pub system_request: bool,
    /// Entity-specific reveal opt-in (e.g. show a non-secret key in full)
    pub reveal: bool,
    /// Plan-allowed permissions, available to entity transforms
    pub plan_permissions: Option<&'a [String]>,
    /// Field whitelist override replacing the entity's own declaration
    pub access_fields: Option<&'static [&'static str]>,
}

/// Capability implemented by any entity the API returns
pub trait Exposable {
    /// Field whitelist for an access level; `None` for undeclared levels
    fn access_fields(&self, access: &str) -> Option<&'static [&'static str]>;

    /// Entity-specific field rewrites, applied to the cloned value before
    /// fields are picked
    fn transform(&self, element: &mut Map<String, Value>, options: &ExposeOptions<'_>) {
        let _ = (element, options);
    }

    /// JSON value of the entity; exposure never mutates the entity itself
    fn to_value(&self) -> Value;
}

/// Redact one entity for a caller
pub fn expose<T: Exposable + ?Sized>(
    element: Option<&T>,
    options: &ExposeOptions<'_>,
) -> Value {
    let Some(element) = element else {
        return Value::Null;
    };

    let fields = options
        .access_fields
        .or_else(|| element.access_fields(options.access));
    let Some(fields) = fields else {
        // Unknown access level: expose nothing rather than everything
        return Value::Object(Map::new());
    };

    let mut source = match element.to_value() {
        Value::Object(map) => map,
        _ => return Value::Object(Map::new()),
    };
    element.transform(&mut source, options);

    let mut exposed = Map::new();
    for field in fields {
        if let Some(value) = source.remove(*field) {
            exposed.insert((*field).to_string(), value);
        }
    }

    for data_field in ["metadata", "platformData"] {
        if let Some(Value::Object(object)) = exposed.get_mut(data_field) {
            filter_namespaced_keys(object, options);
        }
    }

    exposed.insert("livemode".to_string(), Value::Bool(options.env == "live"));
    Value::Object(exposed)
}

/// Redact a list of entities with identical per-element semantics
pub fn expose_all<T: Exposable>(elements: &[T], options: &ExposeOptions<'_>) -> Vec<Value> {
    elements
        .iter()
        .map(|element| expose(Some(element), options))
        .collect()
}

/// Drop namespaced keys the caller cannot read
///
/// Three mutually exclusive cases: the system source keeps everything, a
/// wildcard caller keeps everything outside the reserved system namespaces,
/// and an explicit list keeps only its own tags. Unprefixed keys are always
/// kept.
fn filter_namespaced_keys(object: &mut Map<String, Value>, options: &ExposeOptions<'_>) {
    if options.system_request {
        return;
    }

    let wildcard = options
        .namespaces
        .iter()
        .any(|ns| ns == WILDCARD_NAMESPACE);

    object.retain(|key, _| match namespace_of_key(key) {
        None => true,
        Some(namespace) => {
            if wildcard {
                !is_system_namespace(namespace)
            } else {
                options.namespaces.iter().any(|ns| ns == namespace)
            }
        }
    });
}
