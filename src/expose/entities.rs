//! Exposure declarations for gateway-owned entities
//!
//! Resource services declare their own entities against [`Exposable`]; the
//! API key entity lives here because the gateway owns it.

use super::{Exposable, ExposeOptions};
use crate::auth::api_key::{SECRET_KEY_TYPE, obfuscate_key};
use crate::auth::types::ApiKey;
use serde_json::{Map, Value};

const API_ACCESS_FIELDS: &[&str] = &[
    "id",
    "createdDate",
    "updatedDate",
    "name",
    "key",
    "type",
    "roles",
    "permissions",
    "readNamespaces",
    "editNamespaces",
    "metadata",
    "platformData",
];

impl Exposable for ApiKey {
    fn access_fields(&self, access: &str) -> Option<&'static [&'static str]> {
        match access {
            "api" => Some(API_ACCESS_FIELDS),
            _ => None,
        }
    }

    fn transform(&self, element: &mut Map<String, Value>, options: &ExposeOptions<'_>) {
        // Secret keys are never shown in full; other key types only with
        // the reveal opt-in
        let reveal = options.reveal && self.key_type != SECRET_KEY_TYPE;
        if !reveal {
            if let Some(Value::String(key)) = element.get_mut("key") {
                *key = obfuscate_key(key);
            }
        }
    }

    fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
