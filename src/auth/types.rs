//! Authentication and authorization types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque subscription-plan object
///
/// Supplied by the platform configuration and interpreted solely by the
/// Authorization collaborator, which uses it to gate nominally-granted
/// permissions.
pub type Plan = Value;

/// Credentials extracted from a request
///
/// The `Stelace-v1` scheme may carry both an API key and a token at once;
/// every other scheme carries exactly one. An empty credential means the
/// request is anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// Raw API key, format-checked but not yet resolved against the store
    pub api_key: Option<String>,
    /// Raw bearer token, structurally decoded but not yet verified
    pub token: Option<String>,
}

impl Credential {
    /// Whether no credential was supplied
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.token.is_none()
    }
}

/// Claims carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Alternate user ID claim honored for legacy tokens
    #[serde(
        default,
        rename = "userId",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
    /// Roles granted to the subject
    #[serde(default)]
    pub roles: Vec<String>,
    /// Permissions attached directly to the token
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Space-separated OAuth-style scope string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Issued at timestamp
    #[serde(default)]
    pub iat: u64,
    /// Expiration timestamp
    pub exp: u64,
}

impl Claims {
    /// Subject identifier, preferring `sub` over the legacy `userId` claim
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().or(self.user_id.as_deref())
    }

    /// Permissions declared by the token itself: the `permissions` claim
    /// plus any scope entries
    pub fn declared_permissions(&self) -> Vec<String> {
        let mut permissions = self.permissions.clone();
        if let Some(scope) = &self.scope {
            for entry in scope.split_whitespace() {
                if !permissions.iter().any(|p| p == entry) {
                    permissions.push(entry.to_string());
                }
            }
        }
        permissions
    }
}

/// API key resolved from the key store
///
/// Roles, permissions and namespaces are attached to the key directly; no
/// inheritance walk is needed beyond the store's own resolution pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    /// Key ID
    pub id: String,
    /// Creation timestamp
    pub created_date: DateTime<Utc>,
    /// Last update timestamp
    pub updated_date: DateTime<Utc>,
    /// Display name
    pub name: String,
    /// The key value itself
    pub key: String,
    /// Key type, e.g. `pubk` (publishable) or `seck` (secret)
    #[serde(rename = "type")]
    pub key_type: String,
    /// Roles attached to the key
    pub roles: Vec<String>,
    /// Permissions attached to the key directly
    pub permissions: Vec<String>,
    /// Namespaces the key can read
    pub read_namespaces: Vec<String>,
    /// Namespaces the key can edit
    pub edit_namespaces: Vec<String>,
    /// Caller-managed metadata object
    pub metadata: Value,
    /// Platform-managed data object
    pub platform_data: Value,
}

impl ApiKey {
    /// Whether this is a publishable key, excluded from the secret-key
    /// resolution path
    pub fn is_publishable(&self) -> bool {
        self.key_type == crate::auth::api_key::PUBLISHABLE_KEY_TYPE
    }
}

/// Role definition
///
/// `parent_id` forms a tree; namespace resolution walks the parent chain
/// accumulating namespaces, never removing any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Role ID
    pub id: String,
    /// Stable role identifier used in grants
    pub value: String,
    /// Parent role, if any
    pub parent_id: Option<String>,
    /// Permissions granted by this role
    pub permissions: Vec<String>,
    /// Namespaces readable through this role
    pub read_namespaces: Vec<String>,
    /// Namespaces editable through this role
    pub edit_namespaces: Vec<String>,
}

/// Organization as seen by the membership check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Organization {
    /// Organization ID
    pub id: String,
    /// Roles the organization allows its members to exercise; empty means
    /// no restriction beyond the membership's own roles
    #[serde(default)]
    pub roles: Vec<String>,
}
