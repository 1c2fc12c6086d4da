//! Process-wide security context
//!
//! Holds the system bypass secret and the workflow instance key. Built once
//! at process start and passed by handle to the gate; the only mutation ever
//! allowed afterwards is the passphrase-gated swap of the system-hash
//! function.

use crate::config::SecurityConfig;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Hash function mapping `(system_key, platform_id, env)` to the opaque
/// hash internal services present
pub type SystemHashFn = Arc<dyn Fn(&str, &str, &str) -> String + Send + Sync>;

/// Security material shared by every request
pub struct SecurityContext {
    system_key: String,
    passphrase: String,
    workflow_key: String,
    hash_fn: RwLock<SystemHashFn>,
}

impl SecurityContext {
    /// Build the context from startup configuration
    ///
    /// The workflow key is generated fresh for this process instance, so a
    /// matching key proves the call originated from this same process.
    pub fn new(config: &SecurityConfig) -> Self {
        let workflow_key = Uuid::new_v4().simple().to_string();

        Self {
            system_key: config.system_key.clone(),
            passphrase: config.system_hash_passphrase.clone(),
            workflow_key,
            hash_fn: RwLock::new(Arc::new(default_system_hash)),
        }
    }

    /// Expected system hash for one platform and environment
    pub fn system_hash(&self, platform_id: &str, env: &str) -> String {
        let hash_fn = self.hash_fn.read().clone();
        hash_fn(&self.system_key, platform_id, env)
    }

    /// Whether a provided hash proves system origin
    pub fn is_system(&self, provided_hash: &str, platform_id: &str, env: &str) -> bool {
        !provided_hash.is_empty() && provided_hash == self.system_hash(platform_id, env)
    }

    /// This process instance's workflow key
    pub fn workflow_key(&self) -> &str {
        &self.workflow_key
    }

    /// Install a custom system-hash function
    ///
    /// No-op returning `false` unless the passphrase matches the one set at
    /// startup. An empty configured passphrase disables the swap entirely.
    pub fn set_system_hash_fn(&self, passphrase: &str, hash_fn: SystemHashFn) -> bool {
        if !self.passphrase_matches(passphrase) {
            return false;
        }
        *self.hash_fn.write() = hash_fn;
        true
    }

    /// Currently installed system-hash function, passphrase-gated like the
    /// setter
    pub fn system_hash_fn(&self, passphrase: &str) -> Option<SystemHashFn> {
        if !self.passphrase_matches(passphrase) {
            return None;
        }
        Some(self.hash_fn.read().clone())
    }

    fn passphrase_matches(&self, passphrase: &str) -> bool {
        !self.passphrase.is_empty() && passphrase == self.passphrase
    }
}

impl std::fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityContext")
            .field("system_key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .field("workflow_key", &"[REDACTED]")
            .finish()
    }
}

fn default_system_hash(system_key: &str, platform_id: &str, env: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(system_key.as_bytes());
    hasher.update(b":");
    hasher.update(platform_id.as_bytes());
    hasher.update(b":");
    hasher.update(env.as_bytes());
    hex::encode(hasher.finalize())
}
