//! Authentication and security configuration

use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use serde::{Deserialize, Serialize};

/// Token verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Clock-skew leeway applied to `exp`/`iat` checks, in seconds
    #[serde(default = "default_token_leeway")]
    pub token_leeway: u64,
    /// Environments in which swallowed verification failures are not logged
    #[serde(default = "default_quiet_envs")]
    pub quiet_envs: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_leeway: default_token_leeway(),
            quiet_envs: default_quiet_envs(),
        }
    }
}

impl AuthConfig {
    /// Validate token verification configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.token_leeway > 300 {
            return Err(
                "Token leeway should not exceed 5 minutes (300 seconds)".to_string(),
            );
        }
        Ok(())
    }
}

/// Process-wide security material
///
/// Read once at startup; the values seed the [`SecurityContext`] and are
/// immutable afterwards.
///
/// [`SecurityContext`]: crate::auth::SecurityContext
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Shared secret internal services hash to prove system origin
    #[serde(default = "generate_secure_key")]
    pub system_key: String,
    /// Passphrase gating the system-hash function hot swap; empty disables
    /// the swap entirely
    #[serde(default)]
    pub system_hash_passphrase: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            system_key: generate_secure_key(),
            system_hash_passphrase: String::new(),
        }
    }
}

impl SecurityConfig {
    /// Validate security configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.system_key.len() < 32 {
            return Err(
                "System key must be at least 32 characters long for security".to_string(),
            );
        }

        if !self.system_hash_passphrase.is_empty() && self.system_hash_passphrase.len() < 16 {
            return Err(
                "System hash passphrase must be at least 16 characters long when set"
                    .to_string(),
            );
        }

        Ok(())
    }
}

fn default_token_leeway() -> u64 {
    10
}

fn default_quiet_envs() -> Vec<String> {
    vec!["test".to_string()]
}

/// Generate a secure random key
fn generate_secure_key() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_security_config_is_valid() {
        let config = SecurityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.system_key.len(), 64);
        assert!(config.system_hash_passphrase.is_empty());
    }

    #[test]
    fn test_short_system_key_rejected() {
        let config = SecurityConfig {
            system_key: "short".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_passphrase_rejected() {
        let config = SecurityConfig {
            system_hash_passphrase: "tiny".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_excessive_leeway_rejected() {
        let config = AuthConfig {
            token_leeway: 600,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
