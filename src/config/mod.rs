//! Configuration management for the Gateway
//!
//! This module handles loading and validation of gateway configuration.

pub mod auth;

pub use auth::{AuthConfig, SecurityConfig};

use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Main configuration struct for the Gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Token verification configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Process-wide security material
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables use the `STELACE_` prefix with `__` as the section
    /// separator, e.g. `STELACE_SECURITY__SYSTEM_KEY`. A `.env` file is
    /// honored when present.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        dotenvy::dotenv().ok();

        let config: Config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("STELACE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build config: {}", e)))?
            .try_deserialize()
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.auth.validate().map_err(GatewayError::Config)?;
        self.security.validate().map_err(GatewayError::Config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }
}
