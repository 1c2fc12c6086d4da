//! Bearer token verification
//!
//! Signatures are checked against a per-platform, per-environment secret
//! obtained from the Authentication collaborator. A token that fails
//! verification degrades the request to anonymous instead of failing it; an
//! invalid or foreign token yields public access, never an error. Only
//! transport failures fetching the secret propagate.

use crate::auth::services::AuthenticationService;
use crate::auth::types::Claims;
use crate::config::AuthConfig;
use crate::utils::error::{GatewayError, Result};
use base64::{Engine as _, engine::general_purpose};
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a verification attempt
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    /// Verified claims; `None` when verification failed and the request
    /// degrades to anonymous
    pub claims: Option<Claims>,
    /// Whether verification ran against this platform's own secret. Always
    /// true once this code path executes; tokens are never partially
    /// trusted.
    pub is_internal: bool,
}

/// Token verifier bound to the Authentication collaborator
pub struct TokenVerifier {
    authentication: Arc<dyn AuthenticationService>,
    /// Resolved signing secrets, keyed by `platform:env`. The only
    /// cross-request cache in the subsystem besides the security context.
    secrets: DashMap<String, String>,
    leeway: u64,
    quiet_envs: Vec<String>,
}

impl TokenVerifier {
    /// Create a new token verifier
    pub fn new(authentication: Arc<dyn AuthenticationService>, config: &AuthConfig) -> Self {
        Self {
            authentication,
            secrets: DashMap::new(),
            leeway: config.token_leeway,
            quiet_envs: config.quiet_envs.clone(),
        }
    }

    /// Verify a token for one platform and environment
    pub async fn verify(
        &self,
        token: &str,
        platform_id: &str,
        env: &str,
    ) -> Result<VerifiedToken> {
        let secret = self.auth_secret(platform_id, env).await?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.validate_aud = false;

        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => {
                debug!(platform_id, "token verified");
                Ok(VerifiedToken {
                    claims: Some(data.claims),
                    is_internal: true,
                })
            }
            Err(err) => {
                if !self.quiet_envs.iter().any(|quiet| quiet == env) {
                    warn!(platform_id, env, "token verification failed: {}", err);
                }
                Ok(VerifiedToken {
                    claims: None,
                    is_internal: true,
                })
            }
        }
    }

    async fn auth_secret(&self, platform_id: &str, env: &str) -> Result<String> {
        let cache_key = format!("{}:{}", platform_id, env);
        if let Some(secret) = self.secrets.get(&cache_key) {
            return Ok(secret.clone());
        }

        let secret = self
            .authentication
            .get_auth_secret(platform_id, env)
            .await?;
        self.secrets.insert(cache_key, secret.clone());
        Ok(secret)
    }
}

/// Structurally decode a token without verifying its signature
///
/// Used by the credential parser's format check; the claims it returns must
/// never be trusted for authorization.
pub fn decode_unverified(token: &str) -> Result<Claims> {
    jsonwebtoken::decode_header(token)
        .map_err(|_| GatewayError::unauthorized("Invalid token"))?;

    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(GatewayError::unauthorized("Invalid token")),
    };

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| GatewayError::unauthorized("Invalid token"))?;

    serde_json::from_slice(&bytes).map_err(|_| GatewayError::unauthorized("Invalid token"))
}
