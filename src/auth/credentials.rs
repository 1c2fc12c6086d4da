//! Credential extraction from the `Authorization` header
//!
//! Three schemes are accepted:
//!
//! - `Basic`: base64 `apiKey[:]`, the legacy API-key-as-password transport
//! - `Bearer`: the remainder is the token
//! - `Stelace-v1`: comma-separated `key="value"` pairs carrying an `apiKey`
//!   and/or a `token`
//!
//! Anything else is a 401. Extracted credentials are format-checked here;
//! cryptographic verification happens later in the token verifier.

use crate::auth::api_key::parse_key;
use crate::auth::token::decode_unverified;
use crate::auth::types::Credential;
use crate::utils::error::{GatewayError, Result};
use base64::{Engine as _, engine::general_purpose};

/// Parse a raw `Authorization` header into a credential
pub fn parse_authorization_header(raw_header: &str) -> Result<Credential> {
    let raw = raw_header.trim();
    let (scheme, credentials) = raw
        .split_once(' ')
        .ok_or_else(invalid_header)?;
    let credentials = credentials.trim();

    if scheme.is_empty() || credentials.is_empty() {
        return Err(invalid_header());
    }

    let credential = match scheme.to_ascii_lowercase().as_str() {
        "basic" => parse_basic(credentials)?,
        "bearer" => Credential {
            api_key: None,
            token: Some(credentials.to_string()),
        },
        "stelace-v1" => parse_stelace_v1(credentials)?,
        _ => return Err(invalid_header()),
    };

    validate_credential(&credential)?;
    Ok(credential)
}

/// Build a credential from the request headers
///
/// The `Authorization` header wins; the legacy `x-api-key` header is the
/// fallback carrier for API keys.
pub fn credential_from_headers(
    authorization: Option<&str>,
    api_key_header: Option<&str>,
) -> Result<Credential> {
    if let Some(raw) = authorization {
        return parse_authorization_header(raw);
    }

    if let Some(raw_key) = api_key_header {
        let credential = Credential {
            api_key: Some(raw_key.trim().to_string()),
            token: None,
        };
        validate_credential(&credential)?;
        return Ok(credential);
    }

    Ok(Credential::default())
}

/// Canonical `Bearer <token>` carrier value, so downstream bearer-token
/// middleware sees one scheme whatever the original header used
pub fn canonical_bearer(credential: &Credential) -> Option<String> {
    credential
        .token
        .as_ref()
        .map(|token| format!("Bearer {}", token))
}

fn parse_basic(credentials: &str) -> Result<Credential> {
    let decoded = general_purpose::STANDARD
        .decode(credentials)
        .map_err(|_| invalid_header())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid_header())?;

    // API-key-as-password transport appends a colon for the empty password
    let api_key = decoded.strip_suffix(':').unwrap_or(&decoded);
    if api_key.is_empty() {
        return Err(invalid_header());
    }

    Ok(Credential {
        api_key: Some(api_key.to_string()),
        token: None,
    })
}

fn parse_stelace_v1(credentials: &str) -> Result<Credential> {
    let mut api_key = None;
    let mut token = None;

    for pair in credentials.split(',') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };

        let value = clean_value(value);
        if value.is_empty() {
            continue;
        }

        match name.trim().to_ascii_lowercase().as_str() {
            "apikey" => api_key = Some(value),
            "token" => token = Some(value),
            _ => {}
        }
    }

    if api_key.is_none() && token.is_none() {
        return Err(invalid_header());
    }

    Ok(Credential { api_key, token })
}

/// Strip optional surrounding quotes and backslash-escaped quotes
fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.replace("\\\"", "")
}

fn validate_credential(credential: &Credential) -> Result<()> {
    if let Some(api_key) = &credential.api_key {
        if !parse_key(api_key).has_valid_format {
            return Err(GatewayError::unauthorized("Invalid API key"));
        }
    }

    if let Some(token) = &credential.token {
        decode_unverified(token)
            .map_err(|_| GatewayError::unauthorized("Invalid token"))?;
    }

    Ok(())
}

fn invalid_header() -> GatewayError {
    GatewayError::unauthorized("Invalid authorization header")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::Claims;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn test_token() -> String {
        let claims = Claims {
            sub: Some("usr_1".to_string()),
            user_id: None,
            roles: vec!["user".to_string()],
            permissions: vec![],
            scope: None,
            iat: 0,
            exp: u64::MAX,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_basic_scheme_with_colon_suffix() {
        let encoded = general_purpose::STANDARD.encode("pubk_live_xxx:");
        let credential =
            parse_authorization_header(&format!("Basic {}", encoded)).unwrap();
        assert_eq!(credential.api_key.as_deref(), Some("pubk_live_xxx"));
        assert!(credential.token.is_none());
    }

    #[test]
    fn test_basic_scheme_without_colon() {
        let encoded = general_purpose::STANDARD.encode("seck_test_abc123");
        let credential =
            parse_authorization_header(&format!("Basic {}", encoded)).unwrap();
        assert_eq!(credential.api_key.as_deref(), Some("seck_test_abc123"));
    }

    #[test]
    fn test_bearer_scheme() {
        let token = test_token();
        let credential =
            parse_authorization_header(&format!("Bearer {}", token)).unwrap();
        assert_eq!(credential.token.as_deref(), Some(token.as_str()));
        assert!(credential.api_key.is_none());
    }

    #[test]
    fn test_stelace_v1_extracts_both() {
        let token = test_token();
        let header = format!(
            "Stelace-v1 apiKey=\"pubk_test_abc\", token=\"{}\"",
            token
        );
        let credential = parse_authorization_header(&header).unwrap();
        assert_eq!(credential.api_key.as_deref(), Some("pubk_test_abc"));
        assert_eq!(credential.token.as_deref(), Some(token.as_str()));
    }

    #[test]
    fn test_stelace_v1_quotes_optional_and_case_insensitive() {
        let credential =
            parse_authorization_header("Stelace-V1 APIKEY=seck_live_def456")
                .unwrap();
        assert_eq!(credential.api_key.as_deref(), Some("seck_live_def456"));
    }

    #[test]
    fn test_stelace_v1_escaped_quotes_stripped() {
        let credential = parse_authorization_header(
            "Stelace-v1 apiKey=\\\"seck_live_def456\\\"",
        )
        .unwrap();
        assert_eq!(credential.api_key.as_deref(), Some("seck_live_def456"));
    }

    #[test]
    fn test_stelace_v1_requires_a_credential() {
        let err =
            parse_authorization_header("Stelace-v1 other=\"value\"").unwrap_err();
        assert!(matches!(
            err,
            crate::utils::error::GatewayError::Unauthorized(_)
        ));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        assert!(parse_authorization_header("Digest abc").is_err());
        assert!(parse_authorization_header("Bearer").is_err());
        assert!(parse_authorization_header("").is_err());
        assert!(parse_authorization_header("Basic ").is_err());
    }

    #[test]
    fn test_bad_api_key_format_rejected() {
        let encoded = general_purpose::STANDARD.encode("not-a-key:");
        assert!(parse_authorization_header(&format!("Basic {}", encoded)).is_err());
    }

    #[test]
    fn test_bad_token_structure_rejected() {
        assert!(parse_authorization_header("Bearer not.a.token").is_err());
    }

    #[test]
    fn test_x_api_key_fallback() {
        let credential =
            credential_from_headers(None, Some("seck_test_abc123")).unwrap();
        assert_eq!(credential.api_key.as_deref(), Some("seck_test_abc123"));

        let credential = credential_from_headers(None, None).unwrap();
        assert!(credential.is_empty());
    }

    #[test]
    fn test_canonical_bearer() {
        let token = test_token();
        let credential = Credential {
            api_key: Some("pubk_test_abc".to_string()),
            token: Some(token.clone()),
        };
        assert_eq!(
            canonical_bearer(&credential).unwrap(),
            format!("Bearer {}", token)
        );
        assert!(canonical_bearer(&Credential::default()).is_none());
    }
}
