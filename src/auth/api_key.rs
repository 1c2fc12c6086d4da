//! API key format utilities
//!
//! Keys follow the `<type>_<env>_<random>` convention, e.g.
//! `pubk_live_iuJzTKo5wumu` or `seck_test_wakWA41rBTUXs1Y5`. The type
//! segment selects the resolution path (publishable keys skip the secret-key
//! checks); the env segment pins the key to `live` or `test` data.

use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Publishable key type, intentionally excluded from secret-key resolution
pub const PUBLISHABLE_KEY_TYPE: &str = "pubk";

/// Secret key type
pub const SECRET_KEY_TYPE: &str = "seck";

/// Length of the random segment in generated keys
const KEY_RANDOM_LENGTH: usize = 32;

static KEY_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z]+)_(live|test)_([A-Za-z0-9]+)$").expect("valid regex"));

/// Parsed key descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedKey {
    /// Key type segment, e.g. `pubk` or `seck`
    pub key_type: Option<String>,
    /// Environment segment, `live` or `test`
    pub env: Option<String>,
    /// Whether the raw key matches the expected format
    pub has_valid_format: bool,
}

/// Parse a raw key into its type and environment segments
pub fn parse_key(raw_key: &str) -> ParsedKey {
    match KEY_FORMAT.captures(raw_key) {
        Some(captures) => ParsedKey {
            key_type: Some(captures[1].to_string()),
            env: Some(captures[2].to_string()),
            has_valid_format: true,
        },
        None => ParsedKey::default(),
    }
}

/// Canonical form of a key as stored by the key store
///
/// Rotation tooling can append marker characters to the random segment;
/// lookups use the key truncated back to its canonical length.
pub fn get_base_key(raw_key: &str) -> String {
    let Some(captures) = KEY_FORMAT.captures(raw_key) else {
        return raw_key.to_string();
    };

    let random = &captures[3];
    if random.len() <= KEY_RANDOM_LENGTH {
        return raw_key.to_string();
    }

    format!(
        "{}_{}_{}",
        &captures[1],
        &captures[2],
        &random[..KEY_RANDOM_LENGTH]
    )
}

/// Generate a key of the given type for the given environment
pub fn generate_key(key_type: &str, env: &str) -> String {
    let random: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_RANDOM_LENGTH)
        .map(char::from)
        .collect();

    format!("{}_{}_{}", key_type, env, random)
}

/// Hash a key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Obfuscate the middle characters of a key for display
///
/// Stable under re-application: an already-obfuscated value is returned
/// unchanged.
pub fn obfuscate_key(key: &str) -> String {
    if key.contains("...") {
        return key.to_string();
    }

    if let Some(captures) = KEY_FORMAT.captures(key) {
        let random = &captures[3];
        if random.len() > 10 {
            return format!(
                "{}_{}_{}...{}",
                &captures[1],
                &captures[2],
                &random[..4],
                &random[random.len() - 4..]
            );
        }
        return key.to_string();
    }

    if key.len() >= 12 {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    } else {
        key.to_string()
    }
}
