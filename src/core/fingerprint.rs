// src/core/fingerprint.rs

use crate::models::ResolvedConfig;
use anyhow::{Context, Result};
use log::debug;

const HASH_TRUNCATE_LENGTH: usize = 16; // 16 bytes = 32 hex characters

/// Computes a stable digest of a resolved configuration.
///
/// The configuration is serialized to JSON (feature sets in bit order, python
/// prefixes in lexicographic order) and hashed with blake3, so two runs with
/// equivalent command lines report the same fingerprint.
pub fn fingerprint(config: &ResolvedConfig) -> Result<String> {
    let canonical = serde_json::to_vec(config)
        .context("Failed to serialize the resolved configuration")?;

    let hash = blake3::hash(&canonical);
    let digest = hash
        .as_bytes()
        .get(..HASH_TRUNCATE_LENGTH)
        .context("blake3 digest shorter than expected")?;
    let fingerprint = hex::encode(digest);

    debug!("Configuration fingerprint: {}", fingerprint);
    Ok(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::resolve;

    fn resolve_params(params: &[&str]) -> ResolvedConfig {
        let args: Vec<String> = params.iter().map(|s| s.to_string()).collect();
        resolve(&args).unwrap()
    }

    #[test]
    fn test_fingerprint_is_32_hex_characters() {
        let digest = fingerprint(&resolve_params(&["job"])).unwrap();
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_equivalent_command_lines_share_a_fingerprint() {
        // Same prefixes in a different order, same port spelled two ways.
        let first = resolve_params(&["--python-prefix=/b:/a", "--port=5000", "job"]);
        let second = resolve_params(&["-t", "5000", "-r", "/a:/b:/a", "job"]);
        assert_eq!(fingerprint(&first).unwrap(), fingerprint(&second).unwrap());
    }

    #[test]
    fn test_different_configurations_differ() {
        let push = resolve_params(&["job"]);
        let pull = resolve_params(&["--pull", "job"]);
        assert_ne!(fingerprint(&push).unwrap(), fingerprint(&pull).unwrap());
    }
}
