//! Content hashing for model identity.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex characters kept from the digest.
pub const HASH_LEN: usize = 32;

/// Full SHA-256 hex digest of the compact JSON encoding of `value`.
///
/// Map-typed fields must be ordered (`BTreeMap`) for the digest to be stable.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_vec(value)?;
    let digest = Sha256::digest(&encoded);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Everything that contributes to a model's identity.
///
/// Materialization is not part of identity.
#[derive(Debug, Serialize)]
pub(crate) struct ModelDigest<'a> {
    pub generic_name: &'a str,
    pub template: &'a str,
    /// Properties after formatting.
    pub properties: BTreeMap<&'a str, String>,
    /// Hashes of referenced models.
    pub references: BTreeMap<&'a str, &'a str>,
}

impl ModelDigest<'_> {
    /// 32 lowercase hex characters.
    pub fn hash(&self) -> Result<String, serde_json::Error> {
        let mut full = compute_hash(self)?;
        full.truncate(HASH_LEN);
        Ok(full)
    }
}
