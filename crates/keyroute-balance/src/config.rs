//! Selector configuration.

use keyroute_ring::{DEFAULT_REPLICAS, DigestAlgorithm, validate_replicas};
use serde::Deserialize;

use crate::BalanceError;

/// Tuning for the consistent-hash selector, usually the `[balance]` table of
/// a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Virtual nodes per address. Must be a positive multiple of 4.
    pub replicas: u32,
    /// Digest algorithm name: `"md5"` (ketama-compatible) or `"blake3"`.
    pub digest: String,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            digest: DigestAlgorithm::Md5.name().to_string(),
        }
    }
}

impl BalanceConfig {
    /// Check the configuration and resolve the digest algorithm.
    ///
    /// Every failure here is a [`BalanceError::Configuration`].
    pub fn validate(&self) -> Result<DigestAlgorithm, BalanceError> {
        validate_replicas(self.replicas).map_err(BalanceError::Configuration)?;
        self.digest
            .parse::<DigestAlgorithm>()
            .map_err(BalanceError::Configuration)
    }
}
