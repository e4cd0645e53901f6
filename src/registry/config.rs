use serde::{Deserialize, Serialize};

use crate::registry::RegistryError;

/// Limits enforced by the registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Longest accepted subject tag, in bytes
    pub max_tag_len: usize,
    /// Most offers a single bid accepts
    pub max_offers_per_bid: usize,
}

impl RegistryConfig {
    /// Create a new config with builder pattern
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum tag length
    pub fn with_max_tag_len(mut self, len: usize) -> Self {
        self.max_tag_len = len;
        self
    }

    /// Set the per-bid offer limit
    pub fn with_max_offers_per_bid(mut self, limit: usize) -> Self {
        self.max_offers_per_bid = limit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.max_tag_len == 0 {
            return Err(RegistryError::InvalidConfig(
                "max_tag_len must be > 0".to_string(),
            ));
        }
        if self.max_offers_per_bid == 0 {
            return Err(RegistryError::InvalidConfig(
                "max_offers_per_bid must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_tag_len: 128,
            max_offers_per_bid: 1024,
        }
    }
}
