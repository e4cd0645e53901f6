// RegistryStore - Persistent key-value storage using sled
//
// Deployment-side persistence for the CLI:
// - Named signing keypairs
// - Registry snapshot, balances and config, written together

use crate::identity::Keypair;
use crate::registry::{BidRegistry, Clock, InMemoryBalances, RegistryConfig, RegistrySnapshot};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Key prefixes for organizing data
mod keys {
    pub const KEYPAIR_PREFIX: &[u8] = b"identity:keypair:";
    pub const REGISTRY_SNAPSHOT: &[u8] = b"registry:snapshot";
    pub const REGISTRY_BALANCES: &[u8] = b"registry:balances";
    pub const REGISTRY_CONFIG: &[u8] = b"registry:config";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),

    #[error("Registry state is incomplete: missing {0}")]
    Incomplete(&'static str),

    #[error("Registry rejected stored state: {0}")]
    Registry(#[from] crate::registry::RegistryError),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

/// Persistent key-value store for registry data
///
/// Uses sled for crash-safe, embedded storage.
/// Registry state is written in a single atomic batch.
pub struct RegistryStore {
    db: sled::Db,
}

impl RegistryStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    fn get_decoded<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StoreError> {
        match self.db.get(key)? {
            Some(bytes) => postcard::from_bytes(&bytes)
                .map(Some)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string())),
            None => Ok(None),
        }
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        postcard::to_allocvec(value).map_err(|e| StoreError::SerializationFailed(e.to_string()))
    }

    // ========================================================================
    // KEYPAIRS
    // ========================================================================

    /// Save a keypair under a label
    pub fn save_keypair(&self, label: &str, keypair: &Keypair) -> Result<(), StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        self.db.insert(key, keypair.to_bytes().to_vec())?;
        Ok(())
    }

    /// Load a keypair by label
    pub fn load_keypair(&self, label: &str) -> Result<Option<Keypair>, StoreError> {
        let key = [keys::KEYPAIR_PREFIX, label.as_bytes()].concat();
        match self.db.get(key)? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// Labels of all stored keypairs, sorted
    pub fn keypair_labels(&self) -> Result<Vec<String>, StoreError> {
        let mut labels = Vec::new();
        for result in self.db.scan_prefix(keys::KEYPAIR_PREFIX) {
            let (key, _) = result?;
            let label = &key[keys::KEYPAIR_PREFIX.len()..];
            labels.push(String::from_utf8_lossy(label).into_owned());
        }
        Ok(labels)
    }

    // ========================================================================
    // REGISTRY STATE
    // ========================================================================

    /// Persist snapshot, balances and config in one atomic batch
    pub fn save_registry<C: Clock>(
        &self,
        registry: &BidRegistry<InMemoryBalances, C>,
    ) -> Result<(), StoreError> {
        let mut batch = sled::Batch::default();
        batch.insert(keys::REGISTRY_SNAPSHOT, Self::encode(&registry.snapshot())?);
        batch.insert(keys::REGISTRY_BALANCES, Self::encode(registry.balances())?);
        batch.insert(keys::REGISTRY_CONFIG, Self::encode(registry.config())?);
        self.db.apply_batch(batch)?;
        debug!("registry state saved");
        Ok(())
    }

    /// Restore a registry, or `None` if nothing was saved yet
    pub fn load_registry<C: Clock>(
        &self,
        clock: C,
    ) -> Result<Option<BidRegistry<InMemoryBalances, C>>, StoreError> {
        let snapshot: RegistrySnapshot = match self.get_decoded(keys::REGISTRY_SNAPSHOT)? {
            Some(snapshot) => snapshot,
            None => return Ok(None),
        };
        let balances: InMemoryBalances = self
            .get_decoded(keys::REGISTRY_BALANCES)?
            .ok_or(StoreError::Incomplete("balances"))?;
        let config: RegistryConfig = self
            .get_decoded(keys::REGISTRY_CONFIG)?
            .ok_or(StoreError::Incomplete("config"))?;

        let registry = BidRegistry::from_snapshot(snapshot, config, balances, clock)?;
        debug!("registry state loaded");
        Ok(Some(registry))
    }
}
