// Storage module - PERSISTENCE
// sled-backed store for the CLI's keypairs and registry state

mod store;

pub use store::{RegistryStore, StorageStats, StoreError};
