use dashmap::DashMap;

use crate::storage::{
    api::{ChunkStore, StoreConfig},
    error::StorageError,
};

pub const MEMORY_LOADER: &str = "binstore::storage::MemoryChunkStore";

/// Process-local chunk store, mostly for tests and ephemeral deployments.
pub struct MemoryChunkStore {
    chunks: DashMap<String, Vec<u8>>,
    config: StoreConfig,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::new(MEMORY_LOADER))
    }

    pub fn with_config(config: StoreConfig) -> Self {
        MemoryChunkStore { chunks: DashMap::new(), config }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkStore for MemoryChunkStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.chunks.get(key).map(|v| v.value().clone()))
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.chunks.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.chunks.remove(key).is_some())
    }

    fn config(&self) -> &StoreConfig {
        &self.config
    }
}
