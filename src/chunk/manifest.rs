use serde::{Deserialize, Serialize};

use crate::storage::{api::ChunkStore, error::StorageError};

/// Terminator of a chunk sequence, committed under the base key after the last chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkManifest {
    pub chunks: u64,
    pub length: u64,
    pub chunk_size: usize,
}

impl ChunkManifest {
    pub fn load(store: &dyn ChunkStore, base: &str) -> Result<Option<Self>, StorageError> {
        match store.load(base)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn commit(&self, store: &dyn ChunkStore, base: &str) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(self)?;
        store.store(base, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryChunkStore;

    #[test]
    fn manifest_is_kept_under_the_base_key() {
        let store = MemoryChunkStore::new();
        assert_eq!(ChunkManifest::load(&store, "k-data").unwrap(), None);

        let manifest = ChunkManifest { chunks: 3, length: 2500, chunk_size: 1024 };
        manifest.commit(&store, "k-data").unwrap();
        assert_eq!(ChunkManifest::load(&store, "k-data").unwrap(), Some(manifest));
    }

    #[test]
    fn garbage_under_the_base_key_is_an_error() {
        let store = MemoryChunkStore::new();
        store.store("k-data", b"not json").unwrap();
        assert!(matches!(ChunkManifest::load(&store, "k-data"), Err(StorageError::Manifest(_))));
    }
}
