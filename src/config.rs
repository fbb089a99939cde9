use std::{
    collections::BTreeMap,
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::storage::{
    Backend, DEFAULT_CHUNK_SIZE, FileBinaryStore, MemoryChunkStore, RedbChunkStore, StorageError,
    StoreConfig, memory::MEMORY_LOADER, redb_store::REDB_LOADER,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
}

/// Which backend is active. Exactly one is configured per process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Direct {
        root: PathBuf,
    },
    Chunked {
        store: ChunkStoreKind,
        /// Zero is rejected while parsing.
        #[serde(default = "default_chunk_size")]
        chunk_size: NonZeroUsize,
        /// Exposed through the chunk store's configuration, e.g. `"id"`.
        #[serde(default)]
        properties: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChunkStoreKind {
    Memory,
    Redb { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot open backend: {0}")]
    Storage(#[from] StorageError),
}

fn default_chunk_size() -> NonZeroUsize {
    DEFAULT_CHUNK_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Chunked {
                store: ChunkStoreKind::Memory,
                chunk_size: DEFAULT_CHUNK_SIZE,
                properties: BTreeMap::new(),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read(path.as_ref())?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Opens the configured backend.
    pub fn open_backend(&self) -> Result<Backend, ConfigError> {
        let backend = match &self.backend {
            BackendConfig::Direct { root } => Backend::direct(Arc::new(FileBinaryStore::new(root)?)),
            BackendConfig::Chunked { store: ChunkStoreKind::Memory, chunk_size, properties } => {
                let config = StoreConfig::new(MEMORY_LOADER).with_properties(properties.clone());
                Backend::chunked(Arc::new(MemoryChunkStore::with_config(config)), *chunk_size)
            }
            BackendConfig::Chunked { store: ChunkStoreKind::Redb { path }, chunk_size, properties } => {
                let config = StoreConfig::new(REDB_LOADER).with_properties(properties.clone());
                Backend::chunked(Arc::new(RedbChunkStore::with_config(path, config)?), *chunk_size)
            }
        };
        info!(backend = ?backend, "storage backend ready");
        Ok(backend)
    }
}
