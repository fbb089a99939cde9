//! Chunk stores with injected behaviour, for tests.

use std::{
    num::NonZeroUsize,
    sync::{
        Mutex, Once,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::storage::{
    api::{ChunkStore, StoreConfig},
    error::StorageError,
    memory::MemoryChunkStore,
};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).with_test_writer().init();
    });
}

pub fn size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).expect("test chunk size must be positive")
}

fn refused(key: &str) -> StorageError {
    StorageError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        format!("store refused `{key}`"),
    ))
}

/// Accepts `allowed` commits, then refuses every further one. Removals are not counted.
pub struct FailingChunkStore {
    pub inner: MemoryChunkStore,
    allowed: usize,
    commits: AtomicUsize,
}

impl FailingChunkStore {
    pub fn after(allowed: usize) -> Self {
        FailingChunkStore { inner: MemoryChunkStore::new(), allowed, commits: AtomicUsize::new(0) }
    }
}

impl ChunkStore for FailingChunkStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.load(key)
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if self.commits.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(refused(key));
        }
        self.inner.store(key, bytes)
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.remove(key)
    }

    fn config(&self) -> &StoreConfig {
        self.inner.config()
    }
}

/// Records the key of every commit, in order.
pub struct RecordingChunkStore {
    pub inner: MemoryChunkStore,
    pub commits: Mutex<Vec<(String, usize)>>,
}

impl RecordingChunkStore {
    pub fn new() -> Self {
        RecordingChunkStore { inner: MemoryChunkStore::new(), commits: Mutex::new(Vec::new()) }
    }

    pub fn committed(&self) -> Vec<(String, usize)> {
        self.commits.lock().unwrap().clone()
    }
}

impl ChunkStore for RecordingChunkStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.load(key)
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.commits.lock().unwrap().push((key.to_string(), bytes.len()));
        self.inner.store(key, bytes)
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.remove(key)
    }

    fn config(&self) -> &StoreConfig {
        self.inner.config()
    }
}

/// Serves loads from `inner` until `key` is requested, which fails.
pub struct UnreachableKeyStore {
    pub inner: MemoryChunkStore,
    pub key: String,
}

impl ChunkStore for UnreachableKeyStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if key == self.key {
            return Err(refused(key));
        }
        self.inner.load(key)
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.inner.store(key, bytes)
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.remove(key)
    }

    fn config(&self) -> &StoreConfig {
        self.inner.config()
    }
}
