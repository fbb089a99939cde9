use std::{fmt, num::NonZeroUsize, sync::Arc};

use crate::storage::api::{BinaryStore, ChunkStore};

pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(1024 * 1024) {
    Some(size) => size,
    None => panic!("default chunk size is zero"),
};

/// Name reported for chunked backends in diagnostic locations.
pub const CHUNKED_BACKEND_NAME: &str = "binstore::storage::ChunkedBinaryStore";

/// The storage implementation an entry is served from.
///
/// Equality is identity of the underlying store handles.
#[derive(Clone)]
pub enum Backend {
    Direct(Arc<dyn BinaryStore>),
    Chunked(ChunkedBackend),
}

impl Backend {
    pub fn direct(store: Arc<dyn BinaryStore>) -> Self {
        Backend::Direct(store)
    }

    pub fn chunked(chunk_store: Arc<dyn ChunkStore>, chunk_size: NonZeroUsize) -> Self {
        Backend::Chunked(ChunkedBackend::new(chunk_store, chunk_size))
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, Backend::Chunked(_))
    }

    pub fn chunk_store(&self) -> Option<&Arc<dyn ChunkStore>> {
        match self {
            Backend::Direct(_) => None,
            Backend::Chunked(chunked) => Some(&chunked.chunk_store),
        }
    }
}

impl PartialEq for Backend {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Backend::Direct(a), Backend::Direct(b)) => same_store(a, b),
            (Backend::Chunked(a), Backend::Chunked(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Backend {}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Direct(store) => f.debug_tuple("Direct").field(&store.describe()).finish(),
            Backend::Chunked(chunked) => fmt::Debug::fmt(chunked, f),
        }
    }
}

/// A chunk store plus the fixed chunk size used when writing to it.
#[derive(Clone)]
pub struct ChunkedBackend {
    chunk_store: Arc<dyn ChunkStore>,
    chunk_size: NonZeroUsize,
}

impl ChunkedBackend {
    pub fn new(chunk_store: Arc<dyn ChunkStore>, chunk_size: NonZeroUsize) -> Self {
        ChunkedBackend { chunk_store, chunk_size }
    }

    pub fn chunk_store(&self) -> &Arc<dyn ChunkStore> {
        &self.chunk_store
    }

    /// Size of the chunks new values are split into. Stored values keep the
    /// size recorded in their manifest.
    pub fn chunk_size(&self) -> NonZeroUsize {
        self.chunk_size
    }
}

impl PartialEq for ChunkedBackend {
    fn eq(&self, other: &Self) -> bool {
        same_store(&self.chunk_store, &other.chunk_store) && self.chunk_size == other.chunk_size
    }
}

impl Eq for ChunkedBackend {}

impl fmt::Debug for ChunkedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunked")
            .field("store", &self.chunk_store.config().to_string())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

// compares data pointers only; vtable pointers may differ across codegen units
fn same_store<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{memory::MemoryChunkStore, testing::size};

    #[test]
    fn chunked_backends_compare_by_store_identity_and_size() {
        let store: Arc<dyn ChunkStore> = Arc::new(MemoryChunkStore::new());
        let other: Arc<dyn ChunkStore> = Arc::new(MemoryChunkStore::new());

        assert_eq!(Backend::chunked(store.clone(), size(16)), Backend::chunked(store.clone(), size(16)));
        assert_ne!(Backend::chunked(store.clone(), size(16)), Backend::chunked(store.clone(), size(32)));
        assert_ne!(Backend::chunked(store, size(16)), Backend::chunked(other, size(16)));
    }

    #[test]
    fn only_chunked_backends_expose_a_chunk_store() {
        let backend = Backend::chunked(Arc::new(MemoryChunkStore::new()), size(8));
        assert!(backend.is_chunked());
        assert!(backend.chunk_store().is_some());
    }

    #[test]
    fn chunk_size_cannot_be_zero() {
        assert!(NonZeroUsize::new(0).is_none());
        assert_eq!(DEFAULT_CHUNK_SIZE.get(), 1024 * 1024);
        let chunked = ChunkedBackend::new(Arc::new(MemoryChunkStore::new()), size(1));
        assert_eq!(chunked.chunk_size().get(), 1);
    }
}
