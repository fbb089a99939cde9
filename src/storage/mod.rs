pub mod api;
pub mod backend;
pub mod error;
pub mod file_store;
pub mod key;
pub mod memory;
pub mod redb_store;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{BinaryStore, ChunkStore, StoreConfig};
pub use backend::{Backend, ChunkedBackend, DEFAULT_CHUNK_SIZE};
pub use error::StorageError;
pub use file_store::FileBinaryStore;
pub use key::{ContentKey, chunk_key, data_key};
pub use memory::MemoryChunkStore;
pub use redb_store::RedbChunkStore;
