use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use redb::{Database, ReadableTableMetadata, TableDefinition};
use tracing::debug;

use crate::storage::{
    api::{ChunkStore, StoreConfig},
    error::StorageError,
};

const CHUNKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("chunks");

pub const REDB_LOADER: &str = "binstore::storage::RedbChunkStore";

/// Chunk store persisted in a single redb database file.
pub struct RedbChunkStore {
    db: Arc<Database>,
    config: StoreConfig,
}

impl RedbChunkStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::with_config(path.as_ref(), StoreConfig::new(REDB_LOADER))
    }

    /// Opens the database at `path`; the location of `config` is set to `path`.
    pub fn with_config(path: &Path, config: StoreConfig) -> Result<Self, StorageError> {
        let db = Database::create(path)?;

        // the table must exist before the first read transaction
        let txn = db.begin_write()?;
        txn.open_table(CHUNKS_TABLE)?;
        txn.commit()?;

        debug!(path = %path.display(), "opened redb chunk store");
        Ok(RedbChunkStore { db: Arc::new(db), config: config.with_location(PathBuf::from(path)) })
    }

    pub fn len(&self) -> Result<u64, StorageError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CHUNKS_TABLE)?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl ChunkStore for RedbChunkStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CHUNKS_TABLE)?;
        match table.get(key)? {
            Some(value_guard) => Ok(Some(value_guard.value().to_vec())),
            None => Ok(None),
        }
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(CHUNKS_TABLE)?;
            table.insert(key, bytes)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(CHUNKS_TABLE)?;
            table.remove(key)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    fn config(&self) -> &StoreConfig {
        &self.config
    }
}
