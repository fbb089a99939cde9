use std::{collections::BTreeMap, fmt, io::Read, path::PathBuf};

use crate::storage::{error::StorageError, key::ContentKey};

/// A backend that keeps every value as one opaque blob.
pub trait BinaryStore: Send + Sync {
    /// Implementation name, used in diagnostics.
    fn name(&self) -> &str;

    fn open(&self, key: &ContentKey) -> Result<Box<dyn Read + Send>, StorageError>;

    /// Persists the bytes of `input`. The store decides the key of the new value.
    fn store_value(&self, input: &mut dyn Read) -> Result<ContentKey, StorageError>;

    fn describe(&self) -> String;
}

/// Key/value store holding individually addressed chunks.
pub trait ChunkStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Deletes `key`; `Ok(false)` if nothing was stored under it.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;

    fn config(&self) -> &StoreConfig;
}

/// Queryable configuration of a chunk store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    loader: String,
    location: Option<PathBuf>,
    properties: BTreeMap<String, String>,
}

impl StoreConfig {
    pub fn new(loader: impl Into<String>) -> Self {
        StoreConfig { loader: loader.into(), ..Default::default() }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Identifier of the loader implementation backing the store.
    pub fn loader(&self) -> &str {
        &self.loader
    }

    /// File-system location, for stores that live on disk.
    pub fn location(&self) -> Option<&PathBuf> {
        self.location.as_ref()
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.loader)?;
        for (i, (k, v)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}
