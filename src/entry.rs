use std::{
    io::{ErrorKind, Read},
    sync::Arc,
};

use tracing::debug;

use crate::{
    chunk::{ChunkReader, ChunkWriter},
    error::CacheError,
    fixity::{self, DigestUri, FixityDigest, FixityResult},
    storage::{
        api::{ChunkStore, StoreConfig},
        backend::{Backend, CHUNKED_BACKEND_NAME},
        key::{ContentKey, data_key},
    },
};

const COPY_BUFFER: usize = 64 * 1024;

type LocationSource = fn(&StoreConfig) -> Option<String>;

// first match wins
const LOCATION_SOURCES: [LocationSource; 2] = [configured_id, configured_location];

fn configured_id(config: &StoreConfig) -> Option<String> {
    config.property("id").map(str::to_string)
}

fn configured_location(config: &StoreConfig) -> Option<String> {
    config.location().map(|path| path.display().to_string())
}

/// Uniform access to the value stored under one content key in one backend.
///
/// Holds no resources of its own; every stream it hands out is owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowLevelCacheEntry {
    backend: Backend,
    key: ContentKey,
}

impl LowLevelCacheEntry {
    pub fn new(backend: Backend, key: ContentKey) -> Self {
        LowLevelCacheEntry { backend, key }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    pub fn chunk_store(&self) -> Option<&Arc<dyn ChunkStore>> {
        self.backend.chunk_store()
    }

    pub fn open_read(&self) -> Result<Box<dyn Read + Send>, CacheError> {
        match &self.backend {
            Backend::Direct(store) => Ok(store.open(&self.key)?),
            Backend::Chunked(chunked) => {
                let reader = ChunkReader::open(chunked.chunk_store().clone(), data_key(&self.key))?;
                Ok(Box::new(reader))
            }
        }
    }

    /// Persists all of `input` as this entry's value and returns the key it is
    /// now stored under.
    ///
    /// Chunked backends keep the entry's key. A direct backend assigns its own
    /// key, which may differ from the entry's.
    pub fn store(&self, input: &mut dyn Read) -> Result<ContentKey, CacheError> {
        match &self.backend {
            Backend::Direct(store) => {
                let key = store.store_value(input)?;
                if key != self.key {
                    debug!(requested = %self.key, assigned = %key, "backend assigned a new key");
                }
                Ok(key)
            }
            Backend::Chunked(chunked) => {
                let mut writer = ChunkWriter::new(
                    chunked.chunk_store().clone(),
                    data_key(&self.key),
                    chunked.chunk_size(),
                )?;
                // finish even when the copy failed, so no chunk is left without a terminator
                let copied = copy_to_chunks(input, &mut writer);
                let finished = writer.finish();
                let written = copied?;
                finished?;
                debug!(key = %self.key, bytes = written, "value stored");
                Ok(self.key.clone())
            }
        }
    }

    /// Diagnostic description of where the value lives. Never fails.
    pub fn external_location(&self) -> String {
        match &self.backend {
            Backend::Direct(store) => store.describe(),
            Backend::Chunked(chunked) => {
                let config = chunked.chunk_store().config();
                let location = LOCATION_SOURCES
                    .iter()
                    .find_map(|source| source(config))
                    .unwrap_or_else(|| config.to_string());
                format!("{CHUNKED_BACKEND_NAME}:{}:{location}", config.loader())
            }
        }
    }

    pub fn check_fixity(
        &self,
        expected_digest: &DigestUri,
        expected_size: u64,
        digest: &dyn FixityDigest,
    ) -> Result<FixityResult, CacheError> {
        fixity::check_fixity(self, expected_digest, expected_size, digest)
    }
}

fn copy_to_chunks(input: &mut dyn Read, writer: &mut ChunkWriter) -> Result<u64, CacheError> {
    let mut buf = vec![0u8; COPY_BUFFER];
    let mut total = 0u64;
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CacheError::from_io(e)),
        };
        writer.write_bytes(&buf[..n])?;
        total += n as u64;
    }
}
