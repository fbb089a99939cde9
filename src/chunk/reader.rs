use std::{
    io::{self, Read},
    sync::Arc,
};

use tracing::trace;

use crate::{
    chunk::manifest::ChunkManifest,
    error::CacheError,
    storage::{api::ChunkStore, error::StorageError, key::chunk_key},
};

/// Reassembles a chunk sequence into one byte stream, chunk 0 first.
///
/// The manifest under the base key is read before any chunk. It fixes how
/// many chunks belong to the value, their size and the total length, so
/// chunks left behind by an older, longer value are never read.
pub struct ChunkReader {
    store: Arc<dyn ChunkStore>,
    base: String,
    manifest: ChunkManifest,
    next_index: u64,
    current: Vec<u8>,
    pos: usize,
    delivered: u64,
}

impl ChunkReader {
    /// Resolves the manifest, so a missing or unterminated value fails here
    /// instead of on the first read.
    pub fn open(store: Arc<dyn ChunkStore>, base: impl Into<String>) -> Result<Self, CacheError> {
        let base = base.into();
        let Some(manifest) = ChunkManifest::load(store.as_ref(), &base)? else {
            return Err(match store.load(&chunk_key(&base, 0))? {
                None => StorageError::NotFound { key: base }.into(),
                Some(_) => CacheError::corrupt(&base, "chunks present without a terminator"),
            });
        };
        if manifest.chunk_size == 0 {
            return Err(CacheError::corrupt(&base, "manifest records a zero chunk size"));
        }

        trace!(base = %base, chunks = manifest.chunks, length = manifest.length, "manifest loaded");
        Ok(ChunkReader {
            store,
            base,
            manifest,
            next_index: 0,
            current: Vec::new(),
            pos: 0,
            delivered: 0,
        })
    }

    pub fn manifest(&self) -> &ChunkManifest {
        &self.manifest
    }

    pub fn bytes_delivered(&self) -> u64 {
        self.delivered
    }

    /// Loads the next chunk. `Ok(false)` once all chunks the manifest names are delivered.
    fn advance(&mut self) -> Result<bool, CacheError> {
        let ChunkManifest { chunks, length, chunk_size } = self.manifest;
        if self.next_index == chunks {
            if self.delivered != length {
                return Err(CacheError::corrupt(
                    &self.base,
                    format!("{chunks} chunks hold {} bytes, manifest records {length}", self.delivered),
                ));
            }
            return Ok(false);
        }

        let key = chunk_key(&self.base, self.next_index);
        let Some(chunk) = self.store.load(&key)? else {
            return Err(CacheError::corrupt(
                &self.base,
                format!("chunk {} of {chunks} is missing", self.next_index),
            ));
        };

        // only the last chunk may be short
        let last = self.next_index + 1 == chunks;
        if chunk.len() > chunk_size || (!last && chunk.len() != chunk_size) {
            return Err(CacheError::corrupt(
                &self.base,
                format!("chunk {} holds {} bytes, chunk size is {chunk_size}", self.next_index, chunk.len()),
            ));
        }

        trace!(key = %key, len = chunk.len(), "chunk loaded");
        self.next_index += 1;
        self.current = chunk;
        self.pos = 0;
        Ok(true)
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos == self.current.len() {
            if !self.advance().map_err(CacheError::into_io)? {
                return Ok(0);
            }
        }

        let n = buf.len().min(self.current.len() - self.pos);
        buf[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
        self.pos += n;
        self.delivered += n as u64;
        Ok(n)
    }
}
