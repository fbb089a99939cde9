use std::{
    io::{self, Write},
    num::NonZeroUsize,
    sync::Arc,
};

use tracing::{debug, trace, warn};

use crate::{
    chunk::manifest::ChunkManifest,
    error::CacheError,
    storage::{api::ChunkStore, error::StorageError, key::chunk_key},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    Failed { chunk_index: u64 },
    Finished,
}

/// Splits a byte stream into fixed-size chunks committed in ascending order.
///
/// Call [`ChunkWriter::finish`] to commit the final chunk and the manifest; a
/// writer dropped while still open finishes itself and only logs failures.
///
/// Any value already stored under the base key loses its manifest before the
/// first chunk is committed, so an interrupted overwrite reads as corrupt
/// rather than as a mix of old and new chunks.
pub struct ChunkWriter {
    store: Arc<dyn ChunkStore>,
    base: String,
    chunk_size: usize,
    buffer: Vec<u8>,
    committed: u64,
    length: u64,
    // chunk count of the value being overwritten
    replaced: u64,
    state: WriterState,
}

impl ChunkWriter {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        base: impl Into<String>,
        chunk_size: NonZeroUsize,
    ) -> Result<Self, CacheError> {
        let base = base.into();
        let replaced = match ChunkManifest::load(store.as_ref(), &base) {
            Ok(previous) => previous.map_or(0, |m| m.chunks),
            Err(StorageError::Manifest(e)) => {
                warn!(base = %base, error = %e, "overwriting unreadable manifest");
                0
            }
            Err(e) => return Err(e.into()),
        };
        if store.remove(&base)? {
            debug!(base = %base, chunks = replaced, "previous value invalidated");
        }

        let chunk_size = chunk_size.get();
        Ok(ChunkWriter {
            store,
            base,
            chunk_size,
            buffer: Vec::with_capacity(chunk_size),
            committed: 0,
            length: 0,
            replaced,
            state: WriterState::Open,
        })
    }

    pub fn chunks_committed(&self) -> u64 {
        self.committed
    }

    pub fn bytes_written(&self) -> u64 {
        self.length
    }

    pub fn write_bytes(&mut self, mut data: &[u8]) -> Result<(), CacheError> {
        self.ensure_open()?;
        while !data.is_empty() {
            let take = (self.chunk_size - self.buffer.len()).min(data.len());
            self.buffer.extend_from_slice(&data[..take]);
            self.length += take as u64;
            data = &data[take..];
            if self.buffer.len() == self.chunk_size {
                self.commit_chunk()?;
            }
        }
        Ok(())
    }

    /// Commits the pending partial chunk and the terminating manifest.
    pub fn finish(&mut self) -> Result<ChunkManifest, CacheError> {
        self.ensure_open()?;
        // an empty stream still commits chunk 0
        if !self.buffer.is_empty() || self.committed == 0 {
            self.commit_chunk()?;
        }

        let manifest =
            ChunkManifest { chunks: self.committed, length: self.length, chunk_size: self.chunk_size };
        if let Err(source) = manifest.commit(self.store.as_ref(), &self.base) {
            return Err(self.fail(self.committed, source));
        }
        self.state = WriterState::Finished;
        debug!(base = %self.base, chunks = manifest.chunks, length = manifest.length, "chunk sequence committed");
        self.remove_stale_chunks();
        Ok(manifest)
    }

    // readers stop at the manifest's count, so leftovers only cost space
    fn remove_stale_chunks(&mut self) {
        for index in self.committed..self.replaced {
            let key = chunk_key(&self.base, index);
            if let Err(e) = self.store.remove(&key) {
                warn!(key = %key, error = %e, "stale chunk not removed");
            }
        }
        self.replaced = 0;
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Failed { chunk_index } => Err(CacheError::WriterFailed { chunk_index }),
            WriterState::Finished => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "chunk writer already finished").into())
            }
        }
    }

    fn commit_chunk(&mut self) -> Result<(), CacheError> {
        let index = self.committed;
        let key = chunk_key(&self.base, index);
        if let Err(source) = self.store.store(&key, &self.buffer) {
            return Err(self.fail(index, source));
        }
        trace!(key = %key, len = self.buffer.len(), "chunk committed");
        self.committed += 1;
        self.buffer.clear();
        Ok(())
    }

    fn fail(&mut self, chunk_index: u64, source: StorageError) -> CacheError {
        warn!(base = %self.base, chunk_index, error = %source, "chunk commit failed");
        self.state = WriterState::Failed { chunk_index };
        self.buffer.clear();
        CacheError::ChunkCommitFailed { chunk_index, source }
    }
}

impl Write for ChunkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf).map_err(CacheError::into_io)?;
        Ok(buf.len())
    }

    // chunks are fixed-size; only finish() may commit a short one
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ChunkWriter {
    fn drop(&mut self) {
        if self.state == WriterState::Open {
            if let Err(e) = self.finish() {
                warn!(base = %self.base, error = %e, "chunk writer dropped unfinished");
            }
        }
    }
}
