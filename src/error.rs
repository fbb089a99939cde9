use std::io;

use thiserror::Error;

use crate::storage::error::StorageError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] StorageError),

    #[error("corrupt chunk sequence under `{key}`: {reason}")]
    CorruptChunkSequence { key: String, reason: String },

    #[error("failed to commit chunk {chunk_index}: {source}")]
    ChunkCommitFailed {
        chunk_index: u64,
        #[source]
        source: StorageError,
    },

    #[error("write rejected, chunk {chunk_index} failed to commit")]
    WriterFailed { chunk_index: u64 },

    #[error("digest `{algorithm}` cannot be cloned")]
    UnsupportedDigestClone { algorithm: String },

    #[error("fixity check failed: {0}")]
    FixityCheckFailed(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CacheError {
    pub(crate) fn corrupt(key: &str, reason: impl Into<String>) -> Self {
        CacheError::CorruptChunkSequence { key: key.to_string(), reason: reason.into() }
    }

    /// Wraps the error for transport through `io::Read`/`io::Write`.
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            CacheError::Io(e) => e,
            other => io::Error::other(other),
        }
    }

    /// Recovers a typed error from an `io::Error`, or wraps it as `Io`.
    pub fn from_io(err: io::Error) -> Self {
        if cache_error(&err).is_none() {
            return CacheError::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<CacheError>()) {
            Some(Ok(typed)) => *typed,
            Some(Err(other)) => CacheError::Io(io::Error::new(kind, other)),
            None => CacheError::Io(kind.into()),
        }
    }
}

/// The typed error carried by an `io::Error` produced in this crate, if any.
pub fn cache_error(err: &io::Error) -> Option<&CacheError> {
    err.get_ref().and_then(|inner| inner.downcast_ref::<CacheError>())
}
