//! Pluggable low-level binary storage with streaming fixity verification.
//!
//! A [`LowLevelCacheEntry`] gives uniform read/write access to the value stored
//! under one [`ContentKey`] in either a direct backend (one blob per value) or a
//! chunked backend (a value split across numbered chunks), and can re-check that
//! value against a recorded digest and size.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod chunk;
pub mod config;
pub mod entry;
pub mod error;
pub mod fixity;
pub mod storage;
pub mod util;

pub use entry::LowLevelCacheEntry;
pub use error::{CacheError, cache_error};
pub use fixity::{DigestUri, FixityDigest, FixityResult, FixityState, check_fixity, check_replicas};
pub use storage::{Backend, BinaryStore, ChunkStore, ContentKey, StorageError};
