use std::{
    fs::{self, File},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::storage::{api::BinaryStore, error::StorageError, key::ContentKey};

const COPY_BUFFER: usize = 64 * 1024;

/// Direct backend: each value is one file named after the SHA-1 of its bytes.
pub struct FileBinaryStore {
    root: PathBuf,
}

impl FileBinaryStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(FileBinaryStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/ab/cd/abcd…`; `None` for keys that are not plain file names.
    fn path_for(&self, key: &ContentKey) -> Option<PathBuf> {
        let k = key.as_str();
        if k.is_empty() || !k.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return None;
        }
        if k.len() < 4 {
            return Some(self.root.join(k));
        }
        Some(self.root.join(&k[..2]).join(&k[2..4]).join(k))
    }
}

impl BinaryStore for FileBinaryStore {
    fn name(&self) -> &str {
        "FileBinaryStore"
    }

    fn open(&self, key: &ContentKey) -> Result<Box<dyn Read + Send>, StorageError> {
        let not_found = || StorageError::NotFound { key: key.to_string() };
        let path = self.path_for(key).ok_or_else(not_found)?;
        match File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    fn store_value(&self, input: &mut dyn Read) -> Result<ContentKey, StorageError> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        let mut hasher = Sha1::new();
        let mut buf = vec![0u8; COPY_BUFFER];
        loop {
            let n = match input.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            hasher.update(&buf[..n]);
            tmp.write_all(&buf[..n])?;
        }
        tmp.as_file().sync_all()?;

        let key = ContentKey::new(hex::encode(hasher.finalize()));
        let Some(dest) = self.path_for(&key) else {
            return Err(StorageError::NotFound { key: key.to_string() });
        };
        if dest.exists() {
            debug!(key = %key, "value already stored");
            return Ok(key);
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        tmp.persist(&dest).map_err(|e| e.error)?;
        debug!(key = %key, path = %dest.display(), "stored value");
        Ok(key)
    }

    fn describe(&self) -> String {
        format!("FileBinaryStore[{}]", self.root.display())
    }
}
