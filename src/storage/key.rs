use std::fmt;

use serde::{Deserialize, Serialize};

const DATA_SUFFIX: &str = "-data";

/// Opaque identifier of one stored binary value, scoped to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    pub fn new(key: impl Into<String>) -> Self {
        ContentKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentKey {
    fn from(value: &str) -> Self {
        ContentKey(value.to_string())
    }
}

impl From<String> for ContentKey {
    fn from(value: String) -> Self {
        ContentKey(value)
    }
}

/// Base key under which a chunked backend keeps the chunks of `key`.
pub fn data_key(key: &ContentKey) -> String {
    format!("{}{DATA_SUFFIX}", key.0)
}

/// Key of chunk `index` beneath `base`.
pub fn chunk_key(base: &str, index: u64) -> String {
    format!("{base}/{index}")
}
