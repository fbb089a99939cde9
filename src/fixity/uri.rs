use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::fixity::digest::canonical_algorithm;

/// Algorithm-qualified digest identifier, written `urn:<algorithm>:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DigestUri {
    algorithm: String,
    hex: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum DigestUriError {
    #[error("missing `<algorithm>:` prefix")]
    MissingAlgorithm,

    #[error("empty digest value")]
    EmptyDigest,

    #[error("digest value is not hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl DigestUri {
    /// Builds the URI for a raw digest. Known algorithm names are canonicalised.
    pub fn from_digest(algorithm: &str, digest: &[u8]) -> Self {
        DigestUri { algorithm: normalize(algorithm), hex: hex::encode(digest) }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

fn normalize(algorithm: &str) -> String {
    canonical_algorithm(algorithm).map_or_else(|| algorithm.to_ascii_lowercase(), str::to_string)
}

impl FromStr for DigestUri {
    type Err = DigestUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let rest = s.strip_prefix("urn:").unwrap_or(s);
        let (algorithm, value) = rest.rsplit_once(':').ok_or(DigestUriError::MissingAlgorithm)?;
        if algorithm.is_empty() {
            return Err(DigestUriError::MissingAlgorithm);
        }
        if value.is_empty() {
            return Err(DigestUriError::EmptyDigest);
        }
        let bytes = hex::decode(value)?;
        Ok(DigestUri::from_digest(algorithm, &bytes))
    }
}

impl fmt::Display for DigestUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "urn:{}:{}", self.algorithm, self.hex)
    }
}
