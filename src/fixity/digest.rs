use blake2::Blake2b512;
use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::error::CacheError;

/// Incremental digest accumulator used by fixity checks.
pub trait FixityDigest: Send {
    /// Canonical lowercase name, as it appears in digest URIs.
    fn algorithm(&self) -> &str;

    fn update(&mut self, data: &[u8]);

    fn reset(&mut self);

    /// Digest of everything fed so far. The accumulator itself is not consumed.
    fn finalize(&self) -> Vec<u8>;

    /// Independent copy carrying the same state.
    fn try_clone(&self) -> Result<Box<dyn FixityDigest>, CacheError>;
}

/// A [`FixityDigest`] backed by a RustCrypto hash.
#[derive(Clone)]
pub struct HashDigest<D> {
    algorithm: &'static str,
    hasher: D,
}

impl<D: Digest> HashDigest<D> {
    pub fn new(algorithm: &'static str) -> Self {
        HashDigest { algorithm, hasher: D::new() }
    }
}

impl<D> FixityDigest for HashDigest<D>
where
    D: Digest + Clone + Send + 'static,
{
    fn algorithm(&self) -> &str {
        self.algorithm
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    fn reset(&mut self) {
        self.hasher = D::new();
    }

    fn finalize(&self) -> Vec<u8> {
        self.hasher.clone().finalize().to_vec()
    }

    fn try_clone(&self) -> Result<Box<dyn FixityDigest>, CacheError> {
        Ok(Box::new(self.clone()))
    }
}

pub fn md5() -> HashDigest<Md5> {
    HashDigest::new("md5")
}

pub fn sha1() -> HashDigest<Sha1> {
    HashDigest::new("sha1")
}

pub fn sha256() -> HashDigest<Sha256> {
    HashDigest::new("sha256")
}

pub fn sha512() -> HashDigest<Sha512> {
    HashDigest::new("sha512")
}

pub fn blake2b() -> HashDigest<Blake2b512> {
    HashDigest::new("blake2b")
}

/// Canonical name for `name`; accepts forms like `SHA-1`, `sha_256` or `BLAKE2b-512`.
pub fn canonical_algorithm(name: &str) -> Option<&'static str> {
    let folded: String =
        name.chars().filter(|c| *c != '-' && *c != '_').map(|c| c.to_ascii_lowercase()).collect();
    match folded.as_str() {
        "md5" => Some("md5"),
        "sha1" => Some("sha1"),
        "sha256" => Some("sha256"),
        "sha512" => Some("sha512"),
        "blake2b" | "blake2b512" => Some("blake2b"),
        _ => None,
    }
}

/// A fresh accumulator for the named algorithm.
pub fn digest_for_algorithm(name: &str) -> Option<Box<dyn FixityDigest>> {
    let digest: Box<dyn FixityDigest> = match canonical_algorithm(name)? {
        "md5" => Box::new(md5()),
        "sha1" => Box::new(sha1()),
        "sha256" => Box::new(sha256()),
        "sha512" => Box::new(sha512()),
        _ => Box::new(blake2b()),
    };
    Some(digest)
}
