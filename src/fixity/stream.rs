use std::io::{self, Read};

use crate::{
    error::CacheError,
    fixity::{digest::FixityDigest, uri::DigestUri},
};

/// Feeds every byte read from `inner` through a digest and counts it.
pub struct FixityReader<R> {
    inner: R,
    digest: Box<dyn FixityDigest>,
    count: u64,
}

impl<R: Read> FixityReader<R> {
    /// Tracks `inner` with a clone of `digest`; the caller's instance is never touched.
    pub fn new(inner: R, digest: &dyn FixityDigest) -> Result<Self, CacheError> {
        Ok(Self::with_digest(inner, digest.try_clone()?))
    }

    pub fn with_digest(inner: R, digest: Box<dyn FixityDigest>) -> Self {
        FixityReader { inner, digest, count: 0 }
    }

    pub fn current_digest(&self) -> Vec<u8> {
        self.digest.finalize()
    }

    pub fn digest_uri(&self) -> DigestUri {
        DigestUri::from_digest(self.digest.algorithm(), &self.current_digest())
    }

    pub fn bytes_read(&self) -> u64 {
        self.count
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for FixityReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.digest.update(&buf[..n]);
        self.count += n as u64;
        Ok(n)
    }
}
