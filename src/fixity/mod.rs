//! Streaming digest re-computation and comparison against recorded values.

pub mod digest;
pub mod result;
pub mod stream;
pub mod uri;

use std::io;

use tracing::{debug, info, warn};

pub use self::digest::{FixityDigest, HashDigest, digest_for_algorithm};
pub use result::{FixityResult, FixityState};
pub use stream::FixityReader;
pub use uri::{DigestUri, DigestUriError};

use crate::{entry::LowLevelCacheEntry, error::CacheError};

/// Re-reads the value behind `entry` and compares it against `expected_digest`
/// and `expected_size`.
///
/// `digest` is cloned before any I/O. Read failures while draining surface as
/// [`CacheError::FixityCheckFailed`]; no partial result is produced.
pub fn check_fixity(
    entry: &LowLevelCacheEntry,
    expected_digest: &DigestUri,
    expected_size: u64,
    digest: &dyn FixityDigest,
) -> Result<FixityResult, CacheError> {
    let accumulator = digest.try_clone()?;
    let mut reader = FixityReader::with_digest(entry.open_read()?, accumulator);

    io::copy(&mut reader, &mut io::sink()).map_err(CacheError::FixityCheckFailed)?;

    let result = FixityResult::new(
        entry.clone(),
        reader.digest_uri(),
        reader.bytes_read(),
        expected_digest.clone(),
        expected_size,
    );
    debug!(%result, "fixity checked");
    Ok(result)
}

/// Checks every replica of one binary, in order. Detects only; never repairs.
pub fn check_replicas(
    entries: &[LowLevelCacheEntry],
    expected_digest: &DigestUri,
    expected_size: u64,
    digest: &dyn FixityDigest,
) -> Vec<Result<FixityResult, CacheError>> {
    let results: Vec<_> = entries
        .iter()
        .map(|entry| check_fixity(entry, expected_digest, expected_size, digest))
        .collect();

    let passed = results.iter().filter(|r| matches!(r, Ok(res) if res.is_success())).count();
    let errored = results.iter().filter(|r| r.is_err()).count();
    if passed == results.len() {
        info!(replicas = results.len(), "all replicas passed fixity");
    } else {
        warn!(
            replicas = results.len(),
            passed,
            errored,
            mismatched = results.len() - passed - errored,
            "replica fixity problems"
        );
    }
    results
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::{
        error::cache_error,
        fixity::digest::{blake2b, md5, sha1, sha256},
        storage::{
            Backend, BinaryStore, ChunkStore, ContentKey, FileBinaryStore, MemoryChunkStore,
            StorageError, testing::size,
        },
    };

    struct PinnedDigest;

    impl FixityDigest for PinnedDigest {
        fn algorithm(&self) -> &str {
            "pinned"
        }
        fn update(&mut self, _data: &[u8]) {}
        fn reset(&mut self) {}
        fn finalize(&self) -> Vec<u8> {
            Vec::new()
        }
        fn try_clone(&self) -> Result<Box<dyn FixityDigest>, CacheError> {
            Err(CacheError::UnsupportedDigestClone { algorithm: "pinned".into() })
        }
    }

    fn digest_of(data: &[u8], digest: &dyn FixityDigest) -> DigestUri {
        let mut d = digest.try_clone().unwrap();
        d.update(data);
        DigestUri::from_digest(d.algorithm(), &d.finalize())
    }

    fn chunked_entry(data: &[u8], chunk_size: usize) -> (Arc<MemoryChunkStore>, LowLevelCacheEntry) {
        let store = Arc::new(MemoryChunkStore::new());
        let entry =
            LowLevelCacheEntry::new(Backend::chunked(store.clone(), size(chunk_size)), ContentKey::from("obj"));
        entry.store(&mut &data[..]).unwrap();
        (store, entry)
    }

    #[test]
    fn matching_value_succeeds_for_every_algorithm() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let (_store, entry) = chunked_entry(data, 8);
        let digests: [Box<dyn FixityDigest>; 4] =
            [Box::new(md5()), Box::new(sha1()), Box::new(sha256()), Box::new(blake2b())];
        for digest in &digests {
            let expected = digest_of(data, digest.as_ref());
            let result = check_fixity(&entry, &expected, data.len() as u64, digest.as_ref()).unwrap();
            assert_eq!(result.status().iter().copied().collect::<Vec<_>>(), vec![FixityState::Success]);
            assert_eq!(result.computed_digest(), &expected);
            assert_eq!(result.entry(), &entry);
        }
    }

    #[test]
    fn mismatches_are_flagged_per_dimension() {
        let data = b"fixity payload";
        let (_store, entry) = chunked_entry(data, 4);
        let right = digest_of(data, &sha1());
        let wrong = digest_of(b"fixity pAyload", &sha1());
        let len = data.len() as u64;

        let r = check_fixity(&entry, &wrong, len, &sha1()).unwrap();
        assert!(r.status().contains(&FixityState::BadChecksum));
        assert!(!r.status().contains(&FixityState::BadSize));

        let r = check_fixity(&entry, &right, len + 1, &sha1()).unwrap();
        assert_eq!(r.status().len(), 1);
        assert!(r.status().contains(&FixityState::BadSize));

        let r = check_fixity(&entry, &wrong, len - 1, &sha1()).unwrap();
        assert!(r.status().contains(&FixityState::BadChecksum));
        assert!(r.status().contains(&FixityState::BadSize));
        assert!(!r.is_success());
    }

    #[test]
    fn repeated_checks_agree() {
        let (_store, entry) = chunked_entry(b"stable bytes", 5);
        let expected = digest_of(b"stable bytes", &sha256());
        let first = check_fixity(&entry, &expected, 12, &sha256()).unwrap();
        let second = check_fixity(&entry, &expected, 12, &sha256()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn caller_digest_is_left_untouched() {
        let (_store, entry) = chunked_entry(b"abc", 2);
        let digest = sha1();
        let before = digest.finalize();
        check_fixity(&entry, &digest_of(b"abc", &sha1()), 3, &digest).unwrap();
        assert_eq!(digest.finalize(), before);
    }

    #[test]
    fn uncloneable_digest_aborts_before_io() {
        // nothing stored: any read would fail with NotFound
        let entry = LowLevelCacheEntry::new(
            Backend::chunked(Arc::new(MemoryChunkStore::new()), size(4)),
            ContentKey::from("absent"),
        );
        let expected = digest_of(b"", &sha1());
        let err = check_fixity(&entry, &expected, 0, &PinnedDigest).unwrap_err();
        assert!(matches!(err, CacheError::UnsupportedDigestClone { .. }));
    }

    #[test]
    fn missing_value_is_backend_unavailable() {
        let entry = LowLevelCacheEntry::new(
            Backend::chunked(Arc::new(MemoryChunkStore::new()), size(4)),
            ContentKey::from("absent"),
        );
        let err = check_fixity(&entry, &digest_of(b"", &sha1()), 0, &sha1()).unwrap_err();
        assert!(matches!(err, CacheError::BackendUnavailable(StorageError::NotFound { .. })));
    }

    #[test]
    fn corrupt_sequence_fails_the_check() {
        let (store, entry) = chunked_entry(b"aaaabbbbcccc", 4);
        store.remove("obj-data/1").unwrap();
        let err = check_fixity(&entry, &digest_of(b"aaaabbbbcccc", &sha1()), 12, &sha1()).unwrap_err();
        let io_err = match err {
            CacheError::FixityCheckFailed(e) => e,
            other => panic!("unexpected {other:?}"),
        };
        assert!(matches!(cache_error(&io_err), Some(CacheError::CorruptChunkSequence { .. })));
    }

    #[test]
    fn direct_backend_values_are_checked_too() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileBinaryStore::new(dir.path()).unwrap());
        let key = store.store_value(&mut &b"direct bytes"[..]).unwrap();
        let entry = LowLevelCacheEntry::new(Backend::direct(store), key);
        let result =
            check_fixity(&entry, &digest_of(b"direct bytes", &sha1()), 12, &sha1()).unwrap();
        assert!(result.is_success());
    }

    #[test]
    fn replicas_are_reported_in_order() {
        let (_a, good) = chunked_entry(b"replica", 3);
        let (_b, bad) = chunked_entry(b"replicA", 3);
        let missing = LowLevelCacheEntry::new(
            Backend::chunked(Arc::new(MemoryChunkStore::new()), size(3)),
            ContentKey::from("obj"),
        );
        let results =
            check_replicas(&[good, bad, missing], &digest_of(b"replica", &sha1()), 7, &sha1());
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().is_success());
        assert_eq!(
            results[1].as_ref().unwrap().status().iter().copied().collect::<Vec<_>>(),
            vec![FixityState::BadChecksum]
        );
        assert!(matches!(results[2], Err(CacheError::BackendUnavailable(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn correct_expectations_always_succeed(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            chunk_size in 1usize..300,
        ) {
            let (_store, entry) = chunked_entry(&data, chunk_size);
            let expected = digest_of(&data, &sha256());
            let result = check_fixity(&entry, &expected, data.len() as u64, &sha256()).unwrap();
            prop_assert_eq!(result.status().iter().copied().collect::<Vec<_>>(), vec![FixityState::Success]);
            prop_assert_eq!(result.computed_size(), data.len() as u64);
        }
    }
}
