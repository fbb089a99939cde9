use std::{collections::BTreeSet, fmt};

use serde::Serialize;

use crate::{entry::LowLevelCacheEntry, fixity::uri::DigestUri};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FixityState {
    Success,
    BadChecksum,
    BadSize,
}

impl fmt::Display for FixityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FixityState::Success => "SUCCESS",
            FixityState::BadChecksum => "BAD_CHECKSUM",
            FixityState::BadSize => "BAD_SIZE",
        })
    }
}

/// Verdict of one fixity check.
///
/// `status` holds `Success` alone when both digest and size match, otherwise
/// one flag per mismatching dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixityResult {
    entry: LowLevelCacheEntry,
    computed_digest: DigestUri,
    computed_size: u64,
    expected_digest: DigestUri,
    expected_size: u64,
    status: BTreeSet<FixityState>,
}

impl FixityResult {
    pub fn new(
        entry: LowLevelCacheEntry,
        computed_digest: DigestUri,
        computed_size: u64,
        expected_digest: DigestUri,
        expected_size: u64,
    ) -> Self {
        let mut status = BTreeSet::new();
        if computed_digest != expected_digest {
            status.insert(FixityState::BadChecksum);
        }
        if computed_size != expected_size {
            status.insert(FixityState::BadSize);
        }
        if status.is_empty() {
            status.insert(FixityState::Success);
        }
        FixityResult {
            entry,
            computed_digest,
            computed_size,
            expected_digest,
            expected_size,
            status,
        }
    }

    pub fn entry(&self) -> &LowLevelCacheEntry {
        &self.entry
    }

    pub fn computed_digest(&self) -> &DigestUri {
        &self.computed_digest
    }

    pub fn computed_size(&self) -> u64 {
        self.computed_size
    }

    pub fn expected_digest(&self) -> &DigestUri {
        &self.expected_digest
    }

    pub fn expected_size(&self) -> u64 {
        self.expected_size
    }

    pub fn status(&self) -> &BTreeSet<FixityState> {
        &self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.contains(&FixityState::Success)
    }
}

impl fmt::Display for FixityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status: Vec<String> = self.status.iter().map(ToString::to_string).collect();
        write!(
            f,
            "fixity of {} at {}: computed {} ({} bytes), expected {} ({} bytes) [{}]",
            self.entry.key(),
            self.entry.external_location(),
            self.computed_digest,
            self.computed_size,
            self.expected_digest,
            self.expected_size,
            status.join(",")
        )
    }
}
