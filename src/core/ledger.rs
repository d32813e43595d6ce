/// Interaction ledger: cumulative interaction counts between character pairs.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Accepted size of a single interaction update.
pub const COUNT_RANGE: RangeInclusive<i64> = 1..=100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("interaction count {0} is outside {min}..={max}", min = COUNT_RANGE.start(), max = COUNT_RANGE.end())]
    InvalidCount(i64),
    #[error("ledger lock poisoned by a panicking writer")]
    Poisoned,
}

/// Directed pair of character names. `(A, B)` and `(B, A)` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InteractionKey {
    pub source: String,
    pub target: String,
}

impl InteractionKey {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// One ledger entry as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionRecord<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub count: u64,
}

impl fmt::Display for InteractionRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}, {} times", self.source, self.target, self.count)
    }
}

/// Interaction counts for one session. Starts empty and only grows.
#[derive(Debug, Clone, Default)]
pub struct InteractionLedger {
    counts: FxHashMap<InteractionKey, u64>,
}

impl InteractionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` interactions from `source` to `target`, inserting the pair
    /// if it is new. Returns the pair's cumulative count.
    ///
    /// A count outside `COUNT_RANGE` is rejected and the ledger is untouched.
    pub fn add_interaction(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        count: i64,
    ) -> Result<u64, LedgerError> {
        if !COUNT_RANGE.contains(&count) {
            return Err(LedgerError::InvalidCount(count));
        }
        let total = self
            .counts
            .entry(InteractionKey::new(source, target))
            .or_insert(0);
        *total += count as u64;
        Ok(*total)
    }

    pub fn count(&self, source: &str, target: &str) -> Option<u64> {
        self.counts.get(&InteractionKey::new(source, target)).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Every pair with its count, in no particular order. Call again to restart.
    pub fn iter(&self) -> impl Iterator<Item = InteractionRecord<'_>> + '_ {
        self.counts.iter().map(|(key, count)| InteractionRecord {
            source: &key.source,
            target: &key.target,
            count: *count,
        })
    }
}

/// Owned copy of a ledger entry, for snapshots that outlive a lock.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnedInteraction {
    pub source: String,
    pub target: String,
    pub count: u64,
}

impl From<InteractionRecord<'_>> for OwnedInteraction {
    fn from(record: InteractionRecord<'_>) -> Self {
        Self {
            source: record.source.to_string(),
            target: record.target.to_string(),
            count: record.count,
        }
    }
}

/// Cloneable handle to one ledger for callers on several threads.
/// Each update holds the lock for the whole lookup-and-increment.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<InteractionLedger>>,
}

impl SharedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_interaction(
        &self,
        source: impl Into<String>,
        target: impl Into<String>,
        count: i64,
    ) -> Result<u64, LedgerError> {
        let mut ledger = self.inner.lock().map_err(|_| LedgerError::Poisoned)?;
        ledger.add_interaction(source, target, count)
    }

    pub fn count(&self, source: &str, target: &str) -> Result<Option<u64>, LedgerError> {
        let ledger = self.inner.lock().map_err(|_| LedgerError::Poisoned)?;
        Ok(ledger.count(source, target))
    }

    /// Current entries, sorted by source then target.
    pub fn snapshot(&self) -> Result<Vec<OwnedInteraction>, LedgerError> {
        let ledger = self.inner.lock().map_err(|_| LedgerError::Poisoned)?;
        let mut entries: Vec<OwnedInteraction> = ledger.iter().map(Into::into).collect();
        entries.sort();
        Ok(entries)
    }
}
