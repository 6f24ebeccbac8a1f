//! In-memory world state for tests and ephemeral runs.

use super::{StateEntry, StateError, StateResult, StateStore};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

/// `BTreeMap`-backed state store.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> StateResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> StateResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> StateResult<MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.entries.lock().map_err(|_| StateError::Poisoned)
    }
}

impl StateStore for MemoryStateStore {
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StateResult<()> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete_state(&self, key: &str) -> StateResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn scan_page(
        &self,
        start: &str,
        end: &str,
        after: Option<&str>,
        limit: usize,
    ) -> StateResult<Vec<StateEntry>> {
        let (lower_key, lower) = match after {
            Some(after) if after >= start => (after, Bound::Excluded(after)),
            _ => (start, Bound::Included(start)),
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            // BTreeMap::range panics on an inverted range.
            if lower_key >= end {
                return Ok(Vec::new());
            }
            Bound::Excluded(end)
        };

        let entries = self.lock()?;
        Ok(entries
            .range::<str, _>((lower, upper))
            .take(limit)
            .map(|(key, value)| StateEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }
}
