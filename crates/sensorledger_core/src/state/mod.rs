//! World-state backend contracts and implementations.
//!
//! # Responsibility
//! - Define the narrow key-value contract the data point service depends on.
//! - Provide a lazy, page-by-page range scan over any backend.
//!
//! # Invariants
//! - Keys order bytewise; `scan_page` returns entries in ascending key order.
//! - An empty `end` bound means "no upper bound"; an empty `start` bound
//!   means "from the first key".
//! - Backends provide per-key atomicity; callers hold no lock across pages.

use crate::db::DbError;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStateStore;
pub use sqlite::SqliteStateStore;

/// Page size used when callers do not configure one.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 100;

pub type StateResult<T> = Result<T, StateError>;

/// Backend failure surfaced to core operations.
#[derive(Debug)]
pub enum StateError {
    Db(DbError),
    /// A writer panicked while holding the in-memory state lock.
    Poisoned,
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "world state backend error: {err}"),
            Self::Poisoned => write!(f, "world state lock poisoned"),
        }
    }
}

impl Error for StateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Poisoned => None,
        }
    }
}

impl From<DbError> for StateError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StateError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One `(key, value)` pair produced by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// Key-value backend consumed by core services.
pub trait StateStore {
    /// Returns the value at `key`, or `None` when absent.
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>>;

    /// Writes `value` at `key`, overwriting any previous value.
    fn put_state(&self, key: &str, value: &[u8]) -> StateResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn delete_state(&self, key: &str) -> StateResult<()>;

    /// Returns up to `limit` entries with `start <= key < end`, strictly
    /// after `after` when set, in ascending key order.
    fn scan_page(
        &self,
        start: &str,
        end: &str,
        after: Option<&str>,
        limit: usize,
    ) -> StateResult<Vec<StateEntry>>;

    /// Lazily iterates `start <= key < end`, fetching `page_size` entries
    /// per backend call.
    fn range_scan(&self, start: &str, end: &str, page_size: usize) -> RangeScan<'_, Self> {
        RangeScan::new(self, start, end, page_size)
    }
}

/// Lets a service borrow a store the caller keeps using directly.
impl<S: StateStore + ?Sized> StateStore for &S {
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StateResult<()> {
        (**self).put_state(key, value)
    }

    fn delete_state(&self, key: &str) -> StateResult<()> {
        (**self).delete_state(key)
    }

    fn scan_page(
        &self,
        start: &str,
        end: &str,
        after: Option<&str>,
        limit: usize,
    ) -> StateResult<Vec<StateEntry>> {
        (**self).scan_page(start, end, after, limit)
    }
}

/// Cursor over a key range, backed by repeated `scan_page` calls.
///
/// Each page resumes strictly after the last key already yielded, so keys
/// written behind the cursor are not revisited. A backend error is yielded
/// once and ends the scan.
pub struct RangeScan<'a, S: StateStore + ?Sized> {
    store: &'a S,
    start: String,
    end: String,
    page_size: usize,
    buffered: VecDeque<StateEntry>,
    last_key: Option<String>,
    exhausted: bool,
}

impl<'a, S: StateStore + ?Sized> RangeScan<'a, S> {
    pub fn new(store: &'a S, start: &str, end: &str, page_size: usize) -> Self {
        Self {
            store,
            start: start.to_string(),
            end: end.to_string(),
            page_size: page_size.max(1),
            buffered: VecDeque::new(),
            last_key: None,
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> StateResult<()> {
        let page = self.store.scan_page(
            &self.start,
            &self.end,
            self.last_key.as_deref(),
            self.page_size,
        )?;

        if page.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some(last) = page.last() {
            self.last_key = Some(last.key.clone());
        }
        self.buffered.extend(page);
        Ok(())
    }
}

impl<S: StateStore + ?Sized> Iterator for RangeScan<'_, S> {
    type Item = StateResult<StateEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffered.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffered.pop_front().map(Ok)
    }
}
