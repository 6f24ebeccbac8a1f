//! SQLite-backed world state.
//!
//! # Invariants
//! - Connections passed in must come from `db::open_db*` (migrated schema).
//! - `state_key` uses SQLite's default BINARY collation, so ordering is bytewise
//!   and matches `MemoryStateStore`.

use super::{StateEntry, StateResult, StateStore};
use rusqlite::{params, Connection, OptionalExtension};

/// World state stored in the `world_state` table.
pub struct SqliteStateStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStateStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StateStore for SqliteStateStore<'_> {
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT state_value FROM world_state WHERE state_key = ?1;",
                [key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StateResult<()> {
        self.conn.execute(
            "INSERT INTO world_state (state_key, state_value) VALUES (?1, ?2)
             ON CONFLICT(state_key) DO UPDATE SET state_value = excluded.state_value;",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete_state(&self, key: &str) -> StateResult<()> {
        self.conn
            .execute("DELETE FROM world_state WHERE state_key = ?1;", [key])?;
        Ok(())
    }

    fn scan_page(
        &self,
        start: &str,
        end: &str,
        after: Option<&str>,
        limit: usize,
    ) -> StateResult<Vec<StateEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare_cached(
            "SELECT state_key, state_value
             FROM world_state
             WHERE state_key >= ?1
               AND (?2 = '' OR state_key < ?2)
               AND (?3 IS NULL OR state_key > ?3)
             ORDER BY state_key ASC
             LIMIT ?4;",
        )?;

        let rows = stmt.query_map(params![start, end, after, limit], |row| {
            Ok(StateEntry {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }
}
