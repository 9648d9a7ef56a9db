//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The lifecycle manager, importer and report aggregator call store
//! methods; they never execute SQL directly.
//!
//! Atomicity: callers open a transaction with [`LedgerStore::transaction`],
//! run store methods, then commit. Dropping the transaction rolls back.

use crate::error::{LedgerError, LedgerResult};
use rusqlite::{Connection, Transaction};

mod account;
mod bank;
mod report;
mod transaction_log;

pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    pub fn open(path: &str) -> LedgerResult<Self> {
        if path == ":memory:" {
            return Self::in_memory();
        }
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL lets a reader on another connection see the last commit
        // without blocking the writer.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        log::debug!("Opened ledger store at {path}");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply the schema. Idempotent.
    pub fn migrate(&self) -> LedgerResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_ledger.sql"))?;
        Ok(())
    }

    /// Begin a write transaction. Commit it explicitly; dropping rolls back.
    pub fn transaction(&self) -> LedgerResult<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Begin a read transaction so that every query a report issues sees
    /// the same, latest committed state. Never committed; dropped on return.
    pub fn read_transaction(&self) -> LedgerResult<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Run `f` inside a savepoint nested in the current transaction.
    /// On error the savepoint is rolled back and `f`'s error returned;
    /// the enclosing transaction stays usable.
    pub fn savepoint<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Self) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(LedgerError::validation(format!("bad savepoint name '{name}'")));
        }
        self.conn.execute_batch(&format!("SAVEPOINT {name};"))?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {name};"))?;
                Ok(value)
            }
            Err(e) => {
                // The caller's error wins; a failed rollback is only logged.
                if let Err(rollback) = self
                    .conn
                    .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name};"))
                {
                    log::error!("Rollback to savepoint {name} failed: {rollback}");
                }
                Err(e)
            }
        }
    }
}
