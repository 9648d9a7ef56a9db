use super::LedgerStore;
use crate::{
    error::LedgerResult,
    model::{LoggedChange, NewTransactionLog, TransactionLog},
    types::{from_minor_units, to_minor_units, AccountId, LogId},
};
use chrono::NaiveDateTime;
use rusqlite::{params, Row};

const LOG_COLUMNS: &str =
    "t.id, t.account_id, t.previous_balance, t.new_balance, t.change_amount, t.timestamp, t.source";

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionLog> {
    Ok(TransactionLog {
        id:               row.get(0)?,
        account_id:       row.get(1)?,
        previous_balance: from_minor_units(row.get(2)?),
        new_balance:      from_minor_units(row.get(3)?),
        change_amount:    from_minor_units(row.get(4)?),
        timestamp:        row.get(5)?,
        source:           row.get(6)?,
    })
}

impl LedgerStore {
    // ── Transaction log ───────────────────────────────────────────

    /// Append a log row. Rows are never updated or deleted directly.
    pub fn append_transaction_log(&self, entry: &NewTransactionLog<'_>) -> LedgerResult<LogId> {
        let previous = to_minor_units(entry.previous_balance)?;
        let new = to_minor_units(entry.new_balance)?;
        self.conn.execute(
            "INSERT INTO transaction_logs
                (account_id, previous_balance, new_balance, change_amount, timestamp, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.account_id,
                previous,
                new,
                new - previous,
                entry.timestamp,
                entry.source,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// History of one account, newest first.
    pub fn transaction_logs_for_account(
        &self,
        account_id: AccountId,
    ) -> LedgerResult<Vec<TransactionLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM transaction_logs t
             WHERE t.account_id = ?1
             ORDER BY t.timestamp DESC, t.id DESC"
        ))?;
        let rows = stmt.query_map(params![account_id], log_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Most recent log rows across all accounts.
    pub fn recent_transaction_logs(&self, limit: usize) -> LedgerResult<Vec<TransactionLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM transaction_logs t
             ORDER BY t.timestamp DESC, t.id DESC
             LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit as i64], log_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn transaction_log_count(&self) -> LedgerResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transaction_logs", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn transaction_log_count_for_account(&self, account_id: AccountId) -> LedgerResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transaction_logs WHERE account_id = ?1",
            params![account_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// True if the account already has a log row at exactly this instant.
    /// Used to keep backfills idempotent.
    pub fn transaction_log_exists_at(
        &self,
        account_id: AccountId,
        timestamp: NaiveDateTime,
    ) -> LedgerResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transaction_logs WHERE account_id = ?1 AND timestamp = ?2",
            params![account_id, timestamp],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// For every account with a log row from `source`, the latest such row
    /// joined with the account's display fields. Newest first.
    pub fn latest_changes_by_source(&self, source: &str) -> LedgerResult<Vec<LoggedChange>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS}, a.account_number, a.account_name, a.bank_name
             FROM transaction_logs t
             JOIN accounts a ON a.id = t.account_id
             WHERE t.source = ?1
               AND t.id = (
                   SELECT t2.id FROM transaction_logs t2
                   WHERE t2.account_id = t.account_id AND t2.source = ?1
                   ORDER BY t2.timestamp DESC, t2.id DESC
                   LIMIT 1
               )
             ORDER BY t.timestamp DESC, t.id DESC"
        ))?;
        let rows = stmt.query_map(params![source], |row| {
            Ok(LoggedChange {
                log:            log_from_row(row)?,
                account_number: row.get(7)?,
                account_name:   row.get(8)?,
                bank_name:      row.get(9)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
