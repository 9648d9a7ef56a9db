use super::LedgerStore;
use crate::{error::LedgerResult, model::Bank, types::BankId};
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};

fn bank_from_row(row: &Row<'_>) -> rusqlite::Result<Bank> {
    Ok(Bank {
        id:         row.get(0)?,
        bank_name:  row.get(1)?,
        frn:        row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl LedgerStore {
    // ── Bank ──────────────────────────────────────────────────────

    pub fn insert_bank(
        &self,
        bank_name: &str,
        frn: &str,
        created_at: NaiveDateTime,
    ) -> LedgerResult<BankId> {
        self.conn.execute(
            "INSERT INTO banks (bank_name, frn, created_at) VALUES (?1, ?2, ?3)",
            params![bank_name, frn, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_bank(&self, id: BankId) -> LedgerResult<Option<Bank>> {
        let bank = self
            .conn
            .query_row(
                "SELECT id, bank_name, frn, created_at FROM banks WHERE id = ?1",
                params![id],
                bank_from_row,
            )
            .optional()?;
        Ok(bank)
    }

    pub fn find_bank_by_name(&self, bank_name: &str) -> LedgerResult<Option<Bank>> {
        let bank = self
            .conn
            .query_row(
                "SELECT id, bank_name, frn, created_at FROM banks WHERE bank_name = ?1",
                params![bank_name],
                bank_from_row,
            )
            .optional()?;
        Ok(bank)
    }

    /// True if another bank (not `excluding`) already uses this name.
    pub fn bank_name_taken(&self, bank_name: &str, excluding: Option<BankId>) -> LedgerResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM banks WHERE bank_name = ?1 AND id IS NOT ?2",
            params![bank_name, excluding],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list_banks(&self) -> LedgerResult<Vec<Bank>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, bank_name, frn, created_at FROM banks ORDER BY bank_name, id",
        )?;
        let rows = stmt.query_map([], bank_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn update_bank(&self, id: BankId, bank_name: &str, frn: &str) -> LedgerResult<usize> {
        let changed = self.conn.execute(
            "UPDATE banks SET bank_name = ?1, frn = ?2 WHERE id = ?3",
            params![bank_name, frn, id],
        )?;
        Ok(changed)
    }

    /// Rewrite the denormalized bank name on every account of this bank.
    pub fn sync_account_bank_names(&self, bank_id: BankId, bank_name: &str) -> LedgerResult<usize> {
        let changed = self.conn.execute(
            "UPDATE accounts SET bank_name = ?1 WHERE bank_id = ?2 AND bank_name <> ?1",
            params![bank_name, bank_id],
        )?;
        Ok(changed)
    }

    pub fn delete_bank(&self, id: BankId) -> LedgerResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM banks WHERE id = ?1", params![id])?;
        Ok(deleted)
    }

    pub fn account_count_for_bank(&self, bank_id: BankId) -> LedgerResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE bank_id = ?1",
            params![bank_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Account numbers whose stored bank name differs from their bank's
    /// actual name. Always empty while the write paths hold the invariant.
    pub fn bank_name_mismatches(&self) -> LedgerResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.account_number
             FROM accounts a
             JOIN banks b ON b.id = a.bank_id
             WHERE a.bank_name <> b.bank_name
             ORDER BY a.account_number",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
