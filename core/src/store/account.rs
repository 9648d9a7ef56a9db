use super::LedgerStore;
use crate::{
    error::LedgerResult,
    model::{Account, AccountFields},
    types::{from_minor_units, parse_savings_code, savings_code, to_minor_units, AccountId},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rusqlite::{params, OptionalExtension, Row};

/// Column list matching [`account_from_row`].
const ACCOUNT_COLUMNS: &str =
    "id, account_name, account_number, balance, account_type, owner, savings, bank_name,
     interest_rate, start_date, end_date, interest_frequency, bank_id, created_at, updated_at";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id:                 row.get(0)?,
        account_name:       row.get(1)?,
        account_number:     row.get(2)?,
        balance:            from_minor_units(row.get(3)?),
        account_type:       row.get(4)?,
        owner:              row.get(5)?,
        savings:            parse_savings_code(&row.get::<_, String>(6)?),
        bank_name:          row.get(7)?,
        interest_rate:      row.get(8)?,
        start_date:         row.get(9)?,
        end_date:           row.get(10)?,
        interest_frequency: row.get(11)?,
        bank_id:            row.get(12)?,
        created_at:         row.get(13)?,
        updated_at:         row.get(14)?,
    })
}

impl LedgerStore {
    // ── Account ───────────────────────────────────────────────────

    /// Insert an account. `bank_name` is the resolved name of `fields.bank_id`.
    pub fn insert_account(
        &self,
        fields: &AccountFields,
        bank_name: &str,
        now: NaiveDateTime,
    ) -> LedgerResult<AccountId> {
        self.conn.execute(
            "INSERT INTO accounts (
                account_name, account_number, balance, account_type, owner, savings,
                bank_name, interest_rate, start_date, end_date, interest_frequency,
                bank_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
            params![
                &fields.account_name,
                &fields.account_number,
                to_minor_units(fields.balance)?,
                fields.account_type,
                fields.owner,
                savings_code(fields.savings),
                bank_name,
                fields.interest_rate,
                fields.start_date,
                fields.end_date,
                fields.interest_frequency,
                fields.bank_id,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_account(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        let account = self
            .conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                params![id],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    pub fn find_account_by_number(&self, account_number: &str) -> LedgerResult<Option<Account>> {
        let account = self
            .conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_number = ?1"),
                params![account_number],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    /// True if an account other than `excluding` already uses this number.
    pub fn account_number_taken(
        &self,
        account_number: &str,
        excluding: Option<AccountId>,
    ) -> LedgerResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE account_number = ?1 AND id IS NOT ?2",
            params![account_number, excluding],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY account_number"
        ))?;
        let rows = stmt.query_map([], account_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Overwrite every writable column. Optional fields set to `None` are cleared.
    pub fn update_account(
        &self,
        id: AccountId,
        fields: &AccountFields,
        bank_name: &str,
        now: NaiveDateTime,
    ) -> LedgerResult<usize> {
        let changed = self.conn.execute(
            "UPDATE accounts SET
                account_name = ?1, account_number = ?2, balance = ?3, account_type = ?4,
                owner = ?5, savings = ?6, bank_name = ?7, interest_rate = ?8,
                start_date = ?9, end_date = ?10, interest_frequency = ?11, bank_id = ?12,
                updated_at = ?13
             WHERE id = ?14",
            params![
                &fields.account_name,
                &fields.account_number,
                to_minor_units(fields.balance)?,
                fields.account_type,
                fields.owner,
                savings_code(fields.savings),
                bank_name,
                fields.interest_rate,
                fields.start_date,
                fields.end_date,
                fields.interest_frequency,
                fields.bank_id,
                now,
                id,
            ],
        )?;
        Ok(changed)
    }

    pub fn set_account_balance(
        &self,
        id: AccountId,
        balance: Decimal,
        now: NaiveDateTime,
    ) -> LedgerResult<usize> {
        let changed = self.conn.execute(
            "UPDATE accounts SET balance = ?1, updated_at = ?2 WHERE id = ?3",
            params![to_minor_units(balance)?, now, id],
        )?;
        Ok(changed)
    }

    /// Delete an account. Its transaction logs go with it (ON DELETE CASCADE).
    pub fn delete_account(&self, id: AccountId) -> LedgerResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        Ok(deleted)
    }

    pub fn account_count(&self) -> LedgerResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Accounts whose end date lies in `[from, to]`, soonest first.
    pub fn accounts_maturing_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts
             WHERE end_date IS NOT NULL AND end_date >= ?1 AND end_date <= ?2
             ORDER BY end_date, account_number"
        ))?;
        let rows = stmt.query_map(params![from, to], account_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_accounts_maturing_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts
             WHERE end_date IS NOT NULL AND end_date >= ?1 AND end_date <= ?2",
            params![from, to],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
