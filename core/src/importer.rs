//! Bulk balance importer.
//!
//! Rows are keyed by account number. Each row is applied independently:
//! a row that fails is recorded in the result and the batch carries on.
//! Successful rows commit together in one transaction at the end.
//!
//! Re-importing identical data is not de-duplicated: every matched row
//! appends a log entry, with a zero change when the balance is unchanged.

use crate::{
    clock::LedgerClock,
    config::ImportConfig,
    csv_input::{read_balance_rows, BalanceRow},
    error::{LedgerError, LedgerResult},
    model::{source, NewTransactionLog},
    store::LedgerStore,
    types::round_money,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::str::FromStr;
use uuid::Uuid;

/// Before/after record of one updated account. Display only; not persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceSnapshot {
    pub account_number:   String,
    pub account_name:     String,
    pub bank_name:        String,
    pub previous_balance: Decimal,
    pub new_balance:      Decimal,
    pub change:           Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowFailure {
    pub account: String,
    pub error:   String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportResult {
    pub updated:            usize,
    pub not_found:          usize,
    pub error:              usize,
    pub not_found_accounts: Vec<String>,
    pub error_accounts:     Vec<RowFailure>,
    pub snapshots:          Vec<BalanceSnapshot>,
}

impl ImportResult {
    fn record_update(&mut self, snapshot: BalanceSnapshot) {
        self.updated += 1;
        self.snapshots.push(snapshot);
    }

    fn record_not_found(&mut self, account: String) {
        self.not_found += 1;
        self.not_found_accounts.push(account);
    }

    fn record_error(&mut self, account: String, error: String) {
        self.error += 1;
        self.error_accounts.push(RowFailure { account, error });
    }

    /// One-line summary, e.g. "Updated 3 accounts. 1 not found. 0 errors."
    pub fn summary(&self) -> String {
        format!(
            "Updated {} accounts. {} not found. {} errors.",
            self.updated, self.not_found, self.error
        )
    }
}

/// The result of one import, handed to exactly one later report view.
///
/// Holds the ledger generation it was produced at; once anything else is
/// written the handle is stale and the report view ignores it.
#[derive(Debug, Clone)]
pub struct ImportHandle {
    batch_id:   Uuid,
    generation: u64,
    result:     ImportResult,
}

impl ImportHandle {
    pub(crate) fn new(generation: u64, result: ImportResult) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            generation,
            result,
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn result(&self) -> &ImportResult {
        &self.result
    }

    pub fn into_result(self) -> ImportResult {
        self.result
    }
}

pub struct BalanceImporter<'a> {
    store: &'a LedgerStore,
    clock: &'a LedgerClock,
}

impl<'a> BalanceImporter<'a> {
    pub fn new(store: &'a LedgerStore, clock: &'a LedgerClock) -> Self {
        Self { store, clock }
    }

    /// Import a CSV document. Fails before touching any row if the
    /// required columns are missing.
    pub fn import_csv<R: Read>(&self, input: R, columns: &ImportConfig) -> LedgerResult<ImportResult> {
        let rows = read_balance_rows(input, columns)?;
        log::debug!("Read {} row(s) for balance import", rows.len());
        self.import_rows(rows)
    }

    /// Apply already-split rows. Rows that failed to decode are passed in as
    /// `RowProcessing` errors and counted like any other row failure.
    pub fn import_rows<I>(&self, rows: I) -> LedgerResult<ImportResult>
    where
        I: IntoIterator<Item = LedgerResult<BalanceRow>>,
    {
        let tx = self.store.transaction()?;
        let mut result = ImportResult::default();

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(LedgerError::RowProcessing { account, message }) => {
                    log::warn!("Skipping unreadable import row {account}: {message}");
                    result.record_error(account, message);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let account_number = row.account.trim().to_string();
            match self.apply_row(&account_number, &row.balance) {
                Ok(Some(snapshot)) => {
                    log::debug!(
                        "Updated account {account_number}: balance {} -> {}",
                        snapshot.previous_balance,
                        snapshot.new_balance
                    );
                    result.record_update(snapshot);
                }
                Ok(None) => {
                    log::debug!("Account not found: {account_number}");
                    result.record_not_found(account_number);
                }
                Err(e) => {
                    let message = row_message(e);
                    log::warn!("Error processing account {account_number}: {message}");
                    result.record_error(account_number, message);
                }
            }
        }

        tx.commit()?;
        log::info!("{}", result.summary());
        Ok(result)
    }

    /// Returns `None` when no account has this number.
    fn apply_row(&self, account_number: &str, raw_balance: &str) -> LedgerResult<Option<BalanceSnapshot>> {
        if account_number.is_empty() {
            return Err(LedgerError::row(account_number, "missing account identifier"));
        }
        let new_balance = parse_balance(account_number, raw_balance)?;
        let Some(account) = self.store.find_account_by_number(account_number)? else {
            return Ok(None);
        };

        let now = self.clock.now();
        self.store.savepoint("import_row", |store| {
            store.append_transaction_log(&NewTransactionLog {
                account_id:       account.id,
                previous_balance: account.balance,
                new_balance,
                timestamp:        now,
                source:           source::CSV_UPLOAD,
            })?;
            store.set_account_balance(account.id, new_balance, now)?;
            Ok(())
        })?;

        Ok(Some(BalanceSnapshot {
            change:           new_balance - account.balance,
            previous_balance: account.balance,
            new_balance,
            account_number:   account.account_number,
            account_name:     account.account_name,
            bank_name:        account.bank_name,
        }))
    }
}

/// Parse a target balance. Accepts plain and scientific notation; rounds
/// to the stored scale.
pub fn parse_balance(account: &str, raw: &str) -> LedgerResult<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LedgerError::row(account, "missing balance"));
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map(round_money)
        .map_err(|_| LedgerError::row(account, format!("could not convert balance '{raw}' to a number")))
}

fn row_message(error: LedgerError) -> String {
    match error {
        LedgerError::RowProcessing { message, .. } => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn balances_parse_in_common_notations() {
        assert_eq!(parse_balance("A", "5200.00").unwrap(), dec!(5200.00));
        assert_eq!(parse_balance("A", " -12 ").unwrap(), dec!(-12));
        assert_eq!(parse_balance("A", "5.2e3").unwrap(), dec!(5200));
        assert_eq!(parse_balance("A", "1.005").unwrap(), dec!(1.01));
    }

    #[test]
    fn non_numeric_balance_is_a_row_error() {
        let err = parse_balance("A002", "bad").unwrap_err();
        match err {
            LedgerError::RowProcessing { account, message } => {
                assert_eq!(account, "A002");
                assert!(message.contains("'bad'"), "{message}");
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn summary_reads_like_a_status_line() {
        let result = ImportResult {
            updated: 2,
            not_found: 1,
            ..ImportResult::default()
        };
        assert_eq!(result.summary(), "Updated 2 accounts. 1 not found. 0 errors.");
    }
}
