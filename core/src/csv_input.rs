//! Tabular input for bulk balance imports.
//!
//! Only structure is checked here: the header must name both required
//! columns. Field contents are handed to the importer as raw text so that a
//! bad value fails its own row, not the whole file.

use crate::{
    config::ImportConfig,
    error::{LedgerError, LedgerResult},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;

/// One input row: an account identifier and the raw target balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    pub account: String,
    pub balance: String,
}

impl BalanceRow {
    pub fn new(account: impl Into<String>, balance: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            balance: balance.into(),
        }
    }
}

/// Read every data row of a CSV document.
///
/// Fails with `Format` if the header lacks either required column. A record
/// that cannot be decoded comes back as a `RowProcessing` error in its slot.
pub fn read_balance_rows<R: Read>(
    input: R,
    columns: &ImportConfig,
) -> LedgerResult<Vec<LedgerResult<BalanceRow>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let account_idx = column_index(&headers, &columns.account_column);
    let balance_idx = column_index(&headers, &columns.balance_column);
    let (account_idx, balance_idx) = match (account_idx, balance_idx) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(LedgerError::Format(format!(
                "CSV file must contain {} and {} columns",
                columns.account_column, columns.balance_column
            )))
        }
    };

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row = match record {
            Ok(record) => Ok(BalanceRow {
                account: record.get(account_idx).unwrap_or_default().to_string(),
                balance: record.get(balance_idx).unwrap_or_default().to_string(),
            }),
            Err(e) => {
                // Header is line 1.
                let line = e.position().map(|p| p.line()).unwrap_or(i as u64 + 2);
                Err(LedgerError::row(format!("line {line}"), e.to_string()))
            }
        };
        rows.push(row);
    }
    Ok(rows)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name.trim())
}
