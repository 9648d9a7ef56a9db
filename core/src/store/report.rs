//! Aggregate queries backing the report aggregator.

use super::LedgerStore;
use crate::{
    error::LedgerResult,
    report::{ChartSeries, FrnBalance, FrnOwnerTotal, GroupTotal},
    types::from_minor_units,
};
use rust_decimal::Decimal;

impl LedgerStore {
    // ── Aggregates ────────────────────────────────────────────────

    pub fn totals_by_account_type(&self) -> LedgerResult<Vec<GroupTotal>> {
        self.group_totals(
            "SELECT account_type, COUNT(id), SUM(balance)
             FROM accounts
             GROUP BY account_type
             ORDER BY account_type",
        )
    }

    pub fn totals_by_owner(&self) -> LedgerResult<Vec<GroupTotal>> {
        self.group_totals(
            "SELECT owner, COUNT(id), SUM(balance)
             FROM accounts
             GROUP BY owner
             ORDER BY owner",
        )
    }

    pub fn totals_by_frn_and_owner(&self) -> LedgerResult<Vec<FrnOwnerTotal>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.frn, a.owner, COUNT(a.id), SUM(a.balance)
             FROM banks b
             JOIN accounts a ON a.bank_id = b.id
             GROUP BY b.frn, a.owner
             ORDER BY b.frn, a.owner",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FrnOwnerTotal {
                frn:           row.get(0)?,
                owner:         row.get(1)?,
                account_count: row.get(2)?,
                total_balance: from_minor_units(row.get(3)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn balances_by_frn(&self) -> LedgerResult<Vec<FrnBalance>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.frn, SUM(a.balance)
             FROM banks b
             JOIN accounts a ON a.bank_id = b.id
             GROUP BY b.frn
             ORDER BY b.frn",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FrnBalance {
                frn:           row.get(0)?,
                total_balance: from_minor_units(row.get(1)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Sum of every balance; zero with no accounts.
    pub fn total_balance(&self) -> LedgerResult<Decimal> {
        let units: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(balance), 0) FROM accounts",
            [],
            |row| row.get(0),
        )?;
        Ok(from_minor_units(units))
    }

    // ── Chart counts ──────────────────────────────────────────────

    pub fn account_counts_by_type(&self) -> LedgerResult<ChartSeries> {
        self.grouped_counts(
            "SELECT account_type, COUNT(id) FROM accounts
             GROUP BY account_type ORDER BY account_type",
        )
    }

    pub fn account_counts_by_owner(&self) -> LedgerResult<ChartSeries> {
        self.grouped_counts(
            "SELECT owner, COUNT(id) FROM accounts
             GROUP BY owner ORDER BY owner",
        )
    }

    pub fn account_counts_by_frn(&self) -> LedgerResult<ChartSeries> {
        self.grouped_counts(
            "SELECT COALESCE(NULLIF(b.frn, ''), 'Unknown'), COUNT(a.id)
             FROM banks b
             JOIN accounts a ON a.bank_id = b.id
             GROUP BY b.frn ORDER BY b.frn",
        )
    }

    fn group_totals(&self, sql: &str) -> LedgerResult<Vec<GroupTotal>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(GroupTotal {
                label: row.get(0)?,
                count: row.get(1)?,
                total: from_minor_units(row.get(2)?),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn grouped_counts(&self, sql: &str) -> LedgerResult<ChartSeries> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut series = ChartSeries::default();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            series.labels.push(row.get(0)?);
            series.values.push(row.get(1)?);
        }
        Ok(series)
    }
}
