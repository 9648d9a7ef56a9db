//! Report aggregator: read-only views over the ledger.
//!
//! RULE: every public call opens its own read transaction, so each report
//! reflects the latest committed state. Nothing here is cached.

use crate::{
    clock::LedgerClock,
    error::LedgerResult,
    importer::ImportResult,
    model::{Account, LoggedChange, TransactionLog},
    store::LedgerStore,
    types::{AccountType, InterestFrequency, Owner},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Count and balance sum of one group (an account type, an owner code, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupTotal {
    pub label: String,
    pub count: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrnOwnerTotal {
    pub frn:           String,
    pub owner:         Owner,
    pub account_count: i64,
    pub total_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrnBalance {
    pub frn:           String,
    pub total_balance: Decimal,
}

/// Parallel label/value arrays, the shape chart widgets consume.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartData {
    pub account_types: ChartSeries,
    pub owners:        ChartSeries,
    pub frns:          ChartSeries,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    pub account_count:       i64,
    pub recent_transactions: Vec<TransactionLog>,
    pub accounts_by_type:    Vec<GroupTotal>,
    pub accounts_by_owner:   Vec<GroupTotal>,
    pub total_balance:       Decimal,
    pub maturing_soon:       i64,
}

/// Everything the reports page shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportView {
    pub maturing_accounts:     Vec<Account>,
    pub frn_balances:          Vec<FrnBalance>,
    pub owner_balances:        Vec<GroupTotal>,
    pub accounts_by_frn_owner: Vec<FrnOwnerTotal>,
    /// Results of the import that led to this view, if still current.
    pub csv_results:           Option<ImportResult>,
}

/// Before/after view of an account's latest CSV update, rebuilt from the log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CsvChangeSnapshot {
    pub account_number:   String,
    pub account_name:     String,
    pub bank_name:        String,
    pub previous_balance: Decimal,
    pub new_balance:      Decimal,
    pub change:           Decimal,
    pub timestamp:        NaiveDateTime,
}

impl From<LoggedChange> for CsvChangeSnapshot {
    fn from(c: LoggedChange) -> Self {
        Self {
            account_number:   c.account_number,
            account_name:     c.account_name,
            bank_name:        c.bank_name,
            previous_balance: c.log.previous_balance,
            new_balance:      c.log.new_balance,
            change:           c.log.change_amount,
            timestamp:        c.log.timestamp,
        }
    }
}

/// Interest terms, present in a backup only for typed (non-"none") accounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterestTerms {
    pub interest_rate:      Option<f64>,
    pub start_date:         Option<NaiveDate>,
    pub end_date:           Option<NaiveDate>,
    pub interest_frequency: Option<InterestFrequency>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountBackup {
    pub id:             i64,
    pub account_name:   String,
    pub account_number: String,
    pub balance:        Decimal,
    pub account_type:   AccountType,
    pub owner:          Owner,
    pub savings:        bool,
    pub bank_name:      String,
    #[serde(flatten)]
    pub interest:       Option<InterestTerms>,
}

impl From<Account> for AccountBackup {
    fn from(a: Account) -> Self {
        let interest = (a.account_type != AccountType::Other).then(|| InterestTerms {
            interest_rate:      a.interest_rate,
            start_date:         a.start_date,
            end_date:           a.end_date,
            interest_frequency: a.interest_frequency,
        });
        Self {
            id:             a.id,
            account_name:   a.account_name,
            account_number: a.account_number,
            balance:        a.balance,
            account_type:   a.account_type,
            owner:          a.owner,
            savings:        a.savings,
            bank_name:      a.bank_name,
            interest,
        }
    }
}

pub struct ReportAggregator<'a> {
    store: &'a LedgerStore,
    clock: &'a LedgerClock,
}

impl<'a> ReportAggregator<'a> {
    pub fn new(store: &'a LedgerStore, clock: &'a LedgerClock) -> Self {
        Self { store, clock }
    }

    pub fn accounts_by_type(&self) -> LedgerResult<Vec<GroupTotal>> {
        let _read = self.store.read_transaction()?;
        self.store.totals_by_account_type()
    }

    pub fn accounts_by_owner(&self) -> LedgerResult<Vec<GroupTotal>> {
        let _read = self.store.read_transaction()?;
        self.store.totals_by_owner()
    }

    /// Ordered by FRN, then owner.
    pub fn accounts_by_bank_ref_and_owner(&self) -> LedgerResult<Vec<FrnOwnerTotal>> {
        let _read = self.store.read_transaction()?;
        self.store.totals_by_frn_and_owner()
    }

    pub fn balance_by_bank_ref(&self) -> LedgerResult<Vec<FrnBalance>> {
        let _read = self.store.read_transaction()?;
        self.store.balances_by_frn()
    }

    /// Accounts ending within `[today, today + window_days]`, soonest first.
    pub fn maturing_accounts(&self, window_days: i64) -> LedgerResult<Vec<Account>> {
        let (from, to) = self.clock.window(window_days)?;
        let _read = self.store.read_transaction()?;
        self.store.accounts_maturing_between(from, to)
    }

    pub fn total_balance(&self) -> LedgerResult<Decimal> {
        let _read = self.store.read_transaction()?;
        self.store.total_balance()
    }

    pub fn dashboard(&self, window_days: i64, recent_limit: usize) -> LedgerResult<Dashboard> {
        let (from, to) = self.clock.window(window_days)?;
        let _read = self.store.read_transaction()?;
        Ok(Dashboard {
            account_count:       self.store.account_count()?,
            recent_transactions: self.store.recent_transaction_logs(recent_limit)?,
            accounts_by_type:    self.store.totals_by_account_type()?,
            accounts_by_owner:   self.store.totals_by_owner()?,
            total_balance:       self.store.total_balance()?,
            maturing_soon:       self.store.count_accounts_maturing_between(from, to)?,
        })
    }

    pub fn chart_data(&self) -> LedgerResult<ChartData> {
        let _read = self.store.read_transaction()?;
        Ok(ChartData {
            account_types: self.store.account_counts_by_type()?,
            owners:        self.store.account_counts_by_owner()?,
            frns:          self.store.account_counts_by_frn()?,
        })
    }

    /// The reports page. `csv_results` is supplied by the caller, already
    /// checked for staleness.
    pub fn report_view(
        &self,
        window_days: i64,
        csv_results: Option<ImportResult>,
    ) -> LedgerResult<ReportView> {
        let (from, to) = self.clock.window(window_days)?;
        let _read = self.store.read_transaction()?;
        let view = ReportView {
            maturing_accounts:     self.store.accounts_maturing_between(from, to)?,
            frn_balances:          self.store.balances_by_frn()?,
            owner_balances:        self.store.totals_by_owner()?,
            accounts_by_frn_owner: self.store.totals_by_frn_and_owner()?,
            csv_results,
        };
        log::debug!(
            "Report view: {} maturing, {} frn groups, {} frn/owner groups",
            view.maturing_accounts.len(),
            view.frn_balances.len(),
            view.accounts_by_frn_owner.len()
        );
        Ok(view)
    }

    /// Latest CSV change per account, newest first.
    pub fn latest_csv_snapshots(&self) -> LedgerResult<Vec<CsvChangeSnapshot>> {
        let _read = self.store.read_transaction()?;
        let changes = self
            .store
            .latest_changes_by_source(crate::model::source::CSV_UPLOAD)?;
        Ok(changes.into_iter().map(CsvChangeSnapshot::from).collect())
    }

    pub fn backup(&self) -> LedgerResult<Vec<AccountBackup>> {
        let _read = self.store.read_transaction()?;
        let accounts = self.store.list_accounts()?;
        Ok(accounts.into_iter().map(AccountBackup::from).collect())
    }
}
