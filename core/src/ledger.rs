//! The ledger: single entry point over store, lifecycle, importer and reports.
//!
//! RULES:
//!   - Every successful write bumps `generation`.
//!   - An `ImportHandle` is only shown by a report view if no write has
//!     happened since the import produced it.
//!   - Reads never go through a cache; see report.rs.

use crate::{
    clock::LedgerClock,
    config::LedgerConfig,
    csv_input::BalanceRow,
    error::LedgerResult,
    importer::{BalanceImporter, ImportHandle},
    lifecycle::AccountLifecycle,
    model::{Account, AccountFields, Bank, TransactionLog},
    report::{AccountBackup, ChartData, CsvChangeSnapshot, Dashboard, ReportAggregator, ReportView},
    seed::{self, SeedSummary},
    store::LedgerStore,
    types::{AccountId, BankId},
};
use std::io::Read;
use std::path::Path;

pub struct Ledger {
    pub store:  LedgerStore,
    pub clock:  LedgerClock,
    config:     LedgerConfig,
    generation: u64,
}

impl Ledger {
    pub fn new(store: LedgerStore, clock: LedgerClock, config: LedgerConfig) -> Self {
        Self {
            store,
            clock,
            config,
            generation: 0,
        }
    }

    /// Open the configured database, apply the schema, use the system clock.
    pub fn open(config: LedgerConfig) -> LedgerResult<Self> {
        let store = LedgerStore::open(&config.database_path)?;
        store.migrate()?;
        Ok(Self::new(store, LedgerClock::System, config))
    }

    /// In-memory, migrated ledger with a pinned clock. Used by tests.
    pub fn build_test(clock: LedgerClock) -> LedgerResult<Self> {
        let store = LedgerStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(store, clock, LedgerConfig::default_test()))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Number of successful writes so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn lifecycle(&self) -> AccountLifecycle<'_> {
        AccountLifecycle::new(&self.store, &self.clock)
    }

    fn importer(&self) -> BalanceImporter<'_> {
        BalanceImporter::new(&self.store, &self.clock)
    }

    pub fn reports(&self) -> ReportAggregator<'_> {
        ReportAggregator::new(&self.store, &self.clock)
    }

    fn committed<T>(&mut self, outcome: LedgerResult<T>) -> LedgerResult<T> {
        if outcome.is_ok() {
            self.generation += 1;
        }
        outcome
    }

    // ── Banks ─────────────────────────────────────────────────────

    pub fn create_bank(&mut self, bank_name: &str, frn: &str) -> LedgerResult<Bank> {
        let outcome = self.lifecycle().create_bank(bank_name, frn);
        self.committed(outcome)
    }

    pub fn update_bank(&mut self, id: BankId, bank_name: &str, frn: &str) -> LedgerResult<Bank> {
        let outcome = self.lifecycle().update_bank(id, bank_name, frn);
        self.committed(outcome)
    }

    pub fn delete_bank(&mut self, id: BankId) -> LedgerResult<Bank> {
        let outcome = self.lifecycle().delete_bank(id);
        self.committed(outcome)
    }

    pub fn get_bank(&self, id: BankId) -> LedgerResult<Option<Bank>> {
        self.store.get_bank(id)
    }

    pub fn list_banks(&self) -> LedgerResult<Vec<Bank>> {
        self.store.list_banks()
    }

    // ── Accounts ──────────────────────────────────────────────────

    pub fn create_account(&mut self, fields: &AccountFields) -> LedgerResult<Account> {
        let outcome = self.lifecycle().create_account(fields);
        self.committed(outcome)
    }

    pub fn update_account(&mut self, id: AccountId, fields: &AccountFields) -> LedgerResult<Account> {
        let outcome = self.lifecycle().update_account(id, fields);
        self.committed(outcome)
    }

    pub fn delete_account(&mut self, id: AccountId) -> LedgerResult<Account> {
        let outcome = self.lifecycle().delete_account(id);
        self.committed(outcome)
    }

    pub fn get_account(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        self.store.get_account(id)
    }

    pub fn find_account(&self, account_number: &str) -> LedgerResult<Option<Account>> {
        self.store.find_account_by_number(account_number.trim())
    }

    pub fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.store.list_accounts()
    }

    /// History of one account, newest first.
    pub fn account_history(&self, id: AccountId) -> LedgerResult<Vec<TransactionLog>> {
        self.store.transaction_logs_for_account(id)
    }

    pub fn recent_transactions(&self, limit: usize) -> LedgerResult<Vec<TransactionLog>> {
        self.store.recent_transaction_logs(limit)
    }

    // ── Import ────────────────────────────────────────────────────

    pub fn import_csv<R: Read>(&mut self, input: R) -> LedgerResult<ImportHandle> {
        let columns = self.config.import.clone();
        let outcome = self.importer().import_csv(input, &columns);
        let result = self.committed(outcome)?;
        Ok(ImportHandle::new(self.generation, result))
    }

    pub fn import_csv_file(&mut self, path: impl AsRef<Path>) -> LedgerResult<ImportHandle> {
        let file = std::fs::File::open(path.as_ref())?;
        log::info!("Importing balances from {}", path.as_ref().display());
        self.import_csv(std::io::BufReader::new(file))
    }

    pub fn import_rows(&mut self, rows: Vec<BalanceRow>) -> LedgerResult<ImportHandle> {
        let outcome = self.importer().import_rows(rows.into_iter().map(Ok));
        let result = self.committed(outcome)?;
        Ok(ImportHandle::new(self.generation, result))
    }

    // ── Reports ───────────────────────────────────────────────────

    /// The reports page. Consumes the handle of the import that led here;
    /// its results are shown only if nothing was written since.
    pub fn report_view(&self, last_import: Option<ImportHandle>) -> LedgerResult<ReportView> {
        let csv_results = last_import.and_then(|handle| {
            if handle.generation() == self.generation {
                Some(handle.into_result())
            } else {
                log::debug!(
                    "Dropping stale import {} (generation {} != {})",
                    handle.batch_id(),
                    handle.generation(),
                    self.generation
                );
                None
            }
        });
        self.reports()
            .report_view(self.config.maturity_window_days, csv_results)
    }

    pub fn dashboard(&self) -> LedgerResult<Dashboard> {
        self.reports().dashboard(
            self.config.maturity_window_days,
            self.config.recent_transaction_limit,
        )
    }

    pub fn chart_data(&self) -> LedgerResult<ChartData> {
        self.reports().chart_data()
    }

    pub fn latest_csv_snapshots(&self) -> LedgerResult<Vec<CsvChangeSnapshot>> {
        self.reports().latest_csv_snapshots()
    }

    pub fn backup(&self) -> LedgerResult<Vec<AccountBackup>> {
        self.reports().backup()
    }

    /// Account numbers whose denormalized bank name has drifted. Empty
    /// unless something bypassed the lifecycle manager.
    pub fn bank_name_mismatches(&self) -> LedgerResult<Vec<String>> {
        self.store.bank_name_mismatches()
    }

    // ── Seed ──────────────────────────────────────────────────────

    /// Insert the sample banks, accounts and history. Skips anything that
    /// already exists.
    pub fn seed_sample_data(&mut self) -> LedgerResult<SeedSummary> {
        let outcome = seed::apply(&self.store, &self.clock);
        self.committed(outcome)
    }
}
