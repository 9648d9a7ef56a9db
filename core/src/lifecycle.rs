//! Account lifecycle: create, update and delete banks and accounts.
//!
//! RULES:
//!   - Every operation runs in one store transaction; any error rolls it back.
//!   - Every balance change appends exactly one transaction log row.
//!   - `accounts.bank_name` always equals the name of `accounts.bank_id`.

use crate::{
    clock::LedgerClock,
    error::{LedgerError, LedgerResult},
    model::{source, Account, AccountFields, Bank, NewTransactionLog},
    store::LedgerStore,
    types::{AccountId, BankId},
};
use rust_decimal::Decimal;

pub struct AccountLifecycle<'a> {
    store: &'a LedgerStore,
    clock: &'a LedgerClock,
}

impl<'a> AccountLifecycle<'a> {
    pub fn new(store: &'a LedgerStore, clock: &'a LedgerClock) -> Self {
        Self { store, clock }
    }

    // ── Accounts ──────────────────────────────────────────────────

    /// Create an account and log its opening balance.
    pub fn create_account(&self, fields: &AccountFields) -> LedgerResult<Account> {
        let fields = fields.normalized();
        log::debug!("Creating account {}", fields.account_number);
        validate_account_fields(&fields)?;
        let bank_id = required_bank_id(&fields)?;

        let tx = self.store.transaction()?;
        if self.store.account_number_taken(&fields.account_number, None)? {
            return Err(LedgerError::validation(format!(
                "an account with number {} already exists",
                fields.account_number
            )));
        }
        let bank = self.resolve_bank(bank_id)?;

        let now = self.clock.now();
        let id = self.store.insert_account(&fields, &bank.bank_name, now)?;
        self.store.append_transaction_log(&NewTransactionLog {
            account_id:       id,
            previous_balance: Decimal::ZERO,
            new_balance:      fields.balance,
            timestamp:        now,
            source:           source::ACCOUNT_CREATION,
        })?;
        let account = self.load_account(id)?;
        tx.commit()?;

        log::info!(
            "Created account {} '{}' (id {id}) at {}",
            account.account_number,
            account.account_name,
            account.bank_name
        );
        Ok(account)
    }

    /// Replace every writable field of an account.
    ///
    /// Optional fields absent from `fields` are cleared. A log row is written
    /// only if the balance changes.
    pub fn update_account(&self, id: AccountId, fields: &AccountFields) -> LedgerResult<Account> {
        let fields = fields.normalized();
        log::debug!("Updating account {id}");

        let tx = self.store.transaction()?;
        let current = self.load_account(id)?;
        validate_account_fields(&fields)?;
        let bank_id = required_bank_id(&fields)?;

        if current.account_number != fields.account_number
            && self.store.account_number_taken(&fields.account_number, Some(id))?
        {
            return Err(LedgerError::validation(format!(
                "an account with number {} already exists",
                fields.account_number
            )));
        }
        let bank = self.resolve_bank(bank_id)?;

        let now = self.clock.now();
        self.store.update_account(id, &fields, &bank.bank_name, now)?;
        if current.balance != fields.balance {
            self.store.append_transaction_log(&NewTransactionLog {
                account_id:       id,
                previous_balance: current.balance,
                new_balance:      fields.balance,
                timestamp:        now,
                source:           source::MANUAL_UPDATE,
            })?;
        }
        let account = self.load_account(id)?;
        tx.commit()?;

        log::info!("Updated account {} (id {id})", account.account_number);
        Ok(account)
    }

    /// Delete an account together with its history.
    pub fn delete_account(&self, id: AccountId) -> LedgerResult<Account> {
        let tx = self.store.transaction()?;
        let account = self.load_account(id)?;
        self.store.delete_account(id)?;
        tx.commit()?;

        log::info!("Deleted account {} (id {id})", account.account_number);
        Ok(account)
    }

    // ── Banks ─────────────────────────────────────────────────────

    pub fn create_bank(&self, bank_name: &str, frn: &str) -> LedgerResult<Bank> {
        let (bank_name, frn) = validate_bank_fields(bank_name, frn)?;

        let tx = self.store.transaction()?;
        if self.store.bank_name_taken(bank_name, None)? {
            return Err(LedgerError::validation(format!(
                "a bank named {bank_name} already exists"
            )));
        }
        let id = self.store.insert_bank(bank_name, frn, self.clock.now())?;
        let bank = self.resolve_bank(id)?;
        tx.commit()?;

        log::info!("Created bank '{bank_name}' (id {id}, frn {frn})");
        Ok(bank)
    }

    /// Rename / re-reference a bank. Accounts of the bank pick up the new name.
    pub fn update_bank(&self, id: BankId, bank_name: &str, frn: &str) -> LedgerResult<Bank> {
        let tx = self.store.transaction()?;
        let current = self.load_bank(id)?;
        let (bank_name, frn) = validate_bank_fields(bank_name, frn)?;
        if self.store.bank_name_taken(bank_name, Some(id))? {
            return Err(LedgerError::validation(format!(
                "a bank named {bank_name} already exists"
            )));
        }

        self.store.update_bank(id, bank_name, frn)?;
        if current.bank_name != bank_name {
            let synced = self.store.sync_account_bank_names(id, bank_name)?;
            log::debug!("Renamed bank {id} on {synced} account(s)");
        }
        let bank = self.load_bank(id)?;
        tx.commit()?;

        log::info!("Updated bank '{}' (id {id})", bank.bank_name);
        Ok(bank)
    }

    /// Delete a bank. Refused while any account still references it.
    pub fn delete_bank(&self, id: BankId) -> LedgerResult<Bank> {
        let tx = self.store.transaction()?;
        let bank = self.load_bank(id)?;
        let accounts = self.store.account_count_for_bank(id)?;
        if accounts > 0 {
            log::warn!("Refusing to delete bank {id}: {accounts} account(s) reference it");
            return Err(LedgerError::Conflict(format!(
                "bank has associated accounts ({accounts})"
            )));
        }
        self.store.delete_bank(id)?;
        tx.commit()?;

        log::info!("Deleted bank '{}' (id {id})", bank.bank_name);
        Ok(bank)
    }

    // ── Helpers ───────────────────────────────────────────────────

    fn load_account(&self, id: AccountId) -> LedgerResult<Account> {
        self.store
            .get_account(id)?
            .ok_or(LedgerError::NotFound { entity: "account", id })
    }

    fn load_bank(&self, id: BankId) -> LedgerResult<Bank> {
        self.store
            .get_bank(id)?
            .ok_or(LedgerError::NotFound { entity: "bank", id })
    }

    /// Like `load_bank`, but a dangling reference from account fields is a
    /// validation failure rather than a missing entity.
    fn resolve_bank(&self, id: BankId) -> LedgerResult<Bank> {
        self.store
            .get_bank(id)?
            .ok_or_else(|| LedgerError::validation(format!("selected bank {id} not found")))
    }
}

fn required_bank_id(fields: &AccountFields) -> LedgerResult<BankId> {
    fields
        .bank_id
        .ok_or_else(|| LedgerError::validation("bank is required"))
}

fn validate_account_fields(fields: &AccountFields) -> LedgerResult<()> {
    if fields.account_name.is_empty() {
        return Err(LedgerError::validation("account name is required"));
    }
    if fields.account_number.is_empty() {
        return Err(LedgerError::validation("account number is required"));
    }
    if let (Some(start), Some(end)) = (fields.start_date, fields.end_date) {
        if end < start {
            return Err(LedgerError::validation(format!(
                "end date {end} precedes start date {start}"
            )));
        }
    }
    Ok(())
}

fn validate_bank_fields<'f>(bank_name: &'f str, frn: &'f str) -> LedgerResult<(&'f str, &'f str)> {
    let bank_name = bank_name.trim();
    let frn = frn.trim();
    if bank_name.is_empty() {
        return Err(LedgerError::validation("bank name is required"));
    }
    if frn.is_empty() {
        return Err(LedgerError::validation("FRN is required"));
    }
    Ok((bank_name, frn))
}
