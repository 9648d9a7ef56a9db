//! Account lifecycle integration tests.
//!
//! Verifies that:
//!   - Creating an account writes exactly one opening log row
//!   - Bank reference and account number are validated before any write
//!   - Balance-changing updates log exactly once; others not at all
//!   - Updates replace optional fields rather than merging them
//!   - The denormalized bank name follows the account's bank
//!   - Deleting an account removes its history

use chrono::NaiveDate;
use ledger_core::{
    clock::LedgerClock,
    error::LedgerError,
    ledger::Ledger,
    model::{source, AccountFields, Bank},
    types::{AccountType, InterestFrequency, Owner},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_ledger() -> Ledger {
    let _ = env_logger::builder().is_test(true).try_init();
    Ledger::build_test(LedgerClock::fixed_date(date(2025, 6, 1))).unwrap()
}

fn global_bank(ledger: &mut Ledger) -> Bank {
    ledger.create_bank("Global Bank", "FRN001").unwrap()
}

fn fixed_term(number: &str, balance: Decimal, bank: &Bank) -> AccountFields {
    let mut fields = AccountFields::new("Emergency Fund", number, balance, bank.id);
    fields.account_type = AccountType::Depo;
    fields.owner = Owner::Joint;
    fields.savings = true;
    fields.interest_rate = Some(1.5);
    fields.start_date = Some(date(2025, 1, 15));
    fields.end_date = Some(date(2026, 1, 15));
    fields.interest_frequency = Some(InterestFrequency::PerYear);
    fields
}

/// A new account carries exactly one log row: 0 -> opening balance.
#[test]
fn create_account_logs_opening_balance() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);

    let account = ledger
        .create_account(&fixed_term("A001", dec!(5000.00), &bank))
        .unwrap();

    assert_eq!(account.balance, dec!(5000.00));
    assert_eq!(account.bank_name, "Global Bank");
    assert_eq!(account.bank_id, Some(bank.id));

    let history = ledger.account_history(account.id).unwrap();
    assert_eq!(history.len(), 1, "expected one opening log row");
    let opening = &history[0];
    assert_eq!(opening.previous_balance, Decimal::ZERO);
    assert_eq!(opening.new_balance, dec!(5000.00));
    assert_eq!(opening.change_amount, dec!(5000.00));
    assert_eq!(opening.source, source::ACCOUNT_CREATION);
    assert_eq!(opening.timestamp, ledger.clock.now());
}

/// Missing or dangling bank references fail validation and persist nothing.
#[test]
fn create_account_requires_existing_bank() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);

    let mut no_bank = fixed_term("A001", dec!(10), &bank);
    no_bank.bank_id = None;
    let err = ledger.create_account(&no_bank).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)), "got {err:?}");

    let mut dangling = fixed_term("A001", dec!(10), &bank);
    dangling.bank_id = Some(bank.id + 100);
    let err = ledger.create_account(&dangling).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)), "got {err:?}");

    assert!(ledger.list_accounts().unwrap().is_empty());
    assert_eq!(ledger.store.transaction_log_count().unwrap(), 0);
}

/// Account numbers are globally unique, compared after trimming.
#[test]
fn duplicate_account_number_is_rejected() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);
    ledger.create_account(&fixed_term("A001", dec!(1), &bank)).unwrap();

    let err = ledger
        .create_account(&fixed_term("  A001 ", dec!(2), &bank))
        .unwrap_err();
    match err {
        LedgerError::Validation(msg) => assert!(msg.contains("A001"), "{msg}"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(ledger.list_accounts().unwrap().len(), 1);
    assert_eq!(ledger.store.transaction_log_count().unwrap(), 1);
}

/// A balance change logs once, with change = new - previous.
#[test]
fn balance_change_logs_exactly_once() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);
    let account = ledger
        .create_account(&fixed_term("A001", dec!(5000.00), &bank))
        .unwrap();

    let mut fields = AccountFields::from_account(&account);
    fields.balance = dec!(4750.25);
    let updated = ledger.update_account(account.id, &fields).unwrap();
    assert_eq!(updated.balance, dec!(4750.25));

    let history = ledger.account_history(account.id).unwrap();
    assert_eq!(history.len(), 2);
    let latest = &history[0];
    assert_eq!(latest.source, source::MANUAL_UPDATE);
    assert_eq!(latest.previous_balance, dec!(5000.00));
    assert_eq!(latest.new_balance, dec!(4750.25));
    assert_eq!(latest.change_amount, dec!(-249.75));
}

/// An update that keeps the balance writes no log row.
#[test]
fn unchanged_balance_logs_nothing() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);
    let account = ledger
        .create_account(&fixed_term("A001", dec!(5000.00), &bank))
        .unwrap();

    let mut fields = AccountFields::from_account(&account);
    fields.account_name = "Rainy Day".into();
    // Same amount, different scale.
    fields.balance = dec!(5000);
    let updated = ledger.update_account(account.id, &fields).unwrap();

    assert_eq!(updated.account_name, "Rainy Day");
    assert_eq!(ledger.store.transaction_log_count_for_account(account.id).unwrap(), 1);
}

/// Optional fields omitted from an update are cleared, not kept.
#[test]
fn update_replaces_optional_fields() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);
    let account = ledger
        .create_account(&fixed_term("A001", dec!(100), &bank))
        .unwrap();
    assert_eq!(account.interest_rate, Some(1.5));

    let fields = AccountFields::new("Emergency Fund", "A001", dec!(100), bank.id);
    let updated = ledger.update_account(account.id, &fields).unwrap();

    assert_eq!(updated.interest_rate, None);
    assert_eq!(updated.start_date, None);
    assert_eq!(updated.end_date, None);
    assert_eq!(updated.interest_frequency, None);
    assert_eq!(updated.account_type, AccountType::Other);
    assert!(!updated.savings);
}

#[test]
fn update_of_missing_account_is_not_found() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);

    let err = ledger
        .update_account(42, &fixed_term("A001", dec!(1), &bank))
        .unwrap_err();
    assert!(
        matches!(err, LedgerError::NotFound { entity: "account", id: 42 }),
        "got {err:?}"
    );
}

/// Renumbering checks other accounts only; keeping one's own number is fine.
#[test]
fn renumbering_checks_other_accounts() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);
    let first = ledger.create_account(&fixed_term("A001", dec!(1), &bank)).unwrap();
    ledger.create_account(&fixed_term("A002", dec!(2), &bank)).unwrap();

    let mut fields = AccountFields::from_account(&first);
    fields.account_number = "A002".into();
    let err = ledger.update_account(first.id, &fields).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)), "got {err:?}");

    fields.account_number = "A001".into();
    ledger.update_account(first.id, &fields).unwrap();

    fields.account_number = "A009".into();
    let renumbered = ledger.update_account(first.id, &fields).unwrap();
    assert_eq!(renumbered.account_number, "A009");
    assert!(ledger.find_account("A001").unwrap().is_none());
}

/// Moving an account to another bank refreshes the stored bank name.
#[test]
fn moving_bank_refreshes_bank_name() {
    let mut ledger = build_ledger();
    let global = global_bank(&mut ledger);
    let city = ledger.create_bank("City Financial", "FRN002").unwrap();
    let account = ledger.create_account(&fixed_term("A001", dec!(1), &global)).unwrap();

    let mut fields = AccountFields::from_account(&account);
    fields.bank_id = Some(city.id);
    let moved = ledger.update_account(account.id, &fields).unwrap();

    assert_eq!(moved.bank_name, "City Financial");
    assert_eq!(moved.bank_id, Some(city.id));
    assert!(ledger.bank_name_mismatches().unwrap().is_empty());
}

/// Deleting an account takes its history with it.
#[test]
fn delete_account_removes_history() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);
    let keep = ledger.create_account(&fixed_term("A001", dec!(1), &bank)).unwrap();
    let gone = ledger.create_account(&fixed_term("A002", dec!(2), &bank)).unwrap();

    ledger.delete_account(gone.id).unwrap();

    assert!(ledger.get_account(gone.id).unwrap().is_none());
    assert!(ledger.account_history(gone.id).unwrap().is_empty());
    assert_eq!(ledger.store.transaction_log_count().unwrap(), 1);
    assert!(ledger.get_account(keep.id).unwrap().is_some());

    let err = ledger.delete_account(gone.id).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }), "got {err:?}");
}

#[test]
fn end_date_before_start_date_is_rejected() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);
    let mut fields = fixed_term("A001", dec!(1), &bank);
    fields.end_date = Some(date(2024, 12, 31));

    let err = ledger.create_account(&fields).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)), "got {err:?}");
}

/// Amounts are stored to the penny, rounding half away from zero.
#[test]
fn balances_are_stored_to_the_penny() {
    let mut ledger = build_ledger();
    let bank = global_bank(&mut ledger);
    let account = ledger
        .create_account(&fixed_term("A001", dec!(10.005), &bank))
        .unwrap();

    assert_eq!(account.balance, dec!(10.01));
    assert_eq!(ledger.account_history(account.id).unwrap()[0].new_balance, dec!(10.01));
}

/// Failed writes leave the generation untouched; successful ones bump it.
#[test]
fn only_successful_writes_bump_generation() {
    let mut ledger = build_ledger();
    assert_eq!(ledger.generation(), 0);
    let bank = global_bank(&mut ledger);
    assert_eq!(ledger.generation(), 1);

    let mut no_bank = fixed_term("A001", dec!(1), &bank);
    no_bank.bank_id = None;
    assert!(ledger.create_account(&no_bank).is_err());
    assert_eq!(ledger.generation(), 1);

    ledger.create_account(&fixed_term("A001", dec!(1), &bank)).unwrap();
    assert_eq!(ledger.generation(), 2);
}
