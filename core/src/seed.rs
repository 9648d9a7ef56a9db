//! Sample data for a fresh ledger.
//!
//! Idempotent: banks are matched by name, accounts by number, history rows
//! by (account, timestamp). Anything already present is left alone.

use crate::{
    clock::LedgerClock,
    error::{LedgerError, LedgerResult},
    model::{AccountFields, NewTransactionLog},
    store::LedgerStore,
    types::{AccountType, InterestFrequency, Owner},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub banks_added:    usize,
    pub accounts_added: usize,
    pub logs_added:     usize,
}

const BANKS: &[(&str, &str)] = &[
    ("Global Bank", "FRN001"),
    ("City Financial", "FRN002"),
    ("National Savings", "FRN003"),
    ("Metro Credit Union", "FRN004"),
];

struct SeedAccount {
    number:    &'static str,
    name:      &'static str,
    balance:   i64, // pounds
    bank:      &'static str,
    owner:     Owner,
    savings:   bool,
    kind:      AccountType,
    /// (rate, start, end); all seeded terms are per year.
    terms:     Option<(f64, &'static str, &'static str)>,
}

const ACCOUNTS: &[SeedAccount] = &[
    SeedAccount { number: "A001", name: "Emergency Fund",     balance: 5_000,   bank: "Global Bank",        owner: Owner::Joint,      savings: true,  kind: AccountType::Depo,  terms: Some((1.5, "2022-01-15", "2023-01-15")) },
    SeedAccount { number: "A002", name: "Vacation Savings",   balance: 2_500,   bank: "City Financial",     owner: Owner::Single,     savings: true,  kind: AccountType::Isa,   terms: Some((2.3, "2022-03-10", "2023-03-10")) },
    SeedAccount { number: "A003", name: "Mortgage",           balance: 150_000, bank: "Global Bank",        owner: Owner::Joint,      savings: false, kind: AccountType::Other, terms: None },
    SeedAccount { number: "A004", name: "College Fund",       balance: 10_000,  bank: "National Savings",   owner: Owner::Individual, savings: true,  kind: AccountType::Isa,   terms: Some((3.1, "2021-09-01", "2026-09-01")) },
    SeedAccount { number: "A005", name: "Car Loan",           balance: 12_000,  bank: "City Financial",     owner: Owner::Single,     savings: false, kind: AccountType::Other, terms: None },
    SeedAccount { number: "A006", name: "Retirement Account", balance: 45_000,  bank: "Metro Credit Union", owner: Owner::Joint,      savings: true,  kind: AccountType::Isa,   terms: Some((2.8, "2020-06-15", "2050-06-15")) },
    SeedAccount { number: "A007", name: "Home Improvement",   balance: 8_500,   bank: "National Savings",   owner: Owner::Individual, savings: true,  kind: AccountType::Depo,  terms: Some((1.2, "2022-11-01", "2023-11-01")) },
    SeedAccount { number: "A008", name: "Wedding Fund",       balance: 15_000,  bank: "Global Bank",        owner: Owner::Single,     savings: true,  kind: AccountType::Depo,  terms: Some((1.8, "2022-08-15", "2024-08-15")) },
];

/// (account number, previous, new, timestamp, source)
const HISTORY: &[(&str, i64, i64, &str, &str)] = &[
    ("A001", 4_800,   5_000,   "2022-12-15T10:30:00", "manual deposit"),
    ("A002", 3_000,   2_500,   "2022-11-30T15:45:00", "withdrawal"),
    ("A004", 9_700,   10_000,  "2022-12-01T09:15:00", "interest payment"),
    ("A003", 152_000, 150_000, "2022-12-20T11:00:00", "monthly payment"),
    ("A006", 42_500,  45_000,  "2023-01-05T14:30:00", "deposit"),
    ("A007", 8_000,   8_500,   "2023-01-10T16:20:00", "manual deposit"),
    ("A008", 14_500,  15_000,  "2023-01-15T13:10:00", "deposit"),
];

pub(crate) fn apply(store: &LedgerStore, clock: &LedgerClock) -> LedgerResult<SeedSummary> {
    let mut summary = SeedSummary::default();
    let now = clock.now();
    let tx = store.transaction()?;

    for &(name, frn) in BANKS {
        if store.find_bank_by_name(name)?.is_none() {
            store.insert_bank(name, frn, now)?;
            summary.banks_added += 1;
        }
    }

    for seed in ACCOUNTS {
        if store.find_account_by_number(seed.number)?.is_some() {
            continue;
        }
        let bank = store.find_bank_by_name(seed.bank)?.ok_or_else(|| {
            LedgerError::validation(format!("seed bank '{}' missing", seed.bank))
        })?;
        let mut fields = AccountFields::new(seed.name, seed.number, Decimal::from(seed.balance), bank.id);
        fields.account_type = seed.kind;
        fields.owner = seed.owner;
        fields.savings = seed.savings;
        if let Some((rate, start, end)) = seed.terms {
            fields.interest_rate = Some(rate);
            fields.start_date = Some(parse_date(start)?);
            fields.end_date = Some(parse_date(end)?);
            fields.interest_frequency = Some(InterestFrequency::PerYear);
        }
        store.insert_account(&fields, &bank.bank_name, now)?;
        summary.accounts_added += 1;
    }

    for &(number, previous, new, at, source) in HISTORY {
        let Some(account) = store.find_account_by_number(number)? else {
            continue;
        };
        let timestamp = parse_timestamp(at)?;
        if store.transaction_log_exists_at(account.id, timestamp)? {
            continue;
        }
        store.append_transaction_log(&NewTransactionLog {
            account_id:       account.id,
            previous_balance: Decimal::from(previous),
            new_balance:      Decimal::from(new),
            timestamp,
            source,
        })?;
        summary.logs_added += 1;
    }

    tx.commit()?;
    log::info!(
        "Seeded {} bank(s), {} account(s), {} history row(s)",
        summary.banks_added,
        summary.accounts_added,
        summary.logs_added
    );
    Ok(summary)
}

fn parse_date(s: &str) -> LedgerResult<NaiveDate> {
    s.parse()
        .map_err(|e| LedgerError::Other(anyhow::anyhow!("bad seed date {s}: {e}")))
}

fn parse_timestamp(s: &str) -> LedgerResult<NaiveDateTime> {
    s.parse()
        .map_err(|e| LedgerError::Other(anyhow::anyhow!("bad seed timestamp {s}: {e}")))
}
