//! Report aggregator integration tests.
//!
//! Verifies that:
//!   - Grouped totals partition the overall balance
//!   - The maturity window is inclusive at both ends and ordered soonest first
//!   - Every report reflects the latest commit, including from a second connection
//!   - Import results reach the report view once, and only while current
//!   - Dashboard, chart and backup views are built from the same data

use chrono::NaiveDate;
use ledger_core::{
    clock::LedgerClock,
    config::LedgerConfig,
    error::LedgerError,
    ledger::Ledger,
    model::{AccountFields, Bank},
    store::LedgerStore,
    types::{AccountType, InterestFrequency, Owner},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ledger_at(today: NaiveDate) -> Ledger {
    let _ = env_logger::builder().is_test(true).try_init();
    Ledger::build_test(LedgerClock::fixed_date(today)).unwrap()
}

fn seeded_ledger() -> Ledger {
    let mut ledger = ledger_at(date(2026, 8, 15));
    ledger.seed_sample_data().unwrap();
    ledger
}

fn maturing(number: &str, end: NaiveDate, bank: &Bank) -> AccountFields {
    let mut fields = AccountFields::new(format!("Bond {number}"), number, dec!(1000), bank.id);
    fields.account_type = AccountType::Depo;
    fields.end_date = Some(end);
    fields
}

// ── Aggregates ────────────────────────────────────────────────────

#[test]
fn totals_by_type_partition_the_total() {
    let ledger = seeded_ledger();
    let reports = ledger.reports();

    let by_type = reports.accounts_by_type().unwrap();
    let labels: Vec<_> = by_type.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, ["depo", "isa", "none"]);
    assert_eq!(by_type[0].total, dec!(28500));
    assert_eq!(by_type[1].total, dec!(57500));
    assert_eq!(by_type[2].total, dec!(162000));
    assert_eq!(by_type.iter().map(|g| g.count).sum::<i64>(), 8);

    let sum: Decimal = by_type.iter().map(|g| g.total).sum();
    assert_eq!(sum, reports.total_balance().unwrap());
    assert_eq!(sum, dec!(248000));
}

#[test]
fn totals_by_owner_partition_the_total() {
    let ledger = seeded_ledger();
    let by_owner = ledger.reports().accounts_by_owner().unwrap();

    let rows: Vec<_> = by_owner
        .iter()
        .map(|g| (g.label.as_str(), g.count, g.total))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("a", 3, dec!(29500)),
            ("i", 2, dec!(18500)),
            ("j", 3, dec!(200000)),
        ]
    );
}

/// Grouped by (FRN, owner), ordered by FRN then owner code.
#[test]
fn frn_owner_groups_are_ordered() {
    let ledger = seeded_ledger();
    let groups = ledger.reports().accounts_by_bank_ref_and_owner().unwrap();

    let rows: Vec<_> = groups
        .iter()
        .map(|g| (g.frn.as_str(), g.owner, g.account_count, g.total_balance))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("FRN001", Owner::Single, 1, dec!(15000)),
            ("FRN001", Owner::Joint, 2, dec!(155000)),
            ("FRN002", Owner::Single, 2, dec!(14500)),
            ("FRN003", Owner::Individual, 2, dec!(18500)),
            ("FRN004", Owner::Joint, 1, dec!(45000)),
        ]
    );

    let by_frn = ledger.reports().balance_by_bank_ref().unwrap();
    let totals: Vec<_> = by_frn.iter().map(|b| (b.frn.as_str(), b.total_balance)).collect();
    assert_eq!(
        totals,
        vec![
            ("FRN001", dec!(170000)),
            ("FRN002", dec!(14500)),
            ("FRN003", dec!(18500)),
            ("FRN004", dec!(45000)),
        ]
    );
}

#[test]
fn empty_ledger_reports_zero() {
    let ledger = ledger_at(date(2025, 6, 1));
    let reports = ledger.reports();

    assert_eq!(reports.total_balance().unwrap(), Decimal::ZERO);
    assert!(reports.accounts_by_type().unwrap().is_empty());
    assert!(reports.accounts_by_bank_ref_and_owner().unwrap().is_empty());
    assert!(reports.maturing_accounts(30).unwrap().is_empty());
}

// ── Maturity window ───────────────────────────────────────────────

/// Today and today + 30 are in; yesterday and today + 31 are out.
#[test]
fn maturity_window_is_inclusive() {
    let today = date(2025, 6, 1);
    let mut ledger = ledger_at(today);
    let bank = ledger.create_bank("Global Bank", "FRN001").unwrap();

    ledger.create_account(&maturing("M31", date(2025, 7, 2), &bank)).unwrap();
    ledger.create_account(&maturing("M30", date(2025, 7, 1), &bank)).unwrap();
    ledger.create_account(&maturing("M00", today, &bank)).unwrap();
    ledger.create_account(&maturing("M-1", date(2025, 5, 31), &bank)).unwrap();
    ledger.create_account(&maturing("M14", date(2025, 6, 15), &bank)).unwrap();
    ledger
        .create_account(&AccountFields::new("Open ended", "N01", dec!(5), bank.id))
        .unwrap();

    let numbers: Vec<_> = ledger
        .reports()
        .maturing_accounts(30)
        .unwrap()
        .into_iter()
        .map(|a| a.account_number)
        .collect();
    assert_eq!(numbers, ["M00", "M14", "M30"]);
}

#[test]
fn maturity_window_follows_the_clock() {
    let mut ledger = seeded_ledger();
    let numbers = |ledger: &Ledger| -> Vec<String> {
        ledger
            .reports()
            .maturing_accounts(30)
            .unwrap()
            .into_iter()
            .map(|a| a.account_number)
            .collect()
    };
    assert_eq!(numbers(&ledger), ["A004"]);

    ledger.clock.advance(chrono::Duration::days(30));
    assert!(numbers(&ledger).is_empty(), "A004 ended before the new today");
}

/// A window past the last representable date is an error, not a panic.
#[test]
fn oversized_window_is_rejected() {
    let ledger = seeded_ledger();

    for days in [100_000_000, i64::MAX] {
        let err = ledger.reports().maturing_accounts(days).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)), "got {err:?}");
    }
    assert_eq!(ledger.reports().maturing_accounts(36_525).unwrap().len(), 2);
}

/// A config built in code skips file validation; reports still fail cleanly.
#[test]
fn oversized_configured_window_fails_reports() {
    let config = LedgerConfig {
        maturity_window_days: 100_000_000,
        ..LedgerConfig::default_test()
    };
    let store = LedgerStore::in_memory().unwrap();
    store.migrate().unwrap();
    let ledger = Ledger::new(store, LedgerClock::fixed_date(date(2026, 8, 15)), config);

    assert!(matches!(ledger.dashboard(), Err(LedgerError::Validation(_))));
    assert!(matches!(ledger.report_view(None), Err(LedgerError::Validation(_))));
}

// ── Freshness ─────────────────────────────────────────────────────

/// A deleted account disappears from every aggregate on the next call.
#[test]
fn deletion_is_reflected_immediately() {
    let mut ledger = seeded_ledger();
    let reports_before = ledger.reports().accounts_by_type().unwrap();
    assert_eq!(reports_before[2].count, 2);

    let mortgage = ledger.find_account("A003").unwrap().unwrap();
    ledger.delete_account(mortgage.id).unwrap();

    let reports = ledger.reports();
    assert_eq!(reports.total_balance().unwrap(), dec!(98000));
    let none = reports
        .accounts_by_type()
        .unwrap()
        .into_iter()
        .find(|g| g.label == "none")
        .unwrap();
    assert_eq!((none.count, none.total), (1, dec!(12000)));
    let frn001 = reports
        .balance_by_bank_ref()
        .unwrap()
        .into_iter()
        .find(|b| b.frn == "FRN001")
        .unwrap();
    assert_eq!(frn001.total_balance, dec!(20000));
}

/// A reader on its own connection sees the writer's commits.
#[test]
fn second_connection_sees_latest_commit() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig {
        database_path: dir.path().join("ledger.db").to_string_lossy().into_owned(),
        ..LedgerConfig::default()
    };
    let mut writer = Ledger::open(config.clone()).unwrap();
    let reader = Ledger::open(config).unwrap();

    assert_eq!(reader.reports().total_balance().unwrap(), Decimal::ZERO);

    let bank = writer.create_bank("Global Bank", "FRN001").unwrap();
    let account = writer
        .create_account(&AccountFields::new("Emergency Fund", "A001", dec!(5000), bank.id))
        .unwrap();
    assert_eq!(reader.reports().total_balance().unwrap(), dec!(5000));

    let mut fields = AccountFields::from_account(&account);
    fields.balance = dec!(5250.50);
    writer.update_account(account.id, &fields).unwrap();
    assert_eq!(reader.reports().total_balance().unwrap(), dec!(5250.50));

    writer.delete_account(account.id).unwrap();
    assert!(reader.reports().accounts_by_owner().unwrap().is_empty());
}

// ── Import results in the report view ─────────────────────────────

#[test]
fn import_results_are_shown_once() {
    let mut ledger = seeded_ledger();
    let handle = ledger
        .import_csv("Account,bal\nA001,5200.00\nZZZ,1\n".as_bytes())
        .unwrap();

    let view = ledger.report_view(Some(handle)).unwrap();
    let shown = view.csv_results.expect("fresh import is shown");
    assert_eq!(shown.updated, 1);
    assert_eq!(shown.not_found, 1);

    let next = ledger.report_view(None).unwrap();
    assert!(next.csv_results.is_none());
}

/// Any write after the import makes its handle stale.
#[test]
fn stale_import_results_are_dropped() {
    let mut ledger = seeded_ledger();
    let handle = ledger.import_csv("Account,bal\nA001,5200.00\n".as_bytes()).unwrap();

    ledger.create_bank("Fresh Bank", "FRN099").unwrap();

    let view = ledger.report_view(Some(handle)).unwrap();
    assert!(view.csv_results.is_none());
    assert_eq!(view.maturing_accounts.len(), 1);
    assert_eq!(view.owner_balances.len(), 3);
}

// ── Dashboard, charts, backup ─────────────────────────────────────

#[test]
fn dashboard_summarises_the_ledger() {
    let ledger = seeded_ledger();
    let dashboard = ledger.dashboard().unwrap();

    assert_eq!(dashboard.account_count, 8);
    assert_eq!(dashboard.total_balance, dec!(248000));
    assert_eq!(dashboard.maturing_soon, 1);
    assert_eq!(dashboard.recent_transactions.len(), 5);
    // Newest seeded history row is A008's deposit on 2023-01-15.
    assert_eq!(dashboard.recent_transactions[0].new_balance, dec!(15000));
    let timestamps: Vec<_> = dashboard
        .recent_transactions
        .iter()
        .map(|t| t.timestamp)
        .collect();
    assert!(timestamps.windows(2).all(|w| w[0] >= w[1]), "newest first");
}

#[test]
fn chart_series_count_accounts() {
    let ledger = seeded_ledger();
    let charts = ledger.chart_data().unwrap();

    assert_eq!(charts.account_types.labels, ["depo", "isa", "none"]);
    assert_eq!(charts.account_types.values, [3, 3, 2]);
    assert_eq!(charts.owners.labels, ["a", "i", "j"]);
    assert_eq!(charts.owners.values, [3, 2, 3]);
    assert_eq!(charts.frns.labels, ["FRN001", "FRN002", "FRN003", "FRN004"]);
    assert_eq!(charts.frns.values, [3, 2, 2, 1]);
}

/// Interest terms are exported only for typed accounts.
#[test]
fn backup_omits_terms_for_untyped_accounts() {
    let mut ledger = ledger_at(date(2025, 6, 1));
    let bank = ledger.create_bank("Global Bank", "FRN001").unwrap();

    let mut bond = maturing("B01", date(2026, 6, 1), &bank);
    bond.interest_rate = Some(4.25);
    bond.interest_frequency = Some(InterestFrequency::PerMonth);
    ledger.create_account(&bond).unwrap();

    let mut plain = AccountFields::new("Current", "C01", dec!(10), bank.id);
    plain.interest_rate = Some(0.1);
    ledger.create_account(&plain).unwrap();

    let backup = ledger.backup().unwrap();
    assert_eq!(backup.len(), 2);

    let json = serde_json::to_value(&backup).unwrap();
    let bond_json = &json[0];
    assert_eq!(bond_json["account_number"], "B01");
    assert_eq!(bond_json["account_type"], "depo");
    assert_eq!(bond_json["interest_rate"], 4.25);
    assert_eq!(bond_json["interest_frequency"], "per month");
    assert_eq!(bond_json["end_date"], "2026-06-01");

    let plain_json = json[1].as_object().unwrap();
    assert_eq!(plain_json["account_number"], "C01");
    assert!(!plain_json.contains_key("interest_rate"));
    assert!(!plain_json.contains_key("end_date"));
}
