//! ledger-cli: headless runner for the bank ledger.
//!
//! Usage:
//!   ledger-cli --db ledger.db init-db
//!   ledger-cli --db ledger.db import balances.csv
//!   ledger-cli --db ledger.db report | dashboard | charts | backup | snapshots
//!   ledger-cli --db ledger.db serve          (JSON lines on stdin/stdout)
//!   ledger-cli --config ledger.json report

use anyhow::Result;
use ledger_core::{
    config::LedgerConfig,
    importer::ImportHandle,
    ledger::Ledger,
    model::AccountFields,
    types::{AccountId, BankId},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    ListBanks,
    CreateBank { bank_name: String, frn: String },
    UpdateBank { id: BankId, bank_name: String, frn: String },
    DeleteBank { id: BankId },
    ListAccounts,
    CreateAccount { account: AccountFields },
    UpdateAccount { id: AccountId, account: AccountFields },
    DeleteAccount { id: AccountId },
    History { id: AccountId },
    ImportCsv { path: String },
    Report,
    Dashboard,
    Charts,
    Backup,
    Snapshots,
    Quit,
}

/// Flags that take a value; everything else is positional.
const VALUE_FLAGS: &[&str] = &["--db", "--config"];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut config = match flag_value(&args, "--config") {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(db) = flag_value(&args, "--db") {
        config.database_path = db.to_string();
    }
    let positional = positionals(&args);
    let command = positional.first().copied().unwrap_or("dashboard");

    log::debug!("db: {}  command: {command}", config.database_path);
    let mut ledger = Ledger::open(config)?;

    match command {
        "init-db" => {
            let summary = ledger.seed_sample_data()?;
            println!("Database initialized at {}", ledger.config().database_path);
            print_json(&summary)?;
        }
        "import" => {
            let path = positional
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("usage: ledger-cli import <file.csv>"))?;
            let handle = ledger.import_csv_file(path)?;
            eprintln!("{}", handle.result().summary());
            // The import hands its results to exactly one report view.
            print_json(&ledger.report_view(Some(handle))?)?;
        }
        "report" => print_json(&ledger.report_view(None)?)?,
        "dashboard" => print_json(&ledger.dashboard()?)?,
        "charts" => print_json(&ledger.chart_data()?)?,
        "backup" => print_json(&ledger.backup()?)?,
        "snapshots" => print_json(&ledger.latest_csv_snapshots()?)?,
        "serve" => run_ipc_loop(&mut ledger)?,
        other => anyhow::bail!("unknown command '{other}'"),
    }

    Ok(())
}

fn run_ipc_loop(ledger: &mut Ledger) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut last_import: Option<ImportHandle> = None;

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let response = match handle_command(ledger, &mut last_import, cmd) {
            Ok(value) => serde_json::json!({ "ok": value }),
            Err(e) => {
                log::warn!("Command failed: {e}");
                serde_json::json!({ "error": e.to_string() })
            }
        };
        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(
    ledger: &mut Ledger,
    last_import: &mut Option<ImportHandle>,
    cmd: IpcCommand,
) -> Result<serde_json::Value> {
    let value = match cmd {
        IpcCommand::ListBanks => serde_json::to_value(ledger.list_banks()?)?,
        IpcCommand::CreateBank { bank_name, frn } => {
            serde_json::to_value(ledger.create_bank(&bank_name, &frn)?)?
        }
        IpcCommand::UpdateBank { id, bank_name, frn } => {
            serde_json::to_value(ledger.update_bank(id, &bank_name, &frn)?)?
        }
        IpcCommand::DeleteBank { id } => serde_json::to_value(ledger.delete_bank(id)?)?,
        IpcCommand::ListAccounts => serde_json::to_value(ledger.list_accounts()?)?,
        IpcCommand::CreateAccount { account } => {
            serde_json::to_value(ledger.create_account(&account)?)?
        }
        IpcCommand::UpdateAccount { id, account } => {
            serde_json::to_value(ledger.update_account(id, &account)?)?
        }
        IpcCommand::DeleteAccount { id } => serde_json::to_value(ledger.delete_account(id)?)?,
        IpcCommand::History { id } => serde_json::to_value(ledger.account_history(id)?)?,
        IpcCommand::ImportCsv { path } => {
            let handle = ledger.import_csv_file(&path)?;
            let value = serde_json::to_value(handle.result())?;
            *last_import = Some(handle);
            value
        }
        IpcCommand::Report => serde_json::to_value(ledger.report_view(last_import.take())?)?,
        IpcCommand::Dashboard => serde_json::to_value(ledger.dashboard()?)?,
        IpcCommand::Charts => serde_json::to_value(ledger.chart_data()?)?,
        IpcCommand::Backup => serde_json::to_value(ledger.backup()?)?,
        IpcCommand::Snapshots => serde_json::to_value(ledger.latest_csv_snapshots()?)?,
        IpcCommand::Quit => serde_json::Value::Null,
    };
    Ok(value)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        out.push(arg.as_str());
    }
    out
}
