use serde::{Deserialize, Serialize};

/// Roughly a century.
pub const MAX_MATURITY_WINDOW_DAYS: i64 = 36_525;

/// Runtime configuration. Every field has a default, so a config file
/// only needs to name what it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// SQLite path, or ":memory:".
    pub database_path: String,
    /// Days ahead of today that count as "maturing soon".
    pub maturity_window_days: i64,
    /// How many transactions the dashboard lists.
    pub recent_transaction_limit: usize,
    pub import: ImportConfig,
}

/// Column names expected in a bulk balance import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    pub account_column: String,
    pub balance_column: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: "ledger.db".into(),
            maturity_window_days: 30,
            recent_transaction_limit: 5,
            import: ImportConfig::default(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            account_column: "Account".into(),
            balance_column: "bal".into(),
        }
    }
}

impl LedgerConfig {
    /// Load from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: LedgerConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// In-memory database, default windows. Used by tests.
    pub fn default_test() -> Self {
        Self {
            database_path: ":memory:".into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(0..=MAX_MATURITY_WINDOW_DAYS).contains(&self.maturity_window_days) {
            anyhow::bail!(
                "maturity_window_days must be between 0 and {MAX_MATURITY_WINDOW_DAYS}, got {}",
                self.maturity_window_days
            );
        }
        if self.import.account_column.trim().is_empty()
            || self.import.balance_column.trim().is_empty()
        {
            anyhow::bail!("import column names must not be empty");
        }
        Ok(())
    }
}
