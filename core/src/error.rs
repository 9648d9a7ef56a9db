use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid import format: {0}")]
    Format(String),

    #[error("Row for account '{account}' failed: {message}")]
    RowProcessing { account: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn row(account: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RowProcessing {
            account: account.into(),
            message: message.into(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
