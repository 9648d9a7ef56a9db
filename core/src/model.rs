//! Entity records as read from and written to the store.

use crate::types::{AccountId, AccountType, BankId, InterestFrequency, LogId, Owner};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source tags written on transaction log rows.
pub mod source {
    pub const ACCOUNT_CREATION: &str = "account creation";
    pub const MANUAL_UPDATE: &str = "manual update";
    pub const CSV_UPLOAD: &str = "CSV upload";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bank {
    pub id:         BankId,
    pub bank_name:  String,
    pub frn:        String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id:                 AccountId,
    pub account_name:       String,
    pub account_number:     String,
    pub balance:            Decimal,
    pub account_type:       AccountType,
    pub owner:              Owner,
    pub savings:            bool,
    /// Copy of the owning bank's name, maintained on every write.
    pub bank_name:          String,
    pub interest_rate:      Option<f64>,
    pub start_date:         Option<NaiveDate>,
    pub end_date:           Option<NaiveDate>,
    pub interest_frequency: Option<InterestFrequency>,
    pub bank_id:            Option<BankId>,
    pub created_at:         NaiveDateTime,
    pub updated_at:         NaiveDateTime,
}

/// The writable fields of an account.
///
/// Used for both create and update. Updates replace: an optional field
/// left as `None` is cleared on the stored account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountFields {
    pub account_name:       String,
    pub account_number:     String,
    #[serde(default)]
    pub balance:            Decimal,
    pub account_type:       AccountType,
    pub owner:              Owner,
    pub savings:            bool,
    pub bank_id:            Option<BankId>,
    #[serde(default)]
    pub interest_rate:      Option<f64>,
    #[serde(default)]
    pub start_date:         Option<NaiveDate>,
    #[serde(default)]
    pub end_date:           Option<NaiveDate>,
    #[serde(default)]
    pub interest_frequency: Option<InterestFrequency>,
}

impl AccountFields {
    /// Fields with only the required values set.
    pub fn new(
        account_name: impl Into<String>,
        account_number: impl Into<String>,
        balance: Decimal,
        bank_id: BankId,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_number: account_number.into(),
            balance,
            account_type: AccountType::Other,
            owner: Owner::Single,
            savings: false,
            bank_id: Some(bank_id),
            interest_rate: None,
            start_date: None,
            end_date: None,
            interest_frequency: None,
        }
    }

    /// Copy the current state of a stored account, ready for editing.
    pub fn from_account(account: &Account) -> Self {
        Self {
            account_name: account.account_name.clone(),
            account_number: account.account_number.clone(),
            balance: account.balance,
            account_type: account.account_type,
            owner: account.owner,
            savings: account.savings,
            bank_id: account.bank_id,
            interest_rate: account.interest_rate,
            start_date: account.start_date,
            end_date: account.end_date,
            interest_frequency: account.interest_frequency,
        }
    }

    /// Trim identifiers and round the balance to the stored scale.
    pub fn normalized(&self) -> Self {
        Self {
            account_name: self.account_name.trim().to_string(),
            account_number: self.account_number.trim().to_string(),
            balance: crate::types::round_money(self.balance),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionLog {
    pub id:               LogId,
    pub account_id:       AccountId,
    pub previous_balance: Decimal,
    pub new_balance:      Decimal,
    pub change_amount:    Decimal,
    pub timestamp:        NaiveDateTime,
    pub source:           String,
}

/// A log row about to be appended. `change_amount` is derived.
#[derive(Debug, Clone)]
pub struct NewTransactionLog<'a> {
    pub account_id:       AccountId,
    pub previous_balance: Decimal,
    pub new_balance:      Decimal,
    pub timestamp:        NaiveDateTime,
    pub source:           &'a str,
}

/// The most recent log row of a given source for one account, joined with
/// the account's display fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggedChange {
    pub account_number: String,
    pub account_name:   String,
    pub bank_name:      String,
    pub log:            TransactionLog,
}
