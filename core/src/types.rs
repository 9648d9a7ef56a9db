//! Shared primitive types used across the ledger.

use crate::error::{LedgerError, LedgerResult};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type BankId = i64;
pub type AccountId = i64;
pub type LogId = i64;

/// Balances are kept to the penny.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to the persisted scale, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an amount to integer minor units (pence) for storage.
pub fn to_minor_units(amount: Decimal) -> LedgerResult<i64> {
    round_money(amount)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.to_i64())
        .ok_or_else(|| LedgerError::validation(format!("amount {amount} is out of range")))
}

/// Inverse of [`to_minor_units`].
pub fn from_minor_units(units: i64) -> Decimal {
    Decimal::new(units, MONEY_SCALE)
}

/// Defines a closed set of short text codes persisted as TEXT columns.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($code => Ok($name::$variant),)+
                    other => Err(LedgerError::validation(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: LedgerError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

code_enum! {
    /// Tax wrapper / product family of an account. `Other` is stored as "none".
    pub enum AccountType {
        Isa   => "isa",
        Depo  => "depo",
        Nsi   => "nsi",
        Other => "none",
    }
}

code_enum! {
    /// Whose money the account holds.
    pub enum Owner {
        Single     => "a",
        Individual => "i",
        Joint      => "j",
    }
}

code_enum! {
    pub enum InterestFrequency {
        PerYear  => "per year",
        PerMonth => "per month",
    }
}

/// Savings flag as persisted ('y' / 'n').
pub fn savings_code(savings: bool) -> &'static str {
    if savings {
        "y"
    } else {
        "n"
    }
}

pub fn parse_savings_code(code: &str) -> bool {
    code.eq_ignore_ascii_case("y")
}
