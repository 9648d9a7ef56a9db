//! ledger-core: bank account bookkeeping on top of SQLite.
//!
//! Layering, leaf-first:
//!   store       the only module that talks to the database
//!   lifecycle   create/update/delete for banks and accounts
//!   importer    bulk balance updates from tabular (CSV) input
//!   report      read-only aggregates over the store
//!   ledger      facade that owns the store, clock and config

pub mod clock;
pub mod config;
pub mod csv_input;
pub mod error;
pub mod importer;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod report;
pub mod seed;
pub mod store;
pub mod types;
