//! Account ledger.
//!
//! This module implements the balance-mutating core:
//! - Domain types for accounts, requests and receipts
//! - Error types for ledger operations
//! - Pure validation rules, run in one canonical order
//! - The ledger service applying credits, debits and transfers

pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use error::{ErrorKind, LedgerError};
pub use service::AccountLedger;
pub use types::{
    Account, AccountType, BalanceReceipt, LedgerLimits, TellerRequest, TransferReceipt,
    TransferRequest,
};
