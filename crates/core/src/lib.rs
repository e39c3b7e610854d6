//! Core ledger logic for Coffer.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached only through the traits in [`store`].
//!
//! # Modules
//!
//! - `policy` - Account status eligibility rules
//! - `ledger` - Credits, debits and transfers under status and funds rules
//! - `recorder` - Append-only audit trail and statements
//! - `schedule` - Deferred transfers: registry and periodic executor
//! - `store` - Persistence contract and the in-memory store
//! - `clock` - Injectable time source
//! - `credentials` - Transaction password verification collaborator

pub mod clock;
pub mod credentials;
pub mod ledger;
pub mod policy;
pub mod recorder;
pub mod schedule;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::CredentialVerifier;
pub use ledger::{AccountLedger, LedgerError};
pub use recorder::TransactionRecorder;
pub use schedule::{ScheduleError, ScheduledTransferExecutor, ScheduledTransferRegistry};
pub use store::{LedgerStore, MemoryStore, StoreError, UnitOfWork};
