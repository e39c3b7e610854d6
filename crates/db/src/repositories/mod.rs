//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

mod convert;
pub mod ledger_store;

pub use ledger_store::{PgLedgerStore, PgUnitOfWork};
