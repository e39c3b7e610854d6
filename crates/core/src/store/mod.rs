//! Persistence collaborator contract.
//!
//! The core never talks to a database directly. It asks a [`LedgerStore`] for
//! a [`UnitOfWork`], performs every read and write of one operation through
//! it, then commits or rolls back. The db crate implements these traits over
//! `PostgreSQL`; [`MemoryStore`] implements them in process.
//!
//! Lock ordering: a scheduled-transfer row is locked before any account row,
//! and account rows are locked in ascending account-number order.

pub mod error;
pub mod memory;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use coffer_shared::types::{AccountNumber, ScheduledTransferId};

use crate::ledger::Account;
use crate::recorder::{NewTransactionRecord, StatementQuery, TransactionRecord};
use crate::schedule::{NewScheduledTransfer, ScheduleStatus, ScheduledTransfer};

pub use error::StoreError;
pub use memory::MemoryStore;

/// Shared handle to durable storage.
///
/// Implemented by the db crate to provide actual database operations.
pub trait LedgerStore: Send + Sync {
    /// The atomic unit this store hands out.
    type Unit: UnitOfWork;

    /// Opens a new unit of work.
    fn begin(&self) -> impl std::future::Future<Output = Result<Self::Unit, StoreError>> + Send;

    /// Reads an account without locking it.
    fn find_account(
        &self,
        number: AccountNumber,
    ) -> impl std::future::Future<Output = Result<Option<Account>, StoreError>> + Send;

    /// Reads a scheduled transfer without locking it.
    fn find_scheduled(
        &self,
        id: ScheduledTransferId,
    ) -> impl std::future::Future<Output = Result<Option<ScheduledTransfer>, StoreError>> + Send;

    /// Pending entries with `scheduled_at <= now`, oldest first, at most
    /// `limit` when one is given.
    fn list_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: Option<u64>,
    ) -> impl std::future::Future<Output = Result<Vec<ScheduledTransfer>, StoreError>> + Send;

    /// Entries where the account is source or destination, newest first.
    fn list_scheduled_by_account(
        &self,
        account: AccountNumber,
    ) -> impl std::future::Future<Output = Result<Vec<ScheduledTransfer>, StoreError>> + Send;

    /// Records matching a statement query, newest first.
    fn list_records(
        &self,
        query: &StatementQuery,
    ) -> impl std::future::Future<Output = Result<Vec<TransactionRecord>, StoreError>> + Send;
}

/// One atomic unit: every write becomes visible on `commit`, or none does.
///
/// Dropping a unit without committing discards it.
pub trait UnitOfWork: Send {
    /// Locks the given accounts exclusively, in ascending number order.
    ///
    /// Accounts that do not exist are omitted from the result.
    fn lock_accounts(
        &mut self,
        numbers: &[AccountNumber],
    ) -> impl std::future::Future<Output = Result<Vec<Account>, StoreError>> + Send;

    /// Overwrites the balance of an account locked by this unit.
    fn update_balance(
        &mut self,
        number: AccountNumber,
        balance: Decimal,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Appends an audit record; the store assigns its identifier.
    fn append_record(
        &mut self,
        record: NewTransactionRecord,
    ) -> impl std::future::Future<Output = Result<TransactionRecord, StoreError>> + Send;

    /// Persists a new scheduled transfer; the store assigns its identifier.
    fn insert_scheduled(
        &mut self,
        entry: NewScheduledTransfer,
    ) -> impl std::future::Future<Output = Result<ScheduledTransfer, StoreError>> + Send;

    /// Locks a scheduled transfer exclusively, waiting for other holders.
    fn lock_scheduled(
        &mut self,
        id: ScheduledTransferId,
    ) -> impl std::future::Future<Output = Result<Option<ScheduledTransfer>, StoreError>> + Send;

    /// Locks a scheduled transfer only if it is still Pending and no other
    /// unit holds it. Returns `None` otherwise.
    fn claim_scheduled(
        &mut self,
        id: ScheduledTransferId,
    ) -> impl std::future::Future<Output = Result<Option<ScheduledTransfer>, StoreError>> + Send;

    /// Moves a locked scheduled transfer to `status`.
    fn update_scheduled_status(
        &mut self,
        id: ScheduledTransferId,
        status: ScheduleStatus,
        processed_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Makes every write of this unit visible.
    fn commit(self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Discards every write of this unit.
    fn rollback(self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
