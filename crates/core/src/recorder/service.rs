//! Transaction recorder.

use std::sync::Arc;

use coffer_shared::types::AccountNumber;
use tracing::debug;

use super::types::{RecordEntry, StatementQuery, TransactionRecord};
use crate::clock::Clock;
use crate::store::{LedgerStore, StoreError, UnitOfWork};

/// Number of records in a mini statement when the caller does not say.
pub const DEFAULT_MINI_STATEMENT_LEN: u64 = 5;

/// Appends audit records and answers statement queries.
///
/// There is no update or delete: once a record is appended inside a unit of
/// work that commits, it is permanent.
pub struct TransactionRecorder<S: LedgerStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerStore> Clone for TransactionRecorder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: LedgerStore> TransactionRecorder<S> {
    /// Create a new recorder.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Appends a record to `unit`, stamping it with the current time.
    ///
    /// The record becomes visible only if `unit` commits.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store rejects the write.
    pub async fn record(
        &self,
        unit: &mut S::Unit,
        entry: RecordEntry,
    ) -> Result<TransactionRecord, StoreError> {
        let record = unit.append_record(entry.stamped(self.clock.now())).await?;
        debug!(
            record_id = %record.id,
            kind = %record.kind,
            status = %record.status,
            "transaction recorded"
        );
        Ok(record)
    }

    /// Records of one account within the query range, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store read fails.
    pub async fn statement(
        &self,
        query: &StatementQuery,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        self.store.list_records(query).await
    }

    /// The `n` most recent records of an account (default 5).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store read fails.
    pub async fn mini_statement(
        &self,
        account: AccountNumber,
        n: Option<u64>,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let query =
            StatementQuery::all(account).limit(n.unwrap_or(DEFAULT_MINI_STATEMENT_LEN));
        self.store.list_records(&query).await
    }
}
