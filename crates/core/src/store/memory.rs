//! In-process `LedgerStore`.
//!
//! A unit of work holds the store-wide lock for its whole lifetime and writes
//! to a private copy of the state; `commit` swaps the copy in. That gives the
//! same all-or-nothing and exclusivity guarantees as row locks, only coarser.
//!
//! Faults can be injected to exercise the failure paths of the ledger and the
//! executor without a database.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use coffer_shared::types::{AccountNumber, ScheduledTransferId, TransactionRecordId};

use super::{LedgerStore, StoreError, UnitOfWork};
use crate::ledger::Account;
use crate::recorder::{NewTransactionRecord, StatementQuery, TransactionRecord};
use crate::schedule::{NewScheduledTransfer, ScheduleStatus, ScheduledTransfer};

#[derive(Debug, Clone)]
struct MemoryState {
    accounts: BTreeMap<AccountNumber, Account>,
    records: Vec<TransactionRecord>,
    scheduled: BTreeMap<ScheduledTransferId, ScheduledTransfer>,
    next_record_id: i64,
    next_scheduled_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            accounts: BTreeMap::new(),
            records: Vec::new(),
            scheduled: BTreeMap::new(),
            next_record_id: TransactionRecordId::FIRST.get(),
            next_scheduled_id: 1,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    /// Counts down on every balance write; the write that takes it from 1 to 0 fails.
    balance_write: AtomicU64,
    commit: AtomicBool,
}

impl Faults {
    fn take_balance_write(&self) -> bool {
        self.balance_write
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            == Ok(1)
    }

    fn take_commit(&self) -> bool {
        self.commit.swap(false, Ordering::SeqCst)
    }
}

/// `LedgerStore` kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an account, standing in for the account-opening flow.
    pub async fn insert_account(&self, account: Account) {
        self.state
            .lock()
            .await
            .accounts
            .insert(account.number, account);
    }

    /// Makes the `n`-th balance write from now on fail (1 = the next one).
    pub fn fail_balance_write(&self, n: u64) {
        self.faults.balance_write.store(n, Ordering::SeqCst);
    }

    /// Makes the next commit fail; its unit is discarded.
    pub fn fail_next_commit(&self) {
        self.faults.commit.store(true, Ordering::SeqCst);
    }
}

impl LedgerStore for MemoryStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<MemoryUnit, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnit {
            guard,
            working,
            faults: Arc::clone(&self.faults),
        })
    }

    async fn find_account(&self, number: AccountNumber) -> Result<Option<Account>, StoreError> {
        Ok(self.state.lock().await.accounts.get(&number).cloned())
    }

    async fn find_scheduled(
        &self,
        id: ScheduledTransferId,
    ) -> Result<Option<ScheduledTransfer>, StoreError> {
        Ok(self.state.lock().await.scheduled.get(&id).cloned())
    }

    async fn list_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: Option<u64>,
    ) -> Result<Vec<ScheduledTransfer>, StoreError> {
        let state = self.state.lock().await;
        let mut due: Vec<ScheduledTransfer> = state
            .scheduled
            .values()
            .filter(|e| e.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|e| (e.scheduled_at, e.id));
        truncate(&mut due, limit);
        Ok(due)
    }

    async fn list_scheduled_by_account(
        &self,
        account: AccountNumber,
    ) -> Result<Vec<ScheduledTransfer>, StoreError> {
        let state = self.state.lock().await;
        let mut entries: Vec<ScheduledTransfer> = state
            .scheduled
            .values()
            .filter(|e| e.involves(account))
            .cloned()
            .collect();
        entries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(entries)
    }

    async fn list_records(
        &self,
        query: &StatementQuery,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut records: Vec<TransactionRecord> = state
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        truncate(&mut records, query.limit);
        Ok(records)
    }
}

fn truncate<T>(items: &mut Vec<T>, limit: Option<u64>) {
    if let Some(limit) = limit {
        items.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }
}

/// Unit of work over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryUnit {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Faults>,
}

impl UnitOfWork for MemoryUnit {
    async fn lock_accounts(&mut self, numbers: &[AccountNumber]) -> Result<Vec<Account>, StoreError> {
        let mut numbers = numbers.to_vec();
        numbers.sort_unstable();
        numbers.dedup();
        Ok(numbers
            .iter()
            .filter_map(|n| self.working.accounts.get(n).cloned())
            .collect())
    }

    async fn update_balance(&mut self, number: AccountNumber, balance: Decimal) -> Result<(), StoreError> {
        if self.faults.take_balance_write() {
            return Err(StoreError::database(format!(
                "injected failure writing balance of account {number}"
            )));
        }
        let account = self
            .working
            .accounts
            .get_mut(&number)
            .ok_or(StoreError::MissingRow {
                entity: "account",
                id: number.get(),
            })?;
        account.balance = balance;
        Ok(())
    }

    async fn append_record(
        &mut self,
        record: NewTransactionRecord,
    ) -> Result<TransactionRecord, StoreError> {
        let id = TransactionRecordId(self.working.next_record_id);
        self.working.next_record_id += 1;
        let record = record.with_id(id);
        self.working.records.push(record.clone());
        Ok(record)
    }

    async fn insert_scheduled(
        &mut self,
        entry: NewScheduledTransfer,
    ) -> Result<ScheduledTransfer, StoreError> {
        let id = ScheduledTransferId(self.working.next_scheduled_id);
        self.working.next_scheduled_id += 1;
        let entry = entry.with_id(id);
        self.working.scheduled.insert(id, entry.clone());
        Ok(entry)
    }

    async fn lock_scheduled(
        &mut self,
        id: ScheduledTransferId,
    ) -> Result<Option<ScheduledTransfer>, StoreError> {
        Ok(self.working.scheduled.get(&id).cloned())
    }

    async fn claim_scheduled(
        &mut self,
        id: ScheduledTransferId,
    ) -> Result<Option<ScheduledTransfer>, StoreError> {
        Ok(self
            .working
            .scheduled
            .get(&id)
            .filter(|e| e.status == ScheduleStatus::Pending)
            .cloned())
    }

    async fn update_scheduled_status(
        &mut self,
        id: ScheduledTransferId,
        status: ScheduleStatus,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let entry = self
            .working
            .scheduled
            .get_mut(&id)
            .ok_or(StoreError::MissingRow {
                entity: "scheduled_transfer",
                id: id.get(),
            })?;
        entry.status = status;
        entry.processed_at = Some(processed_at);
        Ok(())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        if self.faults.take_commit() {
            return Err(StoreError::database("injected commit failure"));
        }
        *self.guard = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AccountType;
    use crate::policy::AccountStatus;
    use chrono::Duration;
    use coffer_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn account(number: i64) -> Account {
        Account {
            number: AccountNumber(number),
            user_id: UserId(1),
            account_type: AccountType::Current,
            balance: dec!(10),
            status: AccountStatus::Active,
            ifsc_code: "CFR0000001".to_string(),
            opened_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_lock_accounts_sorted_and_missing_omitted() {
        let store = MemoryStore::new();
        store.insert_account(account(30)).await;
        store.insert_account(account(10)).await;

        let mut unit = store.begin().await.unwrap();
        let locked = unit
            .lock_accounts(&[AccountNumber(30), AccountNumber(99), AccountNumber(10)])
            .await
            .unwrap();
        let numbers: Vec<_> = locked.iter().map(|a| a.number).collect();
        assert_eq!(numbers, vec![AccountNumber(10), AccountNumber(30)]);
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        store.insert_account(account(10)).await;

        let mut unit = store.begin().await.unwrap();
        unit.update_balance(AccountNumber(10), dec!(99)).await.unwrap();
        unit.rollback().await.unwrap();
        let balance = store.find_account(AccountNumber(10)).await.unwrap().unwrap().balance;
        assert_eq!(balance, dec!(10));

        let mut unit = store.begin().await.unwrap();
        unit.update_balance(AccountNumber(10), dec!(99)).await.unwrap();
        unit.commit().await.unwrap();
        let balance = store.find_account(AccountNumber(10)).await.unwrap().unwrap().balance;
        assert_eq!(balance, dec!(99));
    }

    #[tokio::test]
    async fn test_balance_write_fault_fires_once() {
        let store = MemoryStore::new();
        store.insert_account(account(10)).await;
        store.fail_balance_write(2);

        let mut unit = store.begin().await.unwrap();
        assert!(unit.update_balance(AccountNumber(10), dec!(1)).await.is_ok());
        assert!(unit.update_balance(AccountNumber(10), dec!(2)).await.is_err());
        assert!(unit.update_balance(AccountNumber(10), dec!(3)).await.is_ok());
    }

    #[tokio::test]
    async fn test_claim_only_pending() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut unit = store.begin().await.unwrap();
        let entry = unit
            .insert_scheduled(NewScheduledTransfer {
                from: AccountNumber(1),
                to: AccountNumber(2),
                amount: dec!(5),
                scheduled_at: now + Duration::minutes(1),
                created_at: now,
            })
            .await
            .unwrap();
        assert!(unit.claim_scheduled(entry.id).await.unwrap().is_some());

        unit.update_scheduled_status(entry.id, ScheduleStatus::Cancelled, now)
            .await
            .unwrap();
        assert!(unit.claim_scheduled(entry.id).await.unwrap().is_none());
        assert!(unit.lock_scheduled(entry.id).await.unwrap().is_some());
        unit.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_record_ids_start_at_first() {
        let store = MemoryStore::new();
        let mut unit = store.begin().await.unwrap();
        let record = unit
            .append_record(NewTransactionRecord {
                kind: crate::recorder::TransactionKind::Credit,
                from: None,
                to: Some(AccountNumber(1)),
                amount: dec!(1),
                timestamp: Utc::now(),
                status: crate::recorder::RecordStatus::Completed,
                comment: String::new(),
                scheduled_transfer_id: None,
            })
            .await
            .unwrap();
        assert_eq!(record.id, TransactionRecordId::FIRST);
    }
}
