//! `PostgreSQL` implementation of the core persistence contract.
//!
//! A unit of work is one database transaction. Account and scheduled-transfer
//! rows are locked with `SELECT ... FOR UPDATE`; due entries are claimed with
//! `FOR UPDATE SKIP LOCKED` so concurrent executors never run the same entry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{LockBehavior, LockType};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ActiveValue::Unchanged, ColumnTrait,
    Condition, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::debug;

use coffer_core::ledger::Account;
use coffer_core::recorder::{NewTransactionRecord, StatementQuery, TransactionRecord};
use coffer_core::schedule::{NewScheduledTransfer, ScheduleStatus, ScheduledTransfer};
use coffer_core::store::{LedgerStore, StoreError, UnitOfWork};
use coffer_shared::types::{AccountNumber, ScheduledTransferId};

use super::convert::db_err;
use crate::entities::{
    accounts, scheduled_transfers, sea_orm_active_enums as db, transaction_records,
};

/// Ledger store backed by a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a new store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl LedgerStore for PgLedgerStore {
    type Unit = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, StoreError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        Ok(PgUnitOfWork { txn })
    }

    async fn find_account(&self, number: AccountNumber) -> Result<Option<Account>, StoreError> {
        let model = accounts::Entity::find_by_id(number.get())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn find_scheduled(
        &self,
        id: ScheduledTransferId,
    ) -> Result<Option<ScheduledTransfer>, StoreError> {
        let model = scheduled_transfers::Entity::find_by_id(id.get())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn list_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: Option<u64>,
    ) -> Result<Vec<ScheduledTransfer>, StoreError> {
        let models = scheduled_transfers::Entity::find()
            .filter(scheduled_transfers::Column::Status.eq(db::ScheduleStatus::Pending))
            .filter(scheduled_transfers::Column::ScheduledAt.lte(now))
            .order_by_asc(scheduled_transfers::Column::ScheduledAt)
            .order_by_asc(scheduled_transfers::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_scheduled_by_account(
        &self,
        account: AccountNumber,
    ) -> Result<Vec<ScheduledTransfer>, StoreError> {
        let models = scheduled_transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(scheduled_transfers::Column::FromAccount.eq(account.get()))
                    .add(scheduled_transfers::Column::ToAccount.eq(account.get())),
            )
            .order_by_desc(scheduled_transfers::Column::CreatedAt)
            .order_by_desc(scheduled_transfers::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_records(
        &self,
        query: &StatementQuery,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut select = transaction_records::Entity::find().filter(
            Condition::any()
                .add(transaction_records::Column::FromAccount.eq(query.account.get()))
                .add(transaction_records::Column::ToAccount.eq(query.account.get())),
        );
        if let Some(from) = query.from {
            select = select.filter(transaction_records::Column::RecordedAt.gte(from));
        }
        if let Some(until) = query.until {
            select = select.filter(transaction_records::Column::RecordedAt.lte(until));
        }

        let models = select
            .order_by_desc(transaction_records::Column::RecordedAt)
            .order_by_desc(transaction_records::Column::Id)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

/// One database transaction.
///
/// Dropping it without `commit` rolls the transaction back.
pub struct PgUnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork for PgUnitOfWork {
    async fn lock_accounts(&mut self, numbers: &[AccountNumber]) -> Result<Vec<Account>, StoreError> {
        let mut keys: Vec<i64> = numbers.iter().map(|n| n.get()).collect();
        keys.sort_unstable();
        keys.dedup();

        let models = accounts::Entity::find()
            .filter(accounts::Column::Number.is_in(keys))
            .order_by_asc(accounts::Column::Number)
            .lock_exclusive()
            .all(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update_balance(&mut self, number: AccountNumber, balance: Decimal) -> Result<(), StoreError> {
        let model = accounts::ActiveModel {
            number: Unchanged(number.get()),
            balance: Set(balance),
            ..Default::default()
        };
        model.update(&self.txn).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => StoreError::MissingRow {
                entity: "account",
                id: number.get(),
            },
            other => db_err(other),
        })?;
        Ok(())
    }

    async fn append_record(
        &mut self,
        record: NewTransactionRecord,
    ) -> Result<TransactionRecord, StoreError> {
        let model = transaction_records::ActiveModel {
            id: NotSet,
            kind: Set(record.kind.into()),
            from_account: Set(record.from.map(AccountNumber::get)),
            to_account: Set(record.to.map(AccountNumber::get)),
            amount: Set(record.amount),
            recorded_at: Set(record.timestamp.into()),
            status: Set(record.status.into()),
            comment: Set(record.comment),
            scheduled_transfer_id: Set(record.scheduled_transfer_id.map(ScheduledTransferId::get)),
        }
        .insert(&self.txn)
        .await
        .map_err(db_err)?;

        debug!(record_id = model.id, "transaction record inserted");
        Ok(model.into())
    }

    async fn insert_scheduled(
        &mut self,
        entry: NewScheduledTransfer,
    ) -> Result<ScheduledTransfer, StoreError> {
        let model = scheduled_transfers::ActiveModel {
            id: NotSet,
            from_account: Set(entry.from.get()),
            to_account: Set(entry.to.get()),
            amount: Set(entry.amount),
            scheduled_at: Set(entry.scheduled_at.into()),
            created_at: Set(entry.created_at.into()),
            status: Set(db::ScheduleStatus::Pending),
            processed_at: Set(None),
        }
        .insert(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(model.into())
    }

    async fn lock_scheduled(
        &mut self,
        id: ScheduledTransferId,
    ) -> Result<Option<ScheduledTransfer>, StoreError> {
        let model = scheduled_transfers::Entity::find_by_id(id.get())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn claim_scheduled(
        &mut self,
        id: ScheduledTransferId,
    ) -> Result<Option<ScheduledTransfer>, StoreError> {
        let model = scheduled_transfers::Entity::find_by_id(id.get())
            .filter(scheduled_transfers::Column::Status.eq(db::ScheduleStatus::Pending))
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn update_scheduled_status(
        &mut self,
        id: ScheduledTransferId,
        status: ScheduleStatus,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let model = scheduled_transfers::ActiveModel {
            id: Unchanged(id.get()),
            status: Set(status.into()),
            processed_at: Set(Some(processed_at.into())),
            ..Default::default()
        };
        model.update(&self.txn).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => StoreError::MissingRow {
                entity: "scheduled_transfer",
                id: id.get(),
            },
            other => db_err(other),
        })?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(db_err)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(db_err)
    }
}
