//! Mapping between entity models and core domain types.

use chrono::Utc;
use sea_orm::DbErr;

use coffer_core::ledger::{Account, AccountType};
use coffer_core::policy::AccountStatus;
use coffer_core::recorder::{RecordStatus, TransactionKind, TransactionRecord};
use coffer_core::schedule::{ScheduleStatus, ScheduledTransfer};
use coffer_core::store::StoreError;
use coffer_shared::types::{AccountNumber, ScheduledTransferId, TransactionRecordId, UserId};

use crate::entities::{accounts, scheduled_transfers, sea_orm_active_enums as db, transaction_records};

/// Wraps a `SeaORM` error for the core.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn db_err(err: DbErr) -> StoreError {
    StoreError::Database(err.to_string())
}

impl From<db::AccountStatus> for AccountStatus {
    fn from(status: db::AccountStatus) -> Self {
        match status {
            db::AccountStatus::Active => Self::Active,
            db::AccountStatus::Suspended => Self::Suspended,
            db::AccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<AccountStatus> for db::AccountStatus {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Active => Self::Active,
            AccountStatus::Suspended => Self::Suspended,
            AccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<db::AccountType> for AccountType {
    fn from(account_type: db::AccountType) -> Self {
        match account_type {
            db::AccountType::Savings => Self::Savings,
            db::AccountType::Current => Self::Current,
            db::AccountType::FixedDeposit => Self::FixedDeposit,
        }
    }
}

impl From<AccountType> for db::AccountType {
    fn from(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Savings => Self::Savings,
            AccountType::Current => Self::Current,
            AccountType::FixedDeposit => Self::FixedDeposit,
        }
    }
}

impl From<db::TransactionKind> for TransactionKind {
    fn from(kind: db::TransactionKind) -> Self {
        match kind {
            db::TransactionKind::Credit => Self::Credit,
            db::TransactionKind::Debit => Self::Debit,
            db::TransactionKind::Transfer => Self::Transfer,
        }
    }
}

impl From<TransactionKind> for db::TransactionKind {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Credit => Self::Credit,
            TransactionKind::Debit => Self::Debit,
            TransactionKind::Transfer => Self::Transfer,
        }
    }
}

impl From<db::RecordStatus> for RecordStatus {
    fn from(status: db::RecordStatus) -> Self {
        match status {
            db::RecordStatus::Completed => Self::Completed,
            db::RecordStatus::Failed => Self::Failed,
        }
    }
}

impl From<RecordStatus> for db::RecordStatus {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Completed => Self::Completed,
            RecordStatus::Failed => Self::Failed,
        }
    }
}

impl From<db::ScheduleStatus> for ScheduleStatus {
    fn from(status: db::ScheduleStatus) -> Self {
        match status {
            db::ScheduleStatus::Pending => Self::Pending,
            db::ScheduleStatus::Executed => Self::Executed,
            db::ScheduleStatus::Failed => Self::Failed,
            db::ScheduleStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<ScheduleStatus> for db::ScheduleStatus {
    fn from(status: ScheduleStatus) -> Self {
        match status {
            ScheduleStatus::Pending => Self::Pending,
            ScheduleStatus::Executed => Self::Executed,
            ScheduleStatus::Failed => Self::Failed,
            ScheduleStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            number: AccountNumber(model.number),
            user_id: UserId(model.user_id),
            account_type: model.account_type.into(),
            balance: model.balance,
            status: model.status.into(),
            ifsc_code: model.ifsc_code,
            opened_at: model.opened_at.with_timezone(&Utc),
        }
    }
}

impl From<transaction_records::Model> for TransactionRecord {
    fn from(model: transaction_records::Model) -> Self {
        Self {
            id: TransactionRecordId(model.id),
            kind: model.kind.into(),
            from: model.from_account.map(AccountNumber),
            to: model.to_account.map(AccountNumber),
            amount: model.amount,
            timestamp: model.recorded_at.with_timezone(&Utc),
            status: model.status.into(),
            comment: model.comment,
            scheduled_transfer_id: model.scheduled_transfer_id.map(ScheduledTransferId),
        }
    }
}

impl From<scheduled_transfers::Model> for ScheduledTransfer {
    fn from(model: scheduled_transfers::Model) -> Self {
        Self {
            id: ScheduledTransferId(model.id),
            from: AccountNumber(model.from_account),
            to: AccountNumber(model.to_account),
            amount: model.amount,
            scheduled_at: model.scheduled_at.with_timezone(&Utc),
            created_at: model.created_at.with_timezone(&Utc),
            status: model.status.into(),
            processed_at: model.processed_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_model_maps_to_utc() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let at = ist.with_ymd_and_hms(2026, 10, 18, 14, 30, 0).unwrap();
        let record: TransactionRecord = transaction_records::Model {
            id: 1_000_000_007,
            kind: db::TransactionKind::Transfer,
            from_account: Some(1001),
            to_account: Some(1002),
            amount: dec!(300),
            recorded_at: at,
            status: db::RecordStatus::Completed,
            comment: "Transferred ₹300 to A/C 1002".to_string(),
            scheduled_transfer_id: None,
        }
        .into();

        assert!(record.id.is_valid());
        assert_eq!(record.timestamp, Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap());
        assert_eq!(record.kind, TransactionKind::Transfer);
        assert_eq!(record.from, Some(AccountNumber(1001)));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ScheduleStatus::Pending,
            ScheduleStatus::Executed,
            ScheduleStatus::Failed,
            ScheduleStatus::Cancelled,
        ] {
            assert_eq!(ScheduleStatus::from(db::ScheduleStatus::from(status)), status);
        }
    }
}
