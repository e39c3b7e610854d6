//! Audit record types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coffer_shared::types::{AccountNumber, ScheduledTransferId, TransactionRecordId};

/// Kind of money movement an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Deposit into one account.
    Credit,
    /// Withdrawal from one account.
    Debit,
    /// Movement between two accounts.
    Transfer,
}

impl TransactionKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the attempted movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Balances were changed.
    Completed,
    /// The movement was rejected; no balance changed.
    Failed,
}

impl RecordStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Store-assigned identifier.
    pub id: TransactionRecordId,
    /// Kind of movement.
    pub kind: TransactionKind,
    /// Source account; `None` for a pure credit.
    pub from: Option<AccountNumber>,
    /// Destination account; `None` for a pure debit.
    pub to: Option<AccountNumber>,
    /// Requested amount. Positive for every Completed record.
    pub amount: Decimal,
    /// When the attempt was recorded.
    pub timestamp: DateTime<Utc>,
    /// Outcome.
    pub status: RecordStatus,
    /// Free-text reason or note.
    pub comment: String,
    /// Set when the movement was a scheduled transfer execution.
    pub scheduled_transfer_id: Option<ScheduledTransferId>,
}

impl TransactionRecord {
    /// Returns true if the record was produced by the scheduled transfer executor.
    #[must_use]
    pub const fn is_scheduled(&self) -> bool {
        self.scheduled_transfer_id.is_some()
    }

    /// Returns true if the account is the source or destination.
    #[must_use]
    pub fn involves(&self, account: AccountNumber) -> bool {
        self.from == Some(account) || self.to == Some(account)
    }
}

/// What a caller asks the recorder to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// Kind of movement.
    pub kind: TransactionKind,
    /// Source account.
    pub from: Option<AccountNumber>,
    /// Destination account.
    pub to: Option<AccountNumber>,
    /// Requested amount.
    pub amount: Decimal,
    /// Outcome.
    pub status: RecordStatus,
    /// Free-text reason or note.
    pub comment: String,
    /// Scheduled transfer that produced this movement, if any.
    pub scheduled_transfer_id: Option<ScheduledTransferId>,
}

impl RecordEntry {
    /// Attaches the server-assigned timestamp.
    #[must_use]
    pub fn stamped(self, timestamp: DateTime<Utc>) -> NewTransactionRecord {
        NewTransactionRecord {
            kind: self.kind,
            from: self.from,
            to: self.to,
            amount: self.amount,
            timestamp,
            status: self.status,
            comment: self.comment,
            scheduled_transfer_id: self.scheduled_transfer_id,
        }
    }
}

/// A record ready for the store, missing only its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransactionRecord {
    /// Kind of movement.
    pub kind: TransactionKind,
    /// Source account.
    pub from: Option<AccountNumber>,
    /// Destination account.
    pub to: Option<AccountNumber>,
    /// Requested amount.
    pub amount: Decimal,
    /// When the attempt was recorded.
    pub timestamp: DateTime<Utc>,
    /// Outcome.
    pub status: RecordStatus,
    /// Free-text reason or note.
    pub comment: String,
    /// Scheduled transfer that produced this movement, if any.
    pub scheduled_transfer_id: Option<ScheduledTransferId>,
}

impl NewTransactionRecord {
    /// Builds the stored record once the store has picked an identifier.
    #[must_use]
    pub fn with_id(self, id: TransactionRecordId) -> TransactionRecord {
        TransactionRecord {
            id,
            kind: self.kind,
            from: self.from,
            to: self.to,
            amount: self.amount,
            timestamp: self.timestamp,
            status: self.status,
            comment: self.comment,
            scheduled_transfer_id: self.scheduled_transfer_id,
        }
    }
}

/// Statement range for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementQuery {
    /// Account whose records are listed.
    pub account: AccountNumber,
    /// Inclusive lower bound on the record timestamp.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the record timestamp.
    pub until: Option<DateTime<Utc>>,
    /// Maximum number of records returned.
    pub limit: Option<u64>,
}

impl StatementQuery {
    /// Every record of an account.
    #[must_use]
    pub const fn all(account: AccountNumber) -> Self {
        Self {
            account,
            from: None,
            until: None,
            limit: None,
        }
    }

    /// Records of an account between two instants, inclusive.
    #[must_use]
    pub const fn between(account: AccountNumber, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            account,
            from: Some(from),
            until: Some(until),
            limit: None,
        }
    }

    /// Caps the number of records returned.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the record falls inside the query range.
    #[must_use]
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        record.involves(self.account)
            && self.from.is_none_or(|from| record.timestamp >= from)
            && self.until.is_none_or(|until| record.timestamp <= until)
    }
}
