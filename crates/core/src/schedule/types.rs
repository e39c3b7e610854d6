//! Scheduled transfer domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coffer_shared::types::{AccountNumber, ScheduledTransferId};

/// Lifecycle status of a scheduled transfer.
///
/// Pending is the only non-terminal state. The executor moves entries to
/// Executed or Failed; an explicit cancel moves them to Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    /// Waiting for its scheduled time.
    Pending,
    /// The transfer went through.
    Executed,
    /// The transfer was rejected. Never retried.
    Failed,
    /// Withdrawn by the customer before its scheduled time.
    Cancelled,
}

impl ScheduleStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Executed => "executed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "executed" => Some(Self::Executed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if moving from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Executed | Self::Failed | Self::Cancelled)
        )
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transfer deferred to a future instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTransfer {
    /// Store-assigned identifier.
    pub id: ScheduledTransferId,
    /// Source account.
    pub from: AccountNumber,
    /// Destination account.
    pub to: AccountNumber,
    /// Amount to move.
    pub amount: Decimal,
    /// When the transfer becomes due.
    pub scheduled_at: DateTime<Utc>,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: ScheduleStatus,
    /// When the entry left Pending.
    pub processed_at: Option<DateTime<Utc>>,
}

impl ScheduledTransfer {
    /// Returns true if the entry is Pending and its time has come.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ScheduleStatus::Pending && self.scheduled_at <= now
    }

    /// Returns true if the account is the source or destination.
    #[must_use]
    pub fn involves(&self, account: AccountNumber) -> bool {
        self.from == account || self.to == account
    }
}

/// A customer request to schedule a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Source account.
    pub from: AccountNumber,
    /// Destination account.
    pub to: AccountNumber,
    /// Amount to move.
    pub amount: Decimal,
    /// When the transfer should run.
    pub scheduled_at: DateTime<Utc>,
}

/// A validated entry ready for the store, missing only its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduledTransfer {
    /// Source account.
    pub from: AccountNumber,
    /// Destination account.
    pub to: AccountNumber,
    /// Amount to move.
    pub amount: Decimal,
    /// When the transfer becomes due.
    pub scheduled_at: DateTime<Utc>,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl NewScheduledTransfer {
    /// Builds the stored Pending entry once the store has picked an identifier.
    #[must_use]
    pub const fn with_id(self, id: ScheduledTransferId) -> ScheduledTransfer {
        ScheduledTransfer {
            id,
            from: self.from,
            to: self.to,
            amount: self.amount,
            scheduled_at: self.scheduled_at,
            created_at: self.created_at,
            status: ScheduleStatus::Pending,
            processed_at: None,
        }
    }
}

/// What one executor tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Entries that reached Executed.
    pub executed: usize,
    /// Entries that reached Failed.
    pub failed: usize,
    /// Entries left Pending because storage failed; retried next tick.
    pub deferred: usize,
    /// Entries already claimed or processed elsewhere.
    pub skipped: usize,
}

impl TickReport {
    /// Number of due entries the tick looked at.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.executed + self.failed + self.deferred + self.skipped
    }
}
