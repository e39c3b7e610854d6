//! Scheduled transfer registry errors.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use coffer_shared::AppError;
use coffer_shared::types::{AccountNumber, ScheduledTransferId};

use super::types::ScheduleStatus;
use crate::ledger::ErrorKind;
use crate::store::StoreError;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Scheduled time lies outside `[now, now + window]`.
    #[error("Scheduled time {scheduled_at} must be between {earliest} and {latest}")]
    InvalidWindow {
        /// Requested time.
        scheduled_at: DateTime<Utc>,
        /// Earliest accepted time.
        earliest: DateTime<Utc>,
        /// Latest accepted time.
        latest: DateTime<Utc>,
    },

    /// Amount is not positive, has more than two decimal places, or is too
    /// large to store.
    #[error("Amount must be positive with at most two decimal places, got {0}")]
    InvalidAmount(Decimal),

    /// Amount is above the transfer limit the executor will apply.
    #[error("Amount {amount} exceeds the transfer limit of {limit}")]
    LimitExceeded {
        /// Requested amount.
        amount: Decimal,
        /// Configured ceiling.
        limit: Decimal,
    },

    /// Source and destination are the same account.
    #[error("Cannot schedule a transfer to the same account")]
    SameAccount,

    /// Account does not exist.
    #[error("Account {0} not found")]
    AccountNotFound(AccountNumber),

    /// Scheduled transfer does not exist.
    #[error("Scheduled transfer {0} not found")]
    NotFound(ScheduledTransferId),

    /// Entry already left Pending.
    #[error("Scheduled transfer {id} is already {status}")]
    AlreadyProcessed {
        /// The entry.
        id: ScheduledTransferId,
        /// Its terminal status.
        status: ScheduleStatus,
    },

    /// The entry's scheduled time has been reached.
    #[error("Scheduled transfer {0} can no longer be cancelled")]
    WindowPassed(ScheduledTransferId),

    /// Transaction password did not verify.
    #[error("Transaction password verification failed for account {0}")]
    Unauthorized(AccountNumber),

    /// Storage failure; nothing changed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl ScheduleError {
    /// Returns the failure class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidWindow { .. }
            | Self::InvalidAmount(_)
            | Self::LimitExceeded { .. }
            | Self::SameAccount
            | Self::AccountNotFound(_)
            | Self::NotFound(_) => ErrorKind::Validation,
            Self::AlreadyProcessed { .. } | Self::WindowPassed(_) => ErrorKind::State,
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidWindow { .. } => "INVALID_WINDOW",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::SameAccount => "SAME_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::NotFound(_) => "SCHEDULED_TRANSFER_NOT_FOUND",
            Self::AlreadyProcessed { .. } => "ALREADY_PROCESSED",
            Self::WindowPassed(_) => "WINDOW_PASSED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        let msg = err.to_string();
        match err {
            ScheduleError::NotFound(_) | ScheduleError::AccountNotFound(_) => Self::NotFound(msg),
            ScheduleError::InvalidWindow { .. }
            | ScheduleError::InvalidAmount(_)
            | ScheduleError::LimitExceeded { .. }
            | ScheduleError::SameAccount => Self::Validation(msg),
            ScheduleError::AlreadyProcessed { .. } | ScheduleError::WindowPassed(_) => {
                Self::State(msg)
            }
            ScheduleError::Unauthorized(_) => Self::Unauthorized(msg),
            ScheduleError::Persistence(_) => Self::Persistence(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_kinds() {
        let err = ScheduleError::AlreadyProcessed {
            id: ScheduledTransferId(4),
            status: ScheduleStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Scheduled transfer 4 is already cancelled");
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(err.error_code(), "ALREADY_PROCESSED");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = ScheduleError::NotFound(ScheduledTransferId(1)).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = ScheduleError::WindowPassed(ScheduledTransferId(1)).into();
        assert_eq!(app.error_code(), "STATE_ERROR");

        let app: AppError = ScheduleError::Unauthorized(AccountNumber(1)).into();
        assert_eq!(app.status_code(), 401);
    }
}
