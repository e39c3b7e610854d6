//! Ledger error types.
//!
//! Every rejection the ledger can produce, grouped by the kind of failure it
//! represents so calling layers can treat them uniformly.

use rust_decimal::Decimal;
use thiserror::Error;

use coffer_shared::AppError;
use coffer_shared::types::AccountNumber;

use crate::policy::{AccountStatus, DenyReason};
use crate::store::StoreError;

/// Broad failure classes shared by every core error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad amount, same-account transfer, missing account or bad window.
    Validation,
    /// Account or entry is not in a state that permits the operation.
    State,
    /// Source balance does not cover the amount.
    InsufficientFunds,
    /// Credential verification failed.
    Authorization,
    /// Storage failed; nothing was committed.
    Persistence,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is not positive, has more than two decimal places, or is too
    /// large to store.
    #[error("Amount must be positive with at most two decimal places, got {0}")]
    InvalidAmount(Decimal),

    /// Amount is above the configured ceiling.
    #[error("Amount {amount} exceeds the limit of {limit}")]
    LimitExceeded {
        /// Requested amount.
        amount: Decimal,
        /// Configured ceiling.
        limit: Decimal,
    },

    /// Transfer source and destination are the same account.
    #[error("Cannot transfer to the same account")]
    SameAccount,

    /// Account does not exist.
    #[error("Account {0} not found")]
    AccountNotFound(AccountNumber),

    // ========== State Errors ==========
    /// Outgoing movement from an account that is not Active.
    #[error("Account {account} is {status}, not active")]
    AccountNotActive {
        /// The account.
        account: AccountNumber,
        /// Its current status.
        status: AccountStatus,
    },

    /// Incoming movement into a Closed account.
    #[error("Account {0} is closed")]
    AccountClosed(AccountNumber),

    /// Incoming movement would take the balance past what can be stored.
    #[error("Account {0} cannot hold a larger balance")]
    BalanceOverflow(AccountNumber),

    // ========== Funds ==========
    /// Source balance is below the requested amount.
    #[error("Insufficient funds in account {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The source account.
        account: AccountNumber,
        /// Its balance.
        available: Decimal,
        /// The requested amount.
        requested: Decimal,
    },

    // ========== Authorization ==========
    /// Transaction password did not verify.
    #[error("Transaction password verification failed for account {0}")]
    Unauthorized(AccountNumber),

    // ========== Persistence ==========
    /// Storage failure; no state changed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl LedgerError {
    /// Maps a policy denial for `account` onto a ledger error.
    #[must_use]
    pub const fn from_denial(account: AccountNumber, reason: DenyReason) -> Self {
        match reason {
            DenyReason::NotActive(status) => Self::AccountNotActive { account, status },
            DenyReason::Closed => Self::AccountClosed(account),
        }
    }

    /// Returns the failure class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_)
            | Self::LimitExceeded { .. }
            | Self::SameAccount
            | Self::AccountNotFound(_) => ErrorKind::Validation,
            Self::AccountNotActive { .. } | Self::AccountClosed(_) | Self::BalanceOverflow(_) => {
                ErrorKind::State
            }
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::SameAccount => "SAME_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountNotActive { .. } => "ACCOUNT_NOT_ACTIVE",
            Self::AccountClosed(_) => "ACCOUNT_CLOSED",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Returns true if the failure is a domain rejection that gets audited.
    ///
    /// Authorization failures never reach the ledger's audit path and
    /// persistence failures leave nothing to audit against.
    #[must_use]
    pub const fn is_recordable(&self) -> bool {
        !matches!(self, Self::Unauthorized(_) | Self::Persistence(_))
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let msg = err.to_string();
        match err.kind() {
            ErrorKind::Validation => match err {
                LedgerError::AccountNotFound(_) => Self::NotFound(msg),
                _ => Self::Validation(msg),
            },
            ErrorKind::State => Self::State(msg),
            ErrorKind::InsufficientFunds => Self::InsufficientFunds(msg),
            ErrorKind::Authorization => Self::Unauthorized(msg),
            ErrorKind::Persistence => Self::Persistence(msg),
        }
    }
}
