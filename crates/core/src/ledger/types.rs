//! Ledger domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coffer_shared::config::LimitsConfig;
use coffer_shared::types::{AccountNumber, UserId};

use crate::policy::AccountStatus;
use crate::recorder::TransactionRecord;

/// Product type of a bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Savings account.
    Savings,
    /// Current (checking) account.
    Current,
    /// Fixed deposit account.
    FixedDeposit,
}

impl AccountType {
    /// Returns the string representation of the account type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "savings",
            Self::Current => "current",
            Self::FixedDeposit => "fixed_deposit",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bank account as the ledger sees it.
///
/// Created by the account-opening flow; only the ledger changes `balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account number.
    pub number: AccountNumber,
    /// Owning customer.
    pub user_id: UserId,
    /// Product type.
    pub account_type: AccountType,
    /// Current balance. Never negative.
    pub balance: Decimal,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Branch the account belongs to.
    pub ifsc_code: String,
    /// When the account was opened.
    pub opened_at: DateTime<Utc>,
}

/// A teller credit or debit against one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TellerRequest {
    /// Account to credit or debit.
    pub account: AccountNumber,
    /// Amount to move. Must be positive.
    pub amount: Decimal,
    /// Free-text comment stored on the audit record.
    pub comment: Option<String>,
}

impl TellerRequest {
    /// Creates a request without a comment.
    #[must_use]
    pub const fn new(account: AccountNumber, amount: Decimal) -> Self {
        Self {
            account,
            amount,
            comment: None,
        }
    }
}

/// A transfer between two accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Source account.
    pub from: AccountNumber,
    /// Destination account.
    pub to: AccountNumber,
    /// Amount to move. Must be positive.
    pub amount: Decimal,
    /// Optional customer note appended to the audit comment.
    pub note: Option<String>,
}

impl TransferRequest {
    /// Creates a request without a note.
    #[must_use]
    pub const fn new(from: AccountNumber, to: AccountNumber, amount: Decimal) -> Self {
        Self {
            from,
            to,
            amount,
            note: None,
        }
    }

    /// Attaches a customer note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Result of a successful credit or debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReceipt {
    /// Account that moved.
    pub account: AccountNumber,
    /// Balance after the movement.
    pub balance: Decimal,
    /// The Completed audit record.
    pub record: TransactionRecord,
}

/// Result of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Source balance after the transfer.
    pub from_balance: Decimal,
    /// Destination balance after the transfer.
    pub to_balance: Decimal,
    /// The Completed audit record.
    pub record: TransactionRecord,
}

/// Per-movement amount ceilings. `None` disables a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerLimits {
    /// Largest amount one customer or scheduled transfer may move.
    pub transfer: Option<Decimal>,
    /// Largest amount one teller credit or debit may move.
    pub teller: Option<Decimal>,
    /// Largest amount one staff-initiated transfer may move.
    pub teller_transfer: Option<Decimal>,
}

impl LedgerLimits {
    /// No ceilings at all.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            transfer: None,
            teller: None,
            teller_transfer: None,
        }
    }
}

impl From<&LimitsConfig> for LedgerLimits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            transfer: config.transfer,
            teller: config.teller,
            teller_transfer: config.teller_transfer,
        }
    }
}
