//! Account status policy.
//!
//! Pure decision function: may an account in a given status take part in a
//! given kind of movement. Debits and outgoing transfers need an Active
//! account; credits and incoming transfers are refused only for Closed
//! accounts, so Suspended accounts can still receive funds.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account is open for all movements.
    Active,
    /// Account is frozen for outgoing movements.
    Suspended,
    /// Account is closed. Accounts are never deleted, only closed.
    Closed,
}

impl AccountStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Closed => "closed",
        }
    }

    /// Parses a status, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role an account plays in a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Funds deposited into the account.
    Credit,
    /// Funds withdrawn from the account.
    Debit,
    /// Account is the source of a transfer.
    TransferOut,
    /// Account is the destination of a transfer.
    TransferIn,
}

impl Operation {
    /// Returns true if the operation removes funds from the account.
    #[must_use]
    pub const fn is_outgoing(self) -> bool {
        matches!(self, Self::Debit | Self::TransferOut)
    }
}

/// Why the policy refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Outgoing movement from an account that is not Active.
    NotActive(AccountStatus),
    /// Incoming movement into a Closed account.
    Closed,
}

impl DenyReason {
    /// Stable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotActive(_) => "ACCOUNT_NOT_ACTIVE",
            Self::Closed => "ACCOUNT_CLOSED",
        }
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The operation may proceed.
    Allow,
    /// The operation must be rejected.
    Deny(DenyReason),
}

impl PolicyDecision {
    /// Returns true if the operation may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether an account in `status` may take part in `operation`.
#[must_use]
pub const fn evaluate(status: AccountStatus, operation: Operation) -> PolicyDecision {
    if operation.is_outgoing() {
        match status {
            AccountStatus::Active => PolicyDecision::Allow,
            other => PolicyDecision::Deny(DenyReason::NotActive(other)),
        }
    } else {
        match status {
            AccountStatus::Closed => PolicyDecision::Deny(DenyReason::Closed),
            AccountStatus::Active | AccountStatus::Suspended => PolicyDecision::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccountStatus::Active, Operation::Debit, true)]
    #[case(AccountStatus::Active, Operation::TransferOut, true)]
    #[case(AccountStatus::Active, Operation::Credit, true)]
    #[case(AccountStatus::Active, Operation::TransferIn, true)]
    #[case(AccountStatus::Suspended, Operation::Debit, false)]
    #[case(AccountStatus::Suspended, Operation::TransferOut, false)]
    #[case(AccountStatus::Suspended, Operation::Credit, true)]
    #[case(AccountStatus::Suspended, Operation::TransferIn, true)]
    #[case(AccountStatus::Closed, Operation::Debit, false)]
    #[case(AccountStatus::Closed, Operation::TransferOut, false)]
    #[case(AccountStatus::Closed, Operation::Credit, false)]
    #[case(AccountStatus::Closed, Operation::TransferIn, false)]
    fn test_policy_matrix(
        #[case] status: AccountStatus,
        #[case] operation: Operation,
        #[case] allowed: bool,
    ) {
        assert_eq!(evaluate(status, operation).is_allowed(), allowed);
    }

    #[test]
    fn test_deny_reasons() {
        assert_eq!(
            evaluate(AccountStatus::Suspended, Operation::Debit),
            PolicyDecision::Deny(DenyReason::NotActive(AccountStatus::Suspended))
        );
        assert_eq!(
            evaluate(AccountStatus::Closed, Operation::TransferIn),
            PolicyDecision::Deny(DenyReason::Closed)
        );
        assert_eq!(DenyReason::Closed.code(), "ACCOUNT_CLOSED");
        assert_eq!(
            DenyReason::NotActive(AccountStatus::Closed).code(),
            "ACCOUNT_NOT_ACTIVE"
        );
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [
            AccountStatus::Active,
            AccountStatus::Suspended,
            AccountStatus::Closed,
        ] {
            assert_eq!(AccountStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AccountStatus::parse(" ACTIVE "), Some(AccountStatus::Active));
        assert_eq!(AccountStatus::parse("frozen"), None);
    }
}
