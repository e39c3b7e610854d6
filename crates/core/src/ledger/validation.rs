//! Business rule validation for ledger operations.
//!
//! Each check is a pure function over already-loaded state. The service runs
//! them in one fixed order for every caller.

use rust_decimal::Decimal;

use coffer_shared::types::{AccountNumber, fits_money_column};

use super::error::LedgerError;
use super::types::Account;
use crate::policy::{self, Operation, PolicyDecision};

/// Rejects amounts that are not positive, carry sub-paisa precision or do not
/// fit a money column, then amounts above `limit`.
///
/// # Errors
///
/// Returns `InvalidAmount` or `LimitExceeded`.
pub fn validate_amount(amount: Decimal, limit: Option<Decimal>) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO || !fits_money_column(amount) {
        return Err(LedgerError::InvalidAmount(amount));
    }
    match limit {
        Some(limit) if amount > limit => Err(LedgerError::LimitExceeded { amount, limit }),
        _ => Ok(()),
    }
}

/// Rejects a transfer whose source and destination coincide.
///
/// # Errors
///
/// Returns `SameAccount`.
pub fn validate_distinct(from: AccountNumber, to: AccountNumber) -> Result<(), LedgerError> {
    if from == to {
        return Err(LedgerError::SameAccount);
    }
    Ok(())
}

/// Runs the status policy for `account` taking part in `operation`.
///
/// # Errors
///
/// Returns `AccountNotActive` or `AccountClosed`.
pub fn check_policy(account: &Account, operation: Operation) -> Result<(), LedgerError> {
    match policy::evaluate(account.status, operation) {
        PolicyDecision::Allow => Ok(()),
        PolicyDecision::Deny(reason) => Err(LedgerError::from_denial(account.number, reason)),
    }
}

/// Checks that `account` can cover `amount`.
///
/// # Errors
///
/// Returns `InsufficientFunds`.
pub fn check_funds(account: &Account, amount: Decimal) -> Result<(), LedgerError> {
    if account.balance < amount {
        return Err(LedgerError::InsufficientFunds {
            account: account.number,
            available: account.balance,
            requested: amount,
        });
    }
    Ok(())
}

/// Checks that crediting `amount` keeps `account` within a money column.
///
/// # Errors
///
/// Returns `BalanceOverflow`.
pub fn check_capacity(account: &Account, amount: Decimal) -> Result<(), LedgerError> {
    match account.balance.checked_add(amount) {
        Some(balance) if fits_money_column(balance) => Ok(()),
        _ => Err(LedgerError::BalanceOverflow(account.number)),
    }
}

/// Picks `number` out of a set of locked accounts.
///
/// # Errors
///
/// Returns `AccountNotFound` if the account was not among them.
pub fn find_locked(accounts: &[Account], number: AccountNumber) -> Result<&Account, LedgerError> {
    accounts
        .iter()
        .find(|a| a.number == number)
        .ok_or(LedgerError::AccountNotFound(number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AccountType;
    use crate::policy::AccountStatus;
    use chrono::Utc;
    use coffer_shared::types::UserId;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn account(status: AccountStatus, balance: Decimal) -> Account {
        Account {
            number: AccountNumber(1001),
            user_id: UserId(1),
            account_type: AccountType::Savings,
            balance,
            status,
            ifsc_code: "CFR0000001".to_string(),
            opened_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-0.01))]
    #[case(dec!(-500))]
    #[case(dec!(0.005))]
    #[case(dec!(1.001))]
    #[case(dec!(10000000000000000))]
    fn test_unstorable_amount_rejected(#[case] amount: Decimal) {
        assert!(matches!(
            validate_amount(amount, None),
            Err(LedgerError::InvalidAmount(a)) if a == amount
        ));
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert!(validate_amount(dec!(150000), Some(dec!(150000))).is_ok());
        assert!(matches!(
            validate_amount(dec!(150000.01), Some(dec!(150000))),
            Err(LedgerError::LimitExceeded { .. })
        ));
        assert!(validate_amount(dec!(9999999), None).is_ok());
        assert!(validate_amount(dec!(12.500), None).is_ok());
    }

    #[test]
    fn test_distinct() {
        assert!(validate_distinct(AccountNumber(1), AccountNumber(2)).is_ok());
        assert!(matches!(
            validate_distinct(AccountNumber(1), AccountNumber(1)),
            Err(LedgerError::SameAccount)
        ));
    }

    #[test]
    fn test_policy_maps_to_ledger_errors() {
        let suspended = account(AccountStatus::Suspended, dec!(10));
        assert!(matches!(
            check_policy(&suspended, Operation::TransferOut),
            Err(LedgerError::AccountNotActive { status: AccountStatus::Suspended, .. })
        ));
        assert!(check_policy(&suspended, Operation::TransferIn).is_ok());

        let closed = account(AccountStatus::Closed, dec!(10));
        assert!(matches!(
            check_policy(&closed, Operation::Credit),
            Err(LedgerError::AccountClosed(_))
        ));
    }

    #[test]
    fn test_funds_exact_balance_allowed() {
        let acc = account(AccountStatus::Active, dec!(100));
        assert!(check_funds(&acc, dec!(100)).is_ok());
        assert!(matches!(
            check_funds(&acc, dec!(100.01)),
            Err(LedgerError::InsufficientFunds { available, .. }) if available == dec!(100)
        ));
    }

    #[test]
    fn test_capacity_stops_at_column_maximum() {
        let acc = account(AccountStatus::Active, dec!(9999999999999999.00));
        assert!(check_capacity(&acc, dec!(0.99)).is_ok());
        assert!(matches!(
            check_capacity(&acc, dec!(1)),
            Err(LedgerError::BalanceOverflow(AccountNumber(1001)))
        ));
    }

    #[test]
    fn test_find_locked() {
        let accounts = vec![account(AccountStatus::Active, dec!(1))];
        assert!(find_locked(&accounts, AccountNumber(1001)).is_ok());
        assert!(matches!(
            find_locked(&accounts, AccountNumber(5)),
            Err(LedgerError::AccountNotFound(AccountNumber(5)))
        ));
    }
}
