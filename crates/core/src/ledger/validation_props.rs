//! Property-based tests for ledger validation.
//!
//! - Non-positive amounts are always rejected, whatever the limit
//! - Positive amounts within the limit are always accepted
//! - Funds check accepts exactly the amounts the balance covers

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use coffer_shared::types::{AccountNumber, UserId};

use super::error::LedgerError;
use super::types::{Account, AccountType};
use super::validation::{check_funds, validate_amount};
use crate::policy::AccountStatus;

/// Strategy for amounts in cents between -10,000.00 and 10,000.00.
fn any_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..=1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for an optional limit between 0.01 and 20,000.00.
fn any_limit() -> impl Strategy<Value = Option<Decimal>> {
    proptest::option::of((1i64..2_000_000i64).prop_map(|cents| Decimal::new(cents, 2)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_amount_check_matches_definition(amount in any_amount(), limit in any_limit()) {
        let result = validate_amount(amount, limit);
        if amount <= Decimal::ZERO {
            prop_assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
        } else if limit.is_some_and(|l| amount > l) {
            prop_assert!(matches!(result, Err(LedgerError::LimitExceeded { .. })), "expected LimitExceeded");
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn prop_funds_check_matches_balance(
        balance_cents in 0i64..1_000_000i64,
        amount_cents in 1i64..1_000_000i64,
    ) {
        let account = Account {
            number: AccountNumber(1),
            user_id: UserId(1),
            account_type: AccountType::Current,
            balance: Decimal::new(balance_cents, 2),
            status: AccountStatus::Active,
            ifsc_code: "CFR0000001".to_string(),
            opened_at: Utc::now(),
        };
        let ok = check_funds(&account, Decimal::new(amount_cents, 2)).is_ok();
        prop_assert_eq!(ok, amount_cents <= balance_cents);
    }
}
