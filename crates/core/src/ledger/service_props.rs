//! Property-based tests for AccountLedger.
//!
//! - Property 1: Transfer conservation (sum of both balances never changes)
//! - Property 2: Atomicity under an induced failure after the first write
//! - Property 3: Non-positive or sub-paisa amounts never move money and leave one Failed record

use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use coffer_shared::types::{AccountNumber, MONEY_SCALE, UserId};

use super::error::LedgerError;
use super::service::AccountLedger;
use super::types::{Account, AccountType, LedgerLimits, TellerRequest, TransferRequest};
use crate::clock::SystemClock;
use crate::policy::AccountStatus;
use crate::recorder::{RecordStatus, StatementQuery};
use crate::store::{LedgerStore, MemoryStore};

const A: AccountNumber = AccountNumber(1001);
const B: AccountNumber = AccountNumber(1002);

/// Strategy for balances between 0.00 and 100,000.00.
fn balance() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for positive amounts up to 200,000 with zero to four decimal places.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (0u32..=4).prop_flat_map(|scale| {
        let max = 200_000i64 * 10i64.pow(scale);
        (1i64..=max).prop_map(move |units| Decimal::new(units, scale))
    })
}

/// Strategy for whole-paisa amounts between 0.01 and 100,000.00.
fn paisa_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for amounts that must be rejected: zero, negative, or finer than a paisa.
fn unstorable_amount() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (-10_000_000i64..=0i64).prop_map(|cents| Decimal::new(cents, 2)),
        (1i64..10_000_000i64)
            .prop_filter("needs a third decimal place", |mills| mills % 10 != 0)
            .prop_map(|mills| Decimal::new(mills, 3)),
    ]
}

fn is_paisa_precise(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn setup(a: Decimal, b: Decimal) -> (Arc<MemoryStore>, AccountLedger<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    for (number, balance) in [(A, a), (B, b)] {
        store
            .insert_account(Account {
                number,
                user_id: UserId(number.get()),
                account_type: AccountType::Current,
                balance,
                status: AccountStatus::Active,
                ifsc_code: "CFR0000001".to_string(),
                opened_at: Utc::now(),
            })
            .await;
    }
    let ledger = AccountLedger::new(
        Arc::clone(&store),
        Arc::new(SystemClock),
        LedgerLimits::unlimited(),
    );
    (store, ledger)
}

async fn balances(store: &MemoryStore) -> (Decimal, Decimal) {
    let a = store.find_account(A).await.unwrap().unwrap().balance;
    let b = store.find_account(B).await.unwrap().unwrap().balance;
    (a, b)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: a covered transfer moves exactly `amount`; a rejected one moves nothing.
    #[test]
    fn prop_transfer_conserves_total(a in balance(), b in balance(), amount in positive_amount()) {
        runtime().block_on(async {
            let (store, ledger) = setup(a, b).await;
            let result = ledger.transfer(TransferRequest::new(A, B, amount)).await;
            let (after_a, after_b) = balances(&store).await;

            prop_assert_eq!(after_a + after_b, a + b);
            prop_assert!(is_paisa_precise(after_a) && is_paisa_precise(after_b));
            if !is_paisa_precise(amount) {
                prop_assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
                prop_assert_eq!((after_a, after_b), (a, b));
            } else if amount <= a {
                prop_assert!(result.is_ok());
                prop_assert_eq!(after_a, a - amount);
                prop_assert_eq!(after_b, b + amount);
            } else {
                let insufficient = matches!(result, Err(LedgerError::InsufficientFunds { .. }));
                prop_assert!(insufficient);
                prop_assert_eq!((after_a, after_b), (a, b));
            }
            Ok(())
        })?;
    }

    /// Property 2: failing either balance write leaves both balances and the audit trail untouched.
    #[test]
    fn prop_transfer_atomic_under_write_failure(
        a in balance(),
        b in balance(),
        amount in paisa_amount(),
        failing_write in 1u64..=2,
    ) {
        prop_assume!(amount <= a);
        runtime().block_on(async {
            let (store, ledger) = setup(a, b).await;
            store.fail_balance_write(failing_write);

            let result = ledger.transfer(TransferRequest::new(A, B, amount)).await;
            prop_assert!(matches!(result, Err(LedgerError::Persistence(_))));
            prop_assert_eq!(balances(&store).await, (a, b));

            let history = store.list_records(&StatementQuery::all(A)).await.unwrap();
            prop_assert!(history.is_empty());
            Ok(())
        })?;
    }

    /// Property 3: unstorable amounts are rejected by every movement.
    #[test]
    fn prop_unstorable_amount_rejected(a in balance(), b in balance(), amount in unstorable_amount()) {
        runtime().block_on(async {
            let (store, ledger) = setup(a, b).await;

            let credit = ledger.credit(TellerRequest::new(A, amount)).await;
            let debit = ledger.debit(TellerRequest::new(A, amount)).await;
            let transfer = ledger.transfer(TransferRequest::new(A, B, amount)).await;

            prop_assert!(matches!(credit, Err(LedgerError::InvalidAmount(_))));
            prop_assert!(matches!(debit, Err(LedgerError::InvalidAmount(_))));
            prop_assert!(matches!(transfer, Err(LedgerError::InvalidAmount(_))));
            prop_assert_eq!(balances(&store).await, (a, b));

            let history = store.list_records(&StatementQuery::all(A)).await.unwrap();
            prop_assert_eq!(history.len(), 3);
            prop_assert!(history.iter().all(|r| r.status == RecordStatus::Failed));
            Ok(())
        })?;
    }
}
