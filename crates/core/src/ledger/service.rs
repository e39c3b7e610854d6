//! Account ledger service.
//!
//! The only code path that changes balances. Every operation runs inside one
//! unit of work: the account locks, the balance writes and the audit record
//! commit together or not at all.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use coffer_shared::types::{AccountNumber, ScheduledTransferId};

use super::error::LedgerError;
use super::types::{BalanceReceipt, LedgerLimits, TellerRequest, TransferReceipt, TransferRequest};
use super::validation::{
    check_capacity, check_funds, check_policy, find_locked, validate_amount, validate_distinct,
};
use crate::clock::Clock;
use crate::credentials::CredentialVerifier;
use crate::policy::Operation;
use crate::recorder::{
    RecordEntry, RecordStatus, TransactionKind, TransactionRecord, TransactionRecorder,
    transfer_comment,
};
use crate::store::{LedgerStore, StoreError, UnitOfWork};

/// Outcome of a ledger step inside an open unit of work.
///
/// The outer error is a storage failure and means the unit must be discarded.
/// The inner error is a domain rejection that has already been audited in the
/// unit, which should still be committed.
pub(crate) type Settled<T> = Result<Result<T, LedgerError>, StoreError>;

/// Applies credits, debits and transfers to account balances.
pub struct AccountLedger<S: LedgerStore> {
    store: Arc<S>,
    recorder: TransactionRecorder<S>,
    limits: LedgerLimits,
}

impl<S: LedgerStore> Clone for AccountLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            recorder: self.recorder.clone(),
            limits: self.limits,
        }
    }
}

impl<S: LedgerStore> AccountLedger<S> {
    /// Create a new ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, limits: LedgerLimits) -> Self {
        let recorder = TransactionRecorder::new(Arc::clone(&store), clock);
        Self {
            store,
            recorder,
            limits,
        }
    }

    /// The ceilings this ledger enforces.
    #[must_use]
    pub const fn limits(&self) -> LedgerLimits {
        self.limits
    }

    /// The recorder this ledger audits through.
    #[must_use]
    pub const fn recorder(&self) -> &TransactionRecorder<S> {
        &self.recorder
    }

    /// Deposits into one account.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Amount is not positive or exceeds the teller limit
    /// - Account does not exist or is Closed
    /// - Storage fails (nothing is committed)
    pub async fn credit(&self, request: TellerRequest) -> Result<BalanceReceipt, LedgerError> {
        self.teller(request, Operation::Credit).await
    }

    /// Withdraws from one account.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Amount is not positive or exceeds the teller limit
    /// - Account does not exist or is not Active
    /// - Balance is below the amount
    /// - Storage fails (nothing is committed)
    pub async fn debit(&self, request: TellerRequest) -> Result<BalanceReceipt, LedgerError> {
        self.teller(request, Operation::Debit).await
    }

    /// Moves money between two accounts.
    ///
    /// Validation order: amount, distinct accounts, both accounts exist,
    /// source may send, destination may receive, source balance covers the
    /// amount, destination can hold the result. Rejections are audited as
    /// Failed records.
    ///
    /// # Errors
    ///
    /// Returns the first failing check, or `Persistence` if storage fails.
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, LedgerError> {
        let comment = transfer_comment(request.amount, request.to, request.note.as_deref());
        self.execute_transfer(request, self.limits.transfer, comment)
            .await
    }

    /// Moves money between two accounts on behalf of branch staff.
    ///
    /// Same checks as [`AccountLedger::transfer`] but bounded by the teller
    /// transfer limit, with the staff note recorded verbatim.
    ///
    /// # Errors
    ///
    /// Returns the first failing check, or `Persistence` if storage fails.
    pub async fn teller_transfer(
        &self,
        request: TransferRequest,
    ) -> Result<TransferReceipt, LedgerError> {
        let comment = request.note.clone().unwrap_or_default();
        self.execute_transfer(request, self.limits.teller_transfer, comment)
            .await
    }

    async fn execute_transfer(
        &self,
        request: TransferRequest,
        limit: Option<Decimal>,
        comment: String,
    ) -> Result<TransferReceipt, LedgerError> {
        let mut unit = self.store.begin().await?;

        match self
            .settle_transfer(&mut unit, &request, limit, comment, None)
            .await
        {
            Ok(outcome) => {
                unit.commit().await?;
                match &outcome {
                    Ok(receipt) => info!(
                        from = %request.from,
                        to = %request.to,
                        amount = %request.amount,
                        record_id = %receipt.record.id,
                        "transfer completed"
                    ),
                    Err(e) => warn!(
                        from = %request.from,
                        to = %request.to,
                        amount = %request.amount,
                        code = e.error_code(),
                        "transfer rejected: {e}"
                    ),
                }
                outcome
            }
            Err(e) => {
                error!(from = %request.from, to = %request.to, "transfer failed: {e}");
                discard(unit).await;
                Err(e.into())
            }
        }
    }

    /// Verifies the transaction password for the source account, then
    /// transfers.
    ///
    /// A failed verification reads no balance and writes no audit record.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` on a credential mismatch, otherwise as
    /// [`AccountLedger::transfer`].
    pub async fn transfer_authorized<V: CredentialVerifier>(
        &self,
        verifier: &V,
        password: &str,
        request: TransferRequest,
    ) -> Result<TransferReceipt, LedgerError> {
        authorize(verifier, request.from, password).await?;
        self.transfer(request).await
    }

    /// Runs a transfer inside a caller-owned unit and audits the outcome in
    /// the same unit.
    pub(crate) async fn settle_transfer(
        &self,
        unit: &mut S::Unit,
        request: &TransferRequest,
        limit: Option<Decimal>,
        comment: String,
        scheduled_transfer_id: Option<ScheduledTransferId>,
    ) -> Settled<TransferReceipt> {
        let outcome = split(Self::apply_transfer(unit, request, limit).await)?;
        let entry = RecordEntry {
            kind: TransactionKind::Transfer,
            from: Some(request.from),
            to: Some(request.to),
            amount: request.amount,
            status: status_of(&outcome),
            comment: reason_or(&outcome, comment),
            scheduled_transfer_id,
        };
        let record = self.recorder.record(unit, entry).await?;

        Ok(outcome.map(|(from_balance, to_balance)| TransferReceipt {
            from_balance,
            to_balance,
            record,
        }))
    }

    async fn apply_transfer(
        unit: &mut S::Unit,
        request: &TransferRequest,
        limit: Option<Decimal>,
    ) -> Result<(Decimal, Decimal), LedgerError> {
        validate_amount(request.amount, limit)?;
        validate_distinct(request.from, request.to)?;

        let accounts = unit.lock_accounts(&[request.from, request.to]).await?;
        let from = find_locked(&accounts, request.from)?;
        let to = find_locked(&accounts, request.to)?;
        check_policy(from, Operation::TransferOut)?;
        check_policy(to, Operation::TransferIn)?;
        check_funds(from, request.amount)?;
        check_capacity(to, request.amount)?;

        let from_balance = from.balance - request.amount;
        let to_balance = to.balance + request.amount;
        unit.update_balance(request.from, from_balance).await?;
        unit.update_balance(request.to, to_balance).await?;
        Ok((from_balance, to_balance))
    }

    async fn teller(
        &self,
        request: TellerRequest,
        operation: Operation,
    ) -> Result<BalanceReceipt, LedgerError> {
        let mut unit = self.store.begin().await?;

        match self.settle_teller(&mut unit, &request, operation).await {
            Ok(outcome) => {
                unit.commit().await?;
                match &outcome {
                    Ok(receipt) => info!(
                        account = %request.account,
                        amount = %request.amount,
                        operation = ?operation,
                        balance = %receipt.balance,
                        "teller movement completed"
                    ),
                    Err(e) => warn!(
                        account = %request.account,
                        amount = %request.amount,
                        operation = ?operation,
                        code = e.error_code(),
                        "teller movement rejected: {e}"
                    ),
                }
                outcome
            }
            Err(e) => {
                error!(account = %request.account, operation = ?operation, "teller movement failed: {e}");
                discard(unit).await;
                Err(e.into())
            }
        }
    }

    async fn settle_teller(
        &self,
        unit: &mut S::Unit,
        request: &TellerRequest,
        operation: Operation,
    ) -> Settled<BalanceReceipt> {
        let outcome = split(self.apply_teller(unit, request, operation).await)?;
        let (kind, from, to) = match operation {
            Operation::Debit => (TransactionKind::Debit, Some(request.account), None),
            _ => (TransactionKind::Credit, None, Some(request.account)),
        };
        let entry = RecordEntry {
            kind,
            from,
            to,
            amount: request.amount,
            status: status_of(&outcome),
            comment: reason_or(&outcome, request.comment.clone().unwrap_or_default()),
            scheduled_transfer_id: None,
        };
        let record: TransactionRecord = self.recorder.record(unit, entry).await?;

        Ok(outcome.map(|balance| BalanceReceipt {
            account: request.account,
            balance,
            record,
        }))
    }

    async fn apply_teller(
        &self,
        unit: &mut S::Unit,
        request: &TellerRequest,
        operation: Operation,
    ) -> Result<Decimal, LedgerError> {
        validate_amount(request.amount, self.limits.teller)?;

        let accounts = unit.lock_accounts(&[request.account]).await?;
        let account = find_locked(&accounts, request.account)?;
        check_policy(account, operation)?;

        let balance = if operation.is_outgoing() {
            check_funds(account, request.amount)?;
            account.balance - request.amount
        } else {
            check_capacity(account, request.amount)?;
            account.balance + request.amount
        };
        unit.update_balance(request.account, balance).await?;
        Ok(balance)
    }
}

/// Consults the verifier for `account`.
async fn authorize<V: CredentialVerifier>(
    verifier: &V,
    account: AccountNumber,
    password: &str,
) -> Result<(), LedgerError> {
    if verifier.verify(account, password).await? {
        Ok(())
    } else {
        warn!(account = %account, "transaction password rejected");
        Err(LedgerError::Unauthorized(account))
    }
}

/// Separates storage failures from domain rejections.
fn split<T>(result: Result<T, LedgerError>) -> Settled<T> {
    match result {
        Err(LedgerError::Persistence(e)) => Err(e),
        other => Ok(other),
    }
}

const fn status_of<T>(outcome: &Result<T, LedgerError>) -> RecordStatus {
    match outcome {
        Ok(_) => RecordStatus::Completed,
        Err(_) => RecordStatus::Failed,
    }
}

fn reason_or<T>(outcome: &Result<T, LedgerError>, comment: String) -> String {
    match outcome {
        Ok(_) => comment,
        Err(e) => e.to_string(),
    }
}

/// Rolls a unit back, logging rather than surfacing a rollback failure.
pub(crate) async fn discard<U: UnitOfWork>(unit: U) {
    if let Err(e) = unit.rollback().await {
        error!("rollback failed: {e}");
    }
}
