//! Scheduled transfer registry.
//!
//! Stores deferred transfer requests and owns every lifecycle change except
//! the executor's Pending → Executed/Failed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use coffer_shared::types::{AccountNumber, ScheduledTransferId, fits_money_column};

use super::error::ScheduleError;
use super::types::{NewScheduledTransfer, ScheduleRequest, ScheduleStatus, ScheduledTransfer};
use crate::clock::Clock;
use crate::credentials::CredentialVerifier;
use crate::ledger::service::discard;
use crate::store::{LedgerStore, UnitOfWork};

/// How far ahead a transfer may be scheduled unless configured otherwise.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Creates, looks up and cancels scheduled transfers.
pub struct ScheduledTransferRegistry<S: LedgerStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    window: Duration,
    limit: Option<Decimal>,
}

impl<S: LedgerStore> Clone for ScheduledTransferRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            window: self.window,
            limit: self.limit,
        }
    }
}

impl<S: LedgerStore> ScheduledTransferRegistry<S> {
    /// Create a registry accepting times up to `window` ahead of now.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            store,
            clock,
            window,
            limit: None,
        }
    }

    /// Rejects entries above `limit` at creation. Pass the ledger's transfer
    /// limit so nothing is accepted that the executor would refuse.
    #[must_use]
    pub const fn with_transfer_limit(mut self, limit: Option<Decimal>) -> Self {
        self.limit = limit;
        self
    }

    /// Create a registry with the default 24 hour window.
    #[must_use]
    pub fn with_default_window(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self::new(store, clock, Duration::hours(DEFAULT_WINDOW_HOURS))
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Schedules a transfer.
    ///
    /// Checks run in order: window (`now <= scheduled_at <= now + window`),
    /// amount, transfer limit, distinct accounts, both accounts exist.
    ///
    /// # Errors
    ///
    /// Returns the first failing check, or `Persistence` if storage fails.
    pub async fn create(
        &self,
        request: ScheduleRequest,
    ) -> Result<ScheduledTransfer, ScheduleError> {
        let now = self.clock.now();
        validate_window(request.scheduled_at, now, self.window)?;
        validate_amount(request.amount, self.limit)?;
        if request.from == request.to {
            return Err(ScheduleError::SameAccount);
        }

        let mut unit = self.store.begin().await?;
        match Self::insert(&mut unit, &request, now).await {
            Ok(entry) => {
                unit.commit().await?;
                info!(
                    scheduled_transfer_id = %entry.id,
                    from = %entry.from,
                    to = %entry.to,
                    amount = %entry.amount,
                    scheduled_at = %entry.scheduled_at,
                    "transfer scheduled"
                );
                Ok(entry)
            }
            Err(e) => {
                discard(unit).await;
                Err(e)
            }
        }
    }

    async fn insert(
        unit: &mut S::Unit,
        request: &ScheduleRequest,
        now: DateTime<Utc>,
    ) -> Result<ScheduledTransfer, ScheduleError> {
        let accounts = unit.lock_accounts(&[request.from, request.to]).await?;
        for number in [request.from, request.to] {
            if !accounts.iter().any(|a| a.number == number) {
                return Err(ScheduleError::AccountNotFound(number));
            }
        }

        let entry = unit
            .insert_scheduled(NewScheduledTransfer {
                from: request.from,
                to: request.to,
                amount: request.amount,
                scheduled_at: request.scheduled_at,
                created_at: now,
            })
            .await?;
        Ok(entry)
    }

    /// Cancels a Pending entry whose scheduled time has not been reached.
    ///
    /// The entry row and both account rows are locked before the time check,
    /// so the executor cannot pick the entry up in between.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AlreadyProcessed`, `WindowPassed`, or
    /// `Persistence` if storage fails.
    pub async fn cancel(&self, id: ScheduledTransferId) -> Result<ScheduledTransfer, ScheduleError> {
        let mut unit = self.store.begin().await?;
        match self.cancel_in(&mut unit, id).await {
            Ok(entry) => {
                unit.commit().await?;
                info!(scheduled_transfer_id = %id, "scheduled transfer cancelled");
                Ok(entry)
            }
            Err(e) => {
                warn!(scheduled_transfer_id = %id, code = e.error_code(), "cancel rejected: {e}");
                discard(unit).await;
                Err(e)
            }
        }
    }

    async fn cancel_in(
        &self,
        unit: &mut S::Unit,
        id: ScheduledTransferId,
    ) -> Result<ScheduledTransfer, ScheduleError> {
        let entry = unit
            .lock_scheduled(id)
            .await?
            .ok_or(ScheduleError::NotFound(id))?;
        if entry.status.is_terminal() {
            return Err(ScheduleError::AlreadyProcessed {
                id,
                status: entry.status,
            });
        }

        unit.lock_accounts(&[entry.from, entry.to]).await?;
        let now = self.clock.now();
        if entry.scheduled_at <= now {
            return Err(ScheduleError::WindowPassed(id));
        }

        unit.update_scheduled_status(id, ScheduleStatus::Cancelled, now)
            .await?;
        Ok(ScheduledTransfer {
            status: ScheduleStatus::Cancelled,
            processed_at: Some(now),
            ..entry
        })
    }

    /// Verifies the source account's transaction password, then schedules.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` on a credential mismatch, otherwise as
    /// [`ScheduledTransferRegistry::create`].
    pub async fn create_authorized<V: CredentialVerifier>(
        &self,
        verifier: &V,
        password: &str,
        request: ScheduleRequest,
    ) -> Result<ScheduledTransfer, ScheduleError> {
        authorize(verifier, request.from, password).await?;
        self.create(request).await
    }

    /// Verifies the entry's source account password, then cancels.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Unauthorized` before anything is locked,
    /// otherwise as [`ScheduledTransferRegistry::cancel`].
    pub async fn cancel_authorized<V: CredentialVerifier>(
        &self,
        verifier: &V,
        password: &str,
        id: ScheduledTransferId,
    ) -> Result<ScheduledTransfer, ScheduleError> {
        let entry = self.get(id).await?;
        authorize(verifier, entry.from, password).await?;
        self.cancel(id).await
    }

    /// Looks up one entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Persistence` if storage fails.
    pub async fn get(&self, id: ScheduledTransferId) -> Result<ScheduledTransfer, ScheduleError> {
        self.store
            .find_scheduled(id)
            .await?
            .ok_or(ScheduleError::NotFound(id))
    }

    /// Pending entries due at `now`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if storage fails.
    pub async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: Option<u64>,
    ) -> Result<Vec<ScheduledTransfer>, ScheduleError> {
        Ok(self.store.list_due_scheduled(now, limit).await?)
    }

    /// Entries where the account is source or destination, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if storage fails.
    pub async fn list_by_account(
        &self,
        account: AccountNumber,
    ) -> Result<Vec<ScheduledTransfer>, ScheduleError> {
        Ok(self.store.list_scheduled_by_account(account).await?)
    }
}

fn validate_window(
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<(), ScheduleError> {
    let latest = now + window;
    if scheduled_at < now || scheduled_at > latest {
        return Err(ScheduleError::InvalidWindow {
            scheduled_at,
            earliest: now,
            latest,
        });
    }
    Ok(())
}

fn validate_amount(amount: Decimal, limit: Option<Decimal>) -> Result<(), ScheduleError> {
    if amount <= Decimal::ZERO || !fits_money_column(amount) {
        return Err(ScheduleError::InvalidAmount(amount));
    }
    match limit {
        Some(limit) if amount > limit => Err(ScheduleError::LimitExceeded { amount, limit }),
        _ => Ok(()),
    }
}

async fn authorize<V: CredentialVerifier>(
    verifier: &V,
    account: AccountNumber,
    password: &str,
) -> Result<(), ScheduleError> {
    if verifier.verify(account, password).await? {
        Ok(())
    } else {
        warn!(account = %account, "transaction password rejected");
        Err(ScheduleError::Unauthorized(account))
    }
}
