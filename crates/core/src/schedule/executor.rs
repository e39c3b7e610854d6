//! Scheduled transfer executor.
//!
//! A periodic driver that claims each due entry in its own unit of work and
//! runs it through the ledger exactly as a synchronous caller would. One
//! entry failing never affects another in the same tick.

use std::future::Future;
use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use coffer_shared::types::ScheduledTransferId;

use super::error::ScheduleError;
use super::registry::ScheduledTransferRegistry;
use super::types::{ScheduleStatus, ScheduledTransfer, TickReport};
use crate::clock::Clock;
use crate::ledger::service::discard;
use crate::ledger::{AccountLedger, TransferRequest};
use crate::recorder::scheduled_comment;
use crate::store::{LedgerStore, StoreError, UnitOfWork};

/// What happened to one due entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Transfer went through; entry is Executed.
    Executed,
    /// Transfer was rejected; entry is Failed for good.
    Failed,
    /// Storage failed; entry is still Pending.
    Deferred,
    /// Entry was claimed elsewhere or is no longer Pending.
    Skipped,
}

/// Drives due scheduled transfers through the ledger.
pub struct ScheduledTransferExecutor<S: LedgerStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ledger: AccountLedger<S>,
    registry: ScheduledTransferRegistry<S>,
    batch_size: u64,
}

impl<S: LedgerStore> ScheduledTransferExecutor<S> {
    /// Create an executor processing at most `batch_size` entries per tick.
    #[must_use]
    pub fn new(
        ledger: AccountLedger<S>,
        registry: ScheduledTransferRegistry<S>,
        batch_size: u64,
    ) -> Self {
        Self {
            store: Arc::clone(registry.store()),
            clock: Arc::clone(registry.clock()),
            ledger,
            registry,
            batch_size,
        }
    }

    /// Processes every entry due now, each in isolation.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` only if the due entries cannot be listed.
    /// Per-entry storage failures are counted as deferred.
    pub async fn tick(&self) -> Result<TickReport, ScheduleError> {
        let now = self.clock.now();
        let due = self.registry.list_due(now, Some(self.batch_size)).await?;

        let mut report = TickReport::default();
        for entry in &due {
            match self.execute_one(entry).await {
                EntryOutcome::Executed => report.executed += 1,
                EntryOutcome::Failed => report.failed += 1,
                EntryOutcome::Deferred => report.deferred += 1,
                EntryOutcome::Skipped => report.skipped += 1,
            }
        }
        Ok(report)
    }

    /// Claims and runs one entry in its own unit of work.
    pub async fn execute_one(&self, entry: &ScheduledTransfer) -> EntryOutcome {
        let mut unit = match self.store.begin().await {
            Ok(unit) => unit,
            Err(e) => {
                error!(scheduled_transfer_id = %entry.id, "could not open unit of work: {e}");
                return EntryOutcome::Deferred;
            }
        };

        match self.settle(&mut unit, entry.id).await {
            Ok(None) => {
                debug!(scheduled_transfer_id = %entry.id, "entry already claimed or processed");
                discard(unit).await;
                EntryOutcome::Skipped
            }
            Ok(Some(outcome)) => match unit.commit().await {
                Ok(()) => outcome,
                Err(e) => {
                    error!(scheduled_transfer_id = %entry.id, "commit failed, entry stays pending: {e}");
                    EntryOutcome::Deferred
                }
            },
            Err(e) => {
                error!(scheduled_transfer_id = %entry.id, "storage failed, entry stays pending: {e}");
                discard(unit).await;
                EntryOutcome::Deferred
            }
        }
    }

    async fn settle(
        &self,
        unit: &mut S::Unit,
        id: ScheduledTransferId,
    ) -> Result<Option<EntryOutcome>, StoreError> {
        let Some(entry) = unit.claim_scheduled(id).await? else {
            return Ok(None);
        };

        let request = TransferRequest::new(entry.from, entry.to, entry.amount);
        let comment = scheduled_comment(entry.from, entry.to);
        let limit = self.ledger.limits().transfer;
        let outcome = self
            .ledger
            .settle_transfer(unit, &request, limit, comment, Some(id))
            .await?;

        let now = self.clock.now();
        match outcome {
            Ok(receipt) => {
                unit.update_scheduled_status(id, ScheduleStatus::Executed, now)
                    .await?;
                info!(
                    scheduled_transfer_id = %id,
                    from = %entry.from,
                    to = %entry.to,
                    amount = %entry.amount,
                    record_id = %receipt.record.id,
                    "scheduled transfer executed"
                );
                Ok(Some(EntryOutcome::Executed))
            }
            Err(e) => {
                unit.update_scheduled_status(id, ScheduleStatus::Failed, now)
                    .await?;
                warn!(
                    scheduled_transfer_id = %id,
                    from = %entry.from,
                    to = %entry.to,
                    code = e.error_code(),
                    "scheduled transfer failed: {e}"
                );
                Ok(Some(EntryOutcome::Failed))
            }
        }
    }

    /// Ticks every `period` until `shutdown` resolves.
    ///
    /// The first tick runs immediately. No lock is held between ticks.
    pub async fn run<F>(&self, period: std::time::Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(period_secs = period.as_secs(), "scheduled transfer executor started");
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("scheduled transfer executor stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(report) if report.total() > 0 => info!(
                            executed = report.executed,
                            failed = report.failed,
                            deferred = report.deferred,
                            skipped = report.skipped,
                            "tick complete"
                        ),
                        Ok(_) => debug!("no scheduled transfers due"),
                        Err(e) => error!("could not load due scheduled transfers: {e}"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ledger::{Account, AccountType, LedgerLimits};
    use crate::policy::AccountStatus;
    use crate::recorder::{RecordStatus, StatementQuery};
    use crate::schedule::ScheduleRequest;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use coffer_shared::types::{AccountNumber, UserId};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const A: AccountNumber = AccountNumber(1001);
    const B: AccountNumber = AccountNumber(1002);
    const C: AccountNumber = AccountNumber(1003);

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        registry: ScheduledTransferRegistry<MemoryStore>,
        executor: ScheduledTransferExecutor<MemoryStore>,
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    async fn fixture(balances: [(AccountNumber, Decimal); 3]) -> Fixture {
        fixture_with_limits(balances, LedgerLimits::unlimited()).await
    }

    async fn fixture_with_limits(
        balances: [(AccountNumber, Decimal); 3],
        limits: LedgerLimits,
    ) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        for (number, balance) in balances {
            store
                .insert_account(Account {
                    number,
                    user_id: UserId(number.get()),
                    account_type: AccountType::Savings,
                    balance,
                    status: AccountStatus::Active,
                    ifsc_code: "CFR0000001".to_string(),
                    opened_at: start(),
                })
                .await;
        }
        let clock = Arc::new(ManualClock::new(start()));
        let shared_clock: Arc<dyn Clock> = clock.clone();
        let ledger = AccountLedger::new(
            Arc::clone(&store),
            Arc::clone(&shared_clock),
            limits,
        );
        let registry =
            ScheduledTransferRegistry::with_default_window(Arc::clone(&store), shared_clock)
                .with_transfer_limit(limits.transfer);
        let executor = ScheduledTransferExecutor::new(ledger, registry.clone(), 100);
        Fixture {
            store,
            clock,
            registry,
            executor,
        }
    }

    async fn schedule(f: &Fixture, from: AccountNumber, to: AccountNumber, amount: Decimal) -> ScheduledTransfer {
        f.registry
            .create(ScheduleRequest {
                from,
                to,
                amount,
                scheduled_at: start() + Duration::hours(1),
            })
            .await
            .unwrap()
    }

    async fn balance(f: &Fixture, number: AccountNumber) -> Decimal {
        f.store.find_account(number).await.unwrap().unwrap().balance
    }

    async fn status(f: &Fixture, entry: &ScheduledTransfer) -> ScheduleStatus {
        f.registry.get(entry.id).await.unwrap().status
    }

    #[tokio::test]
    async fn test_tick_isolates_failures() {
        let f = fixture([(A, dec!(1000)), (B, dec!(0)), (C, dec!(100))]).await;
        let first = schedule(&f, A, B, dec!(300)).await;
        let second = schedule(&f, C, B, dec!(500)).await;
        let third = schedule(&f, A, B, dec!(200)).await;

        // nothing is due yet
        assert_eq!(f.executor.tick().await.unwrap().total(), 0);

        f.clock.advance(Duration::hours(2));
        let report = f.executor.tick().await.unwrap();
        assert_eq!(
            report,
            TickReport {
                executed: 2,
                failed: 1,
                deferred: 0,
                skipped: 0
            }
        );

        assert_eq!(status(&f, &first).await, ScheduleStatus::Executed);
        assert_eq!(status(&f, &second).await, ScheduleStatus::Failed);
        assert_eq!(status(&f, &third).await, ScheduleStatus::Executed);
        assert_eq!(balance(&f, A).await, dec!(500));
        assert_eq!(balance(&f, B).await, dec!(500));
        assert_eq!(balance(&f, C).await, dec!(100));

        let records = f
            .store
            .list_records(&StatementQuery::all(B))
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.is_scheduled()));
        let failed: Vec<_> = records
            .iter()
            .filter(|r| r.status == RecordStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].scheduled_transfer_id, Some(second.id));

        // terminal entries are never picked up again
        assert_eq!(f.executor.tick().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_over_limit_entry_never_reaches_executor() {
        let limits = LedgerLimits {
            transfer: Some(dec!(150000)),
            ..LedgerLimits::unlimited()
        };
        let f = fixture_with_limits([(A, dec!(500000)), (B, dec!(0)), (C, dec!(0))], limits).await;

        let err = f
            .registry
            .create(ScheduleRequest {
                from: A,
                to: B,
                amount: dec!(200000),
                scheduled_at: start() + Duration::hours(1),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::LimitExceeded { .. }));

        let entry = schedule(&f, A, B, dec!(150000)).await;
        f.clock.advance(Duration::hours(2));
        let report = f.executor.tick().await.unwrap();
        assert_eq!(report.executed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(status(&f, &entry).await, ScheduleStatus::Executed);
        assert_eq!(balance(&f, B).await, dec!(150000));
    }

    #[tokio::test]
    async fn test_executed_record_comment() {
        let f = fixture([(A, dec!(1000)), (B, dec!(0)), (C, dec!(0))]).await;
        let entry = schedule(&f, A, B, dec!(10)).await;
        f.clock.advance(Duration::hours(1));

        assert_eq!(f.executor.execute_one(&entry).await, EntryOutcome::Executed);
        let records = f
            .store
            .list_records(&StatementQuery::all(A))
            .await
            .unwrap();
        assert_eq!(records[0].status, RecordStatus::Completed);
        assert_eq!(
            records[0].comment,
            "Scheduled transaction from 1001 account to 1002 account"
        );
        let processed = f.registry.get(entry.id).await.unwrap();
        assert_eq!(processed.processed_at, Some(start() + Duration::hours(1)));

        // a second attempt finds nothing to claim
        assert_eq!(f.executor.execute_one(&entry).await, EntryOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_commit_failure_defers_entry() {
        let f = fixture([(A, dec!(1000)), (B, dec!(0)), (C, dec!(0))]).await;
        let entry = schedule(&f, A, B, dec!(300)).await;
        f.clock.advance(Duration::hours(2));

        f.store.fail_next_commit();
        let report = f.executor.tick().await.unwrap();
        assert_eq!(report.deferred, 1);
        assert_eq!(status(&f, &entry).await, ScheduleStatus::Pending);
        assert_eq!(balance(&f, A).await, dec!(1000));

        let report = f.executor.tick().await.unwrap();
        assert_eq!(report.executed, 1);
        assert_eq!(balance(&f, A).await, dec!(700));
        assert_eq!(balance(&f, B).await, dec!(300));
    }

    #[tokio::test]
    async fn test_write_failure_defers_entry() {
        let f = fixture([(A, dec!(1000)), (B, dec!(0)), (C, dec!(0))]).await;
        let entry = schedule(&f, A, B, dec!(300)).await;
        f.clock.advance(Duration::hours(2));

        f.store.fail_balance_write(2);
        assert_eq!(f.executor.execute_one(&entry).await, EntryOutcome::Deferred);
        assert_eq!(status(&f, &entry).await, ScheduleStatus::Pending);
        assert_eq!(balance(&f, A).await, dec!(1000));
        assert_eq!(balance(&f, B).await, dec!(0));
    }

    #[tokio::test]
    async fn test_cancelled_entry_is_not_executed() {
        let f = fixture([(A, dec!(1000)), (B, dec!(0)), (C, dec!(0))]).await;
        let entry = schedule(&f, A, B, dec!(300)).await;
        f.registry.cancel(entry.id).await.unwrap();

        f.clock.advance(Duration::hours(2));
        assert_eq!(f.executor.tick().await.unwrap().total(), 0);
        assert_eq!(f.executor.execute_one(&entry).await, EntryOutcome::Skipped);
        assert_eq!(balance(&f, A).await, dec!(1000));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let f = fixture([(A, dec!(1000)), (B, dec!(0)), (C, dec!(0))]).await;
        let entry = schedule(&f, A, B, dec!(300)).await;
        f.clock.advance(Duration::hours(2));

        f.executor
            .run(std::time::Duration::from_millis(10), async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            })
            .await;

        assert_eq!(status(&f, &entry).await, ScheduleStatus::Executed);
    }
}
