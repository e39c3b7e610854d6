//! Coffer scheduled transfer service.
//!
//! Connects to the ledger database and executes due scheduled transfers on a
//! fixed period until interrupted.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use coffer_core::clock::{Clock, SystemClock};
use coffer_core::ledger::{AccountLedger, LedgerLimits};
use coffer_core::schedule::{ScheduledTransferExecutor, ScheduledTransferRegistry};
use coffer_db::{PgLedgerStore, connect};
use coffer_shared::AppConfig;
use coffer_shared::config::LoggingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let db = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let store = Arc::new(PgLedgerStore::new(db));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let limits = LedgerLimits::from(&config.limits);
    let ledger = AccountLedger::new(Arc::clone(&store), Arc::clone(&clock), limits);
    let registry = ScheduledTransferRegistry::new(
        store,
        clock,
        Duration::hours(config.scheduler.window_hours),
    )
    .with_transfer_limit(limits.transfer);
    let executor = ScheduledTransferExecutor::new(ledger, registry, config.scheduler.batch_size);

    let period = StdDuration::from_secs(config.scheduler.tick_interval_secs);
    executor
        .run(period, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await;

    info!("Scheduler stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
