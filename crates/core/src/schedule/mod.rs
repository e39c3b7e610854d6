//! Scheduled transfers.
//!
//! - Domain types and the Pending → Executed | Failed | Cancelled lifecycle
//! - Registry for creation, lookup and cancellation
//! - Executor that drives due entries through the ledger

pub mod error;
pub mod executor;
pub mod registry;
pub mod types;

pub use error::ScheduleError;
pub use executor::{EntryOutcome, ScheduledTransferExecutor};
pub use registry::{DEFAULT_WINDOW_HOURS, ScheduledTransferRegistry};
pub use types::{
    NewScheduledTransfer, ScheduleRequest, ScheduleStatus, ScheduledTransfer, TickReport,
};
