//! Append-only audit trail of money movements.
//!
//! Every attempted credit, debit or transfer produces exactly one record,
//! Completed or Failed, written inside the same unit of work as the balance
//! change it describes.

pub mod comment;
pub mod service;
pub mod types;

pub use comment::{scheduled_comment, transfer_comment};
pub use service::{DEFAULT_MINI_STATEMENT_LEN, TransactionRecorder};
pub use types::{
    NewTransactionRecord, RecordEntry, RecordStatus, StatementQuery, TransactionKind,
    TransactionRecord,
};
