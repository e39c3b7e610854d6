//! `SeaORM` entities for the ledger schema.

pub mod accounts;
pub mod scheduled_transfers;
pub mod sea_orm_active_enums;
pub mod transaction_records;

pub mod prelude {
    //! Entity re-exports.
    pub use super::accounts::Entity as Accounts;
    pub use super::scheduled_transfers::Entity as ScheduledTransfers;
    pub use super::transaction_records::Entity as TransactionRecords;
}
