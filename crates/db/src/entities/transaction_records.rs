//! `SeaORM` Entity for transaction_records table.
//!
//! No foreign keys: failed attempts against unknown accounts are recorded too.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{RecordStatus, TransactionKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub kind: TransactionKind,
    pub from_account: Option<i64>,
    pub to_account: Option<i64>,
    #[sea_orm(column_type = "Decimal(None)")]
    pub amount: Decimal,
    pub recorded_at: DateTimeWithTimeZone,
    pub status: RecordStatus,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub scheduled_transfer_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
