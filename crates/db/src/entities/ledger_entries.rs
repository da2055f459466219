//! `SeaORM` Entity for ledger_entries table.
//!
//! Journal entries and vouchers share this table; `kind` tells them apart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryKind, EntryStatus, ReferenceType, VoucherType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: EntryKind,
    pub voucher_type: Option<VoucherType>,
    #[sea_orm(unique)]
    pub entry_no: String,
    pub entry_date: Date,
    pub description: String,
    pub status: EntryStatus,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<Uuid>,
    pub posted_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_lines::Entity")]
    LedgerLines,
}

impl Related<super::ledger_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
