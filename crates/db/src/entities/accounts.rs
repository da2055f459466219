//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub subgroup_id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub opening_balance: Decimal,
    /// Cached `opening_balance + Σ posted line deltas`.
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub current_balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subgroups::Entity",
        from = "Column::SubgroupId",
        to = "super::subgroups::Column::Id"
    )]
    Subgroups,
    #[sea_orm(has_many = "super::ledger_lines::Entity")]
    LedgerLines,
    #[sea_orm(has_many = "super::suppliers::Entity")]
    Suppliers,
}

impl Related<super::subgroups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subgroups.def()
    }
}

impl Related<super::ledger_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerLines.def()
    }
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
