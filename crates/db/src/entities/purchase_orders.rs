//! `SeaORM` Entity for purchase_orders table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PurchaseKind, PurchaseStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: PurchaseKind,
    #[sea_orm(unique)]
    pub number: String,
    pub supplier_id: Uuid,
    pub status: PurchaseStatus,
    pub order_date: Date,
    pub notes: Option<String>,
    pub received_at: Option<DateTimeWithTimeZone>,
    pub ledger_entry_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id"
    )]
    Suppliers,
    #[sea_orm(has_many = "super::purchase_order_items::Entity")]
    PurchaseOrderItems,
    #[sea_orm(has_many = "super::purchase_order_expenses::Entity")]
    PurchaseOrderExpenses,
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl Related<super::purchase_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderItems.def()
    }
}

impl Related<super::purchase_order_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
