//! `SeaORM` Entity for sales_invoice_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_invoice_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sales_invoice_id: Uuid,
    pub line_no: i32,
    pub part_id: Uuid,
    pub store_id: Option<Uuid>,
    pub quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub unit_price: Decimal,
    /// Cost used for COGS, filled when the invoice is posted.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub unit_cost: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales_invoices::Entity",
        from = "Column::SalesInvoiceId",
        to = "super::sales_invoices::Column::Id",
        on_delete = "Cascade"
    )]
    SalesInvoices,
}

impl Related<super::sales_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
