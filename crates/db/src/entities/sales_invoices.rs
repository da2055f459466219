//! `SeaORM` Entity for sales_invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::InvoiceStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub number: String,
    pub customer_name: String,
    pub status: InvoiceStatus,
    pub invoice_date: Date,
    pub posted_at: Option<DateTimeWithTimeZone>,
    pub ledger_entry_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sales_invoice_items::Entity")]
    SalesInvoiceItems,
}

impl Related<super::sales_invoice_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesInvoiceItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
