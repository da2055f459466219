//! `SeaORM` entity definitions.

pub mod accounts;
pub mod applications;
pub mod brands;
pub mod categories;
mod conversions;
pub mod ledger_entries;
pub mod ledger_lines;
pub mod main_groups;
pub mod number_sequences;
pub mod parts;
pub mod purchase_order_expenses;
pub mod purchase_order_items;
pub mod purchase_orders;
pub mod sales_invoice_items;
pub mod sales_invoices;
pub mod sea_orm_active_enums;
pub mod stock_adjustments;
pub mod stock_movements;
pub mod stores;
pub mod subcategories;
pub mod subgroups;
pub mod suppliers;
