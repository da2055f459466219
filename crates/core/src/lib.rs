//! Core business logic for Inventra.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `catalog` - Part rules and canonical selection among duplicates
//! - `costing` - Average cost, landed cost and expense distribution
//! - `documents` - Purchase, sales and adjustment lifecycle planning
//! - `ledger` - Double-entry bookkeeping logic
//! - `reports` - Financial statements, reconciliation and stock reports
//! - `stock` - Movement log and derived stock levels

pub mod catalog;
pub mod costing;
pub mod documents;
pub mod ledger;
pub mod reports;
pub mod stock;
