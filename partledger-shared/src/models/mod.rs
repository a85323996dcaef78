//! Database models for PartLedger
//!
//! This module contains all database models and their CRUD operations.
//!
//! # Models
//!
//! - `user`: Consigners and administrators
//! - `part`: Consigned items, including the sold/unsold transition planner
//! - `invoice_info`: The billing-entity record printed on invoices

pub mod invoice_info;
pub mod part;
pub mod user;
