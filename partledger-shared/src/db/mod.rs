//! Database layer for PartLedger
//!
//! - `pool`: PostgreSQL connection pool management with a startup health check
//! - `migrations`: embedded migration runner
//!
//! Models live in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
