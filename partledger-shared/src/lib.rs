//! # PartLedger Shared Library
//!
//! This crate contains the models, business rules, and utilities shared by
//! the PartLedger API server and its import tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `db`: Connection pooling and migrations
//! - `auth`: Password hashing, tokens, and request auth context
//! - `fields`: Declarative single-field update tables and coercion
//! - `import`: CSV normalization and bulk import
//! - `invoice`: Fee and line-total computation
//! - `mailer`: Best-effort notification email delivery

pub mod auth;
pub mod db;
pub mod fields;
pub mod import;
pub mod invoice;
pub mod mailer;
pub mod models;

/// Current version of the PartLedger shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
