//! Authentication utilities
//!
//! - `password`: Argon2id hashing and verification
//! - `jwt`: HS256 access, refresh, and password-reset tokens
//! - `middleware`: per-request authentication context

pub mod jwt;
pub mod middleware;
pub mod password;
