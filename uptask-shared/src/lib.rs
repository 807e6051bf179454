//! # UpTask Shared Library
//!
//! Domain types, persistence and account utilities used by the UpTask API
//! server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, session tokens, codes and permission rules
//! - `models`: database models and their SQL
//! - `db`: connection pool, migrations and the `Store` abstraction
//! - `email`: outbound mail and account workflow templates

pub mod auth;
pub mod db;
pub mod email;
pub mod models;

/// Current version of the UpTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
