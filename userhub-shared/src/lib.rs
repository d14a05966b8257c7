//! # userhub Shared Library
//!
//! Database-facing building blocks for the userhub API server.
//!
//! ## Module Organization
//!
//! - `credentials`: database credentials from the environment or AWS Secrets Manager
//! - `db`: connection pool and schema synchronization
//! - `models`: the `User` model and its SQL

pub mod credentials;
pub mod db;
pub mod models;

/// Current version of the userhub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
