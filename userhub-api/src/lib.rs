//! # userhub API Server Library
//!
//! HTTP CRUD service for the `User` resource.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors
//! - `routes`: API route handlers
//! - `startup`: Credential resolution, connection and schema sync

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod startup;
