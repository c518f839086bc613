//! # Taskboard Shared Library
//!
//! Domain logic for the Taskboard backend, independent of HTTP.
//!
//! ## Module Organization
//!
//! - `auth`: token issuance, password hashing, request authentication and
//!   project access strategies
//! - `db`: connection pool and embedded migrations
//! - `models`: row types and their queries
//! - `services`: business operations (accounts, organizations, projects,
//!   status ordering, tasks and assignments)

pub mod auth;
pub mod db;
pub mod models;
pub mod services;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
