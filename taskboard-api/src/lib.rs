//! # Taskboard API Server Library
//!
//! HTTP surface for the multi-tenant task board: routing, request
//! validation, and the mapping of service errors onto HTTP responses.
//!
//! ## Modules
//!
//! - `app`: Application state, router and auth layers
//! - `config`: Environment configuration
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
