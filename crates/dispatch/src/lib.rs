//! Outreach Dispatch library.
//!
//! The CRM JSON API and the `send-automated-email` campaign dispatch function,
//! packaged as a library so the CLI and the integration tests can drive the
//! same code the server runs.
//!
//! # Layout
//!
//! - [`config`] - Environment configuration
//! - [`db`] - `PostgreSQL` repositories and migrations
//! - [`store`] - The data seam used by dispatch
//! - [`services`] - Mailers and the dispatcher
//! - [`routes`] - Axum handlers and the application router

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use routes::app;
