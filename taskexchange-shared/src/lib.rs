//! # Task Exchange Shared Library
//!
//! This crate contains the data layer and business rules shared by the
//! Task Exchange API server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their SQL operations
//! - `ledger`: The point ledger (escrow, settlement, withdrawal)
//! - `auth`: Password hashing, JWT tokens, request auth context
//! - `db`: Connection pool and migrations
//! - `notify`: In-process notification fan-out for the SSE tail

pub mod auth;
pub mod db;
pub mod ledger;
pub mod models;
pub mod notify;

/// Current version of the Task Exchange shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
