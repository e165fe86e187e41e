//! Infrastructure layer for txscope.
//!
//! Implements the persistence ports from `txscope-core` on SQLite (sqlx):
//! the pooled session factory, transaction-holding sessions, and entity
//! mappings. Also loads the TOML configuration files.

pub mod config;
pub mod sqlite;
