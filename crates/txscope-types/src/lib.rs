//! Shared types for txscope.
//!
//! Configuration (flat application properties, plugin settings, persistence
//! unit definitions), transaction status, the error enums used across the
//! workspace, and the demo `Note` entity.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod config;
pub mod error;
pub mod note;
pub mod transaction;
