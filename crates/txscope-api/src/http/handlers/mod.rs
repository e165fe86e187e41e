//! REST API endpoint handlers.

pub mod note;
pub mod transaction;
