//! HTTP/REST host for the persistence plugin.
//!
//! Axum-based REST API at `/api/v1/`. Every API request runs inside a
//! request-scoped unit of work opened and resolved by `middleware`.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
