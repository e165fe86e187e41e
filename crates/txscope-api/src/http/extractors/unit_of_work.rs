//! Extractor for the current request's unit of work.
//!
//! The middleware stores a `RequestUnitOfWork` in the request extensions;
//! handlers take `CurrentUnitOfWork` as an argument instead of reaching for
//! global state.

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use txscope_types::error::PersistenceError;

use crate::http::error::AppError;
use crate::state::RequestUnitOfWork;

/// The unit of work bound to the current request.
pub struct CurrentUnitOfWork(pub RequestUnitOfWork);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUnitOfWork {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestUnitOfWork>()
            .cloned()
            .map(CurrentUnitOfWork)
            .ok_or(AppError::Persistence(PersistenceError::NoActiveSession))
    }
}

impl Deref for CurrentUnitOfWork {
    type Target = RequestUnitOfWork;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
