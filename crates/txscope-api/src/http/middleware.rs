//! Unit-of-work middleware: the host side of the plugin's request hooks.
//!
//! For every request: create a fresh context, run `on_request_received`,
//! expose the context through request extensions, run the handler, then run
//! `on_request_finally` exactly once. A panicking handler is converted to a
//! 500 by the inner `CatchPanicLayer`, so the finally hook still runs.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::error::AppError;
use crate::state::{AppState, RequestUnitOfWork};

/// Response header reporting how the unit of work was resolved.
pub const UNIT_OF_WORK_HEADER: &str = "x-unit-of-work";

/// Response header carrying the request id used in log fields.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn unit_of_work(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let ctx = RequestUnitOfWork::new();
    let request_id = ctx.request_id();

    if let Err(e) = state.uow.on_request_received(&ctx).await {
        tracing::error!(%request_id, error = %e, "could not start unit of work");
        return AppError::Unavailable(e.to_string()).into_response();
    }

    request.extensions_mut().insert(ctx.clone());
    let mut response = next.run(request).await;

    if response.status().is_server_error() && state.uow.on_request_failed(&ctx).await {
        tracing::debug!(%request_id, status = %response.status(), "server error, transaction marked rollback-only");
    }

    let completion = state.uow.on_request_finally(&ctx).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    if let Some(completion) = completion {
        headers.insert(UNIT_OF_WORK_HEADER, HeaderValue::from_static(completion.as_str()));
    }

    response
}
