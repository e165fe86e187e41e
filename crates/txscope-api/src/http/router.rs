//! Axum router configuration with middleware.
//!
//! All API routes are under `/api/v1/` and run inside a request-scoped unit
//! of work. `/health` stays outside it.
//! Middleware: CORS, tracing, panic capture, unit of work.

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::middleware::unit_of_work;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", with_unit_of_work(api_routes(), state.clone()))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes that need a unit of work.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notes",
            get(handlers::note::list).post(handlers::note::create_note),
        )
        .route(
            "/notes/{id}",
            get(handlers::note::get).delete(handlers::note::delete),
        )
        .route("/transaction", get(handlers::transaction::current))
}

/// Wrap `routes` so each request is bracketed by the plugin's hooks.
///
/// `CatchPanicLayer` sits inside the unit-of-work middleware so a panicking
/// handler still reaches `on_request_finally`.
pub fn with_unit_of_work(routes: Router<AppState>, state: AppState) -> Router<AppState> {
    routes
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(state, unit_of_work))
}

/// GET /health - Simple health check endpoint (no unit of work).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
