//! Transaction introspection for the current request.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use txscope_core::session::{Session, SessionFactory};
use txscope_types::transaction::TransactionStatus;

use crate::http::error::AppError;
use crate::http::extractors::unit_of_work::CurrentUnitOfWork;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TransactionInfo {
    pub session_id: String,
    pub persistence_unit: String,
    pub status: TransactionStatus,
}

/// GET /api/v1/transaction - Report the request's session and transaction.
pub async fn current(
    State(state): State<AppState>,
    uow: CurrentUnitOfWork,
) -> Result<Json<ApiResponse<TransactionInfo>>, AppError> {
    let start = Instant::now();

    let info = {
        let session = uow.session().await?;
        TransactionInfo {
            session_id: session.id().to_string(),
            persistence_unit: state.uow.factory().persistence_unit().to_string(),
            status: session.status(),
        }
    };

    let resp = ApiResponse::success(info, uow.request_id(), start.elapsed().as_millis() as u64)
        .with_link("self", "/api/v1/transaction");
    Ok(Json(resp))
}
