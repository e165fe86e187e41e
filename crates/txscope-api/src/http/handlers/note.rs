//! Note endpoint handlers.
//!
//! Every handler works through the request's unit of work; none of them
//! commits. The middleware commits on the way out unless the handler marked
//! the transaction rollback-only.

use std::time::Instant;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use txscope_infra::sqlite::note::{delete_note, find_note, list_notes};
use txscope_types::note::{validate_title, Note};

use crate::http::error::AppError;
use crate::http::extractors::unit_of_work::CurrentUnitOfWork;
use crate::http::response::ApiResponse;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

/// Request body for creating a note.
#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Query flags for note creation.
#[derive(Debug, Default, Deserialize)]
pub struct CreateNoteParams {
    /// Persist, then mark the transaction rollback-only.
    #[serde(default)]
    pub rollback: bool,
    /// Persist, then answer with a 500 (rolled back only with `rollbackOnError`).
    #[serde(default)]
    pub fail: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// POST /api/v1/notes - Persist a note in the request's transaction.
pub async fn create_note(
    uow: CurrentUnitOfWork,
    Query(params): Query<CreateNoteParams>,
    Json(body): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Note>>), AppError> {
    let start = Instant::now();

    validate_title(&body.title).map_err(AppError::Validation)?;

    let note = Note::new(body.title.trim(), body.body);
    uow.persist(&note).await?;

    if params.rollback {
        uow.set_rollback_only().await?;
    }
    if params.fail {
        return Err(AppError::Internal("note handler failed after persisting".to_string()));
    }

    let href = format!("/api/v1/notes/{}", note.id);
    let resp = ApiResponse::success(note, uow.request_id(), start.elapsed().as_millis() as u64)
        .with_link("self", &href);

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/notes - List notes, newest first.
pub async fn list(
    uow: CurrentUnitOfWork,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Note>>>, AppError> {
    let start = Instant::now();
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let notes = {
        let mut session = uow.session().await?;
        list_notes(&mut session, limit).await?
    };

    let resp = ApiResponse::success(notes, uow.request_id(), start.elapsed().as_millis() as u64)
        .with_link("self", "/api/v1/notes");
    Ok(Json(resp))
}

/// GET /api/v1/notes/{id} - Fetch one note.
pub async fn get(
    uow: CurrentUnitOfWork,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Note>>, AppError> {
    let start = Instant::now();

    let note = {
        let mut session = uow.session().await?;
        find_note(&mut session, &id).await?
    }
    .ok_or_else(|| AppError::NotFound(format!("Note {id} not found")))?;

    let href = format!("/api/v1/notes/{id}");
    let resp = ApiResponse::success(note, uow.request_id(), start.elapsed().as_millis() as u64)
        .with_link("self", &href);
    Ok(Json(resp))
}

/// DELETE /api/v1/notes/{id} - Delete one note.
pub async fn delete(
    uow: CurrentUnitOfWork,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();

    let removed = {
        let mut session = uow.session().await?;
        delete_note(&mut session, &id).await?
    };
    if !removed {
        return Err(AppError::NotFound(format!("Note {id} not found")));
    }

    let resp = ApiResponse::success(
        serde_json::json!({ "deleted": id }),
        uow.request_id(),
        start.elapsed().as_millis() as u64,
    );
    Ok(Json(resp))
}
