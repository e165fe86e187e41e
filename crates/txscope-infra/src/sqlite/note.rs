//! Note entity mapping for SQLite sessions.
//!
//! Writes go through `Persistable`; reads are free functions over a session so
//! they observe the request's own uncommitted writes.

use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::Instrument;
use txscope_core::session::{Persistable, Session};
use txscope_observe::db_attrs;
use txscope_types::error::PersistenceError;
use txscope_types::note::Note;
use uuid::Uuid;

use super::map_sqlx;
use super::session::SqliteSession;

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct NoteRow {
    id: String,
    title: String,
    body: String,
    created_at: String,
}

impl NoteRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_note(self) -> Result<Note, PersistenceError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| PersistenceError::Query(format!("invalid note id: {e}")))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PersistenceError::Query(format!("invalid datetime: {e}")))?;

        Ok(Note {
            id,
            title: self.title,
            body: self.body,
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Persistable implementation
// ---------------------------------------------------------------------------

impl Persistable<SqliteSession> for Note {
    async fn persist_in(&self, session: &mut SqliteSession) -> Result<(), PersistenceError> {
        let span = tracing::debug_span!(
            "db.persist",
            db.system = db_attrs::SYSTEM_SQLITE,
            db.operation.name = db_attrs::OP_PERSIST,
            db.namespace = %session.persistence_unit(),
            db.session.id = %session.id(),
        );
        let conn = session.connection()?;

        let result = sqlx::query("INSERT INTO notes (id, title, body, created_at) VALUES (?, ?, ?, ?)")
            .bind(self.id.to_string())
            .bind(&self.title)
            .bind(&self.body)
            .bind(self.created_at.to_rfc3339())
            .execute(conn)
            .instrument(span)
            .await;
        result.map_err(|e| session.fail(e))?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch one note by id.
pub async fn find_note(session: &mut SqliteSession, id: &Uuid) -> Result<Option<Note>, PersistenceError> {
    let conn = session.connection()?;
    let row = sqlx::query("SELECT id, title, body, created_at FROM notes WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(conn)
        .await;
    let row = row.map_err(|e| session.fail(e))?;

    row.map(|r| NoteRow::from_row(&r).map_err(map_sqlx)?.into_note())
        .transpose()
}

/// List notes, newest first.
pub async fn list_notes(session: &mut SqliteSession, limit: i64) -> Result<Vec<Note>, PersistenceError> {
    let conn = session.connection()?;
    let rows = sqlx::query(
        "SELECT id, title, body, created_at FROM notes ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(conn)
    .await;
    let rows = rows.map_err(|e| session.fail(e))?;

    rows.iter()
        .map(|r| NoteRow::from_row(r).map_err(map_sqlx)?.into_note())
        .collect()
}

/// Delete a note. Returns whether a row was removed.
pub async fn delete_note(session: &mut SqliteSession, id: &Uuid) -> Result<bool, PersistenceError> {
    let conn = session.connection()?;
    let result = sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(id.to_string())
        .execute(conn)
        .await;
    let result = result.map_err(|e| session.fail(e))?;
    Ok(result.rows_affected() > 0)
}
