//! SQLite session: one pooled connection held inside a transaction.

use std::sync::Arc;

use sqlx::sqlite::{SqliteConnection, SqlitePool};
use sqlx::{Sqlite, Transaction};
use tracing::Instrument;
use txscope_core::session::Session;
use txscope_observe::db_attrs;
use txscope_types::error::PersistenceError;
use txscope_types::transaction::TransactionStatus;
use uuid::Uuid;

use super::map_sqlx;

/// Session over a SQLite persistence unit.
///
/// While a transaction is active the session owns a pooled connection; the
/// connection returns to the pool on commit, rollback, or close. Dropping a
/// session with an open transaction rolls it back.
pub struct SqliteSession {
    id: Uuid,
    unit: Arc<str>,
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
    rollback_only: bool,
}

impl SqliteSession {
    pub(crate) fn new(unit: Arc<str>, pool: SqlitePool) -> Self {
        Self {
            id: Uuid::now_v7(),
            unit,
            pool,
            tx: None,
            rollback_only: false,
        }
    }

    pub fn persistence_unit(&self) -> &str {
        &self.unit
    }

    /// The transaction's connection, for queries issued by entity mappings.
    pub fn connection(&mut self) -> Result<&mut SqliteConnection, PersistenceError> {
        self.tx
            .as_deref_mut()
            .ok_or(PersistenceError::NoActiveTransaction)
    }

    /// Map a statement failure and doom the active transaction.
    ///
    /// Any database error other than a missing row marks the transaction
    /// rollback-only, so the end-of-request hook never commits the writes
    /// that preceded it.
    pub fn fail(&mut self, e: sqlx::Error) -> PersistenceError {
        let err = map_sqlx(e);
        if self.tx.is_some() && !matches!(err, PersistenceError::NotFound) {
            if !self.rollback_only {
                tracing::debug!(
                    session_id = %self.id,
                    unit = %self.unit,
                    error = %err,
                    "statement failed, transaction marked rollback-only"
                );
            }
            self.rollback_only = true;
        }
        err
    }

    fn span(&self, operation: &'static str) -> tracing::Span {
        tracing::debug_span!(
            "db.transaction",
            db.system = db_attrs::SYSTEM_SQLITE,
            db.operation.name = operation,
            db.namespace = %self.unit,
            db.session.id = %self.id,
        )
    }
}

impl Session for SqliteSession {
    fn id(&self) -> Uuid {
        self.id
    }

    fn status(&self) -> TransactionStatus {
        match (&self.tx, self.rollback_only) {
            (None, _) => TransactionStatus::Absent,
            (Some(_), true) => TransactionStatus::RollbackOnly,
            (Some(_), false) => TransactionStatus::Active,
        }
    }

    async fn begin(&mut self) -> Result<(), PersistenceError> {
        if self.tx.is_some() {
            return Err(PersistenceError::TransactionAlreadyActive);
        }
        let span = self.span(db_attrs::OP_BEGIN);
        let tx = self.pool.begin().instrument(span).await.map_err(map_sqlx)?;
        self.tx = Some(tx);
        self.rollback_only = false;
        Ok(())
    }

    fn set_rollback_only(&mut self) -> Result<(), PersistenceError> {
        if self.tx.is_none() {
            return Err(PersistenceError::NoActiveTransaction);
        }
        self.rollback_only = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        if self.rollback_only && self.tx.is_some() {
            return Err(PersistenceError::RollbackOnly);
        }
        let tx = self.tx.take().ok_or(PersistenceError::NoActiveTransaction)?;
        let span = self.span(db_attrs::OP_COMMIT);
        tx.commit().instrument(span).await.map_err(map_sqlx)
    }

    async fn rollback(&mut self) -> Result<(), PersistenceError> {
        let tx = self.tx.take().ok_or(PersistenceError::NoActiveTransaction)?;
        self.rollback_only = false;
        let span = self.span(db_attrs::OP_ROLLBACK);
        tx.rollback().instrument(span).await.map_err(map_sqlx)
    }

    async fn close(mut self) {
        if let Some(tx) = self.tx.take() {
            let span = self.span(db_attrs::OP_ROLLBACK);
            if let Err(e) = tx.rollback().instrument(span).await {
                tracing::warn!(
                    session_id = %self.id,
                    unit = %self.unit,
                    error = %e,
                    "rollback on close failed"
                );
            }
        }
    }
}
