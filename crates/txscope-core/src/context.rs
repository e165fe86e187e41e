//! Per-request unit-of-work context.
//!
//! `UnitOfWorkContext` replaces thread-bound session storage: the host creates
//! one per request, passes it to the lifecycle hooks, and hands clones to
//! application code. Clones share the same slot (backed by `Arc`), so the
//! session the start hook binds is the one the end hook resolves.
//!
//! The slot is guarded by a `tokio::sync::Mutex` so a handler may hold the
//! session across `.await` points. Application accessors never wait on it:
//! while a `SessionGuard` is alive, further accessor calls fail with
//! `SessionBusy`. Work through the guard itself instead.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use txscope_types::error::PersistenceError;
use txscope_types::transaction::TransactionStatus;
use uuid::Uuid;

use crate::session::{Persistable, Session};

/// Guarded mutable access to the session bound to a context.
pub type SessionGuard<'a, S> = MappedMutexGuard<'a, S>;

/// Holder for the single session of one in-flight request.
pub struct UnitOfWorkContext<S> {
    request_id: Uuid,
    slot: Arc<Mutex<Option<S>>>,
}

impl<S> Clone for UnitOfWorkContext<S> {
    fn clone(&self) -> Self {
        Self {
            request_id: self.request_id,
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<S> fmt::Debug for UnitOfWorkContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWorkContext")
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

impl<S: Session> Default for UnitOfWorkContext<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Session> UnitOfWorkContext<S> {
    /// Create an empty context with a fresh request id.
    pub fn new() -> Self {
        Self::with_request_id(Uuid::now_v7())
    }

    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Whether a session is currently bound.
    pub async fn is_bound(&self) -> bool {
        match self.slot.try_lock() {
            Ok(slot) => slot.is_some(),
            // Only a live `SessionGuard` holds the lock outside the hooks.
            Err(_) => true,
        }
    }

    /// Bind `session`, returning whatever was bound before.
    pub(crate) async fn bind(&self, session: S) -> Option<S> {
        self.slot.lock().await.replace(session)
    }

    /// Unbind and return the session, leaving the context empty.
    pub(crate) async fn take(&self) -> Option<S> {
        self.slot.lock().await.take()
    }

    /// The session bound to this request.
    ///
    /// Returns `NoActiveSession` outside the start/end hooks and
    /// `SessionBusy` while another guard for this request is alive.
    pub async fn session(&self) -> Result<SessionGuard<'_, S>, PersistenceError> {
        let guard = self
            .slot
            .try_lock()
            .map_err(|_| PersistenceError::SessionBusy)?;
        MutexGuard::try_map(guard, |slot| slot.as_mut())
            .map_err(|_| PersistenceError::NoActiveSession)
    }

    /// Status of the current request's transaction.
    pub async fn transaction(&self) -> Result<TransactionStatus, PersistenceError> {
        Ok(self.session().await?.status())
    }

    /// Persist `entity` in the current request's transaction.
    pub async fn persist<E: Persistable<S>>(&self, entity: &E) -> Result<(), PersistenceError> {
        let mut session = self.session().await?;
        session.persist(entity).await
    }

    /// Mark the current transaction rollback-only.
    pub async fn set_rollback_only(&self) -> Result<(), PersistenceError> {
        self.session().await?.set_rollback_only()
    }

    /// Commit early. The end hook then only closes the session.
    pub async fn commit(&self) -> Result<(), PersistenceError> {
        let mut session = self.session().await?;
        session.commit().await
    }

    /// Roll back early. The end hook then only closes the session.
    pub async fn rollback(&self) -> Result<(), PersistenceError> {
        let mut session = self.session().await?;
        session.rollback().await
    }
}
