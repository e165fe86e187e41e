//! Persistence ports: session factory, session, and persistable entities.
//!
//! These traits are the boundary between the unit-of-work lifecycle and the
//! storage technology. Implementations live in txscope-infra.
//! Uses RPITIT (native async fn in traits, Rust 2024 edition).

use std::future::Future;

use txscope_types::config::ResolvedUnit;
use txscope_types::error::{InitError, PersistenceError};
use txscope_types::transaction::TransactionStatus;
use uuid::Uuid;

/// Process-wide source of sessions, built once from a resolved persistence unit.
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session;

    /// Build the factory (connect the pool, apply the unit's schema).
    fn build(unit: &ResolvedUnit) -> impl Future<Output = Result<Self, InitError>> + Send
    where
        Self: Sized;

    /// Name of the persistence unit this factory serves.
    fn persistence_unit(&self) -> &str;

    /// Open a new session. The session has no transaction until `begin`.
    fn create_session(
        &self,
    ) -> impl Future<Output = Result<Self::Session, PersistenceError>> + Send;

    /// Release pooled resources. Sessions created afterwards fail.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// A persistence session holding at most one transaction.
pub trait Session: Send + 'static {
    /// Identifier used in log fields.
    fn id(&self) -> Uuid;

    fn status(&self) -> TransactionStatus;

    /// Begin a transaction. Fails if one is already active.
    fn begin(&mut self) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Mark the active transaction so that it can only be rolled back.
    fn set_rollback_only(&mut self) -> Result<(), PersistenceError>;

    /// Commit the active transaction. Fails with `RollbackOnly` when marked.
    fn commit(&mut self) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Roll back the active transaction.
    fn rollback(&mut self) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    /// Close the session, discarding any transaction still open.
    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;

    /// Write `entity` inside the active transaction.
    fn persist<E>(&mut self, entity: &E) -> impl Future<Output = Result<(), PersistenceError>> + Send
    where
        E: Persistable<Self>,
        Self: Sized,
    {
        entity.persist_in(self)
    }
}

/// An entity that knows how to write itself through a session of type `S`.
pub trait Persistable<S: Session>: Send + Sync {
    fn persist_in(&self, session: &mut S)
    -> impl Future<Output = Result<(), PersistenceError>> + Send;
}
