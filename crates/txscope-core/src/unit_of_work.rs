//! Request-scoped unit of work.
//!
//! `RequestScopedUnitOfWork` owns the process-wide session factory and drives
//! the per-request lifecycle:
//!
//! 1. `init`: build the factory from the plugin's application properties.
//! 2. `on_request_received`: discard any leaked session, then bind a fresh
//!    session with an open transaction to the request's context.
//! 3. `on_request_finally`: commit (or roll back if marked rollback-only),
//!    log and swallow failures, always close and unbind.

use tracing::{debug, error, info, warn};
use txscope_types::config::{AppProperties, PersistenceUnits, PluginConfig, ResolvedUnit};
use txscope_types::error::{InitError, PersistenceError};
use txscope_types::transaction::Completion;

use crate::context::UnitOfWorkContext;
use crate::session::{Session, SessionFactory};

/// Context type handed to application code for factory `F`.
pub type ContextOf<F> = UnitOfWorkContext<<F as SessionFactory>::Session>;

/// Binds one persistence session to one in-flight request.
pub struct RequestScopedUnitOfWork<F: SessionFactory> {
    name: String,
    factory: F,
    rollback_on_error: bool,
}

impl<F: SessionFactory> RequestScopedUnitOfWork<F> {
    /// Wrap an already-built factory.
    pub fn new(name: impl Into<String>, factory: F, rollback_on_error: bool) -> Self {
        Self {
            name: name.into(),
            factory,
            rollback_on_error,
        }
    }

    /// Host `init` hook: build the factory from application properties.
    ///
    /// Reads `plugin.<name>.config.*`, resolves the named persistence unit
    /// against `units`, and builds the factory. A missing or empty
    /// `persistenceUnit` fails before any connection is attempted.
    pub async fn init(
        name: &str,
        props: &AppProperties,
        units: &PersistenceUnits,
    ) -> Result<Self, InitError> {
        let config = PluginConfig::from_properties(name, props)?;
        Self::initialize(&config, units).await
    }

    /// Build the factory from already-extracted plugin settings.
    pub async fn initialize(
        config: &PluginConfig,
        units: &PersistenceUnits,
    ) -> Result<Self, InitError> {
        let unit = ResolvedUnit::resolve(config, units)?;
        let factory = F::build(&unit).await?;
        info!(
            plugin = %config.name,
            persistence_unit = %unit.name,
            "session factory initialized"
        );
        Ok(Self::new(config.name.clone(), factory, config.rollback_on_error))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Whether server errors should force a rollback.
    pub fn rollback_on_error(&self) -> bool {
        self.rollback_on_error
    }

    /// Host `onRequestReceived` hook.
    pub async fn on_request_received(&self, ctx: &ContextOf<F>) -> Result<(), PersistenceError> {
        self.on_request_start(ctx).await
    }

    /// Host `onRequestFinally` hook.
    pub async fn on_request_finally(&self, ctx: &ContextOf<F>) -> Option<Completion> {
        self.on_request_end(ctx).await
    }

    /// Bind a new session with an open transaction to `ctx`.
    ///
    /// A session already bound to the context is rolled back and closed
    /// first; it is never reused.
    pub async fn on_request_start(&self, ctx: &ContextOf<F>) -> Result<(), PersistenceError> {
        if let Some(leaked) = ctx.take().await {
            warn!(
                request_id = %ctx.request_id(),
                session_id = %leaked.id(),
                "discarding session leaked from a previous request"
            );
            discard(leaked).await;
        }

        let mut session = self.factory.create_session().await?;
        if let Err(e) = session.begin().await {
            session.close().await;
            return Err(e);
        }

        debug!(
            request_id = %ctx.request_id(),
            session_id = %session.id(),
            persistence_unit = %self.factory.persistence_unit(),
            "unit of work started"
        );

        if let Some(raced) = ctx.bind(session).await {
            discard(raced).await;
        }
        Ok(())
    }

    /// Resolve and release the session bound to `ctx`.
    ///
    /// Commits an active transaction unless it is rollback-only. Failures are
    /// logged, never propagated. The context is always left empty. Returns
    /// `None` when nothing was bound.
    pub async fn on_request_end(&self, ctx: &ContextOf<F>) -> Option<Completion> {
        let Some(mut session) = ctx.take().await else {
            debug!(request_id = %ctx.request_id(), "no unit of work bound at request end");
            return None;
        };

        let status = session.status();
        let completion = if !status.is_active() {
            Completion::AlreadyComplete
        } else if status.is_rollback_only() {
            match session.rollback().await {
                Ok(()) => Completion::RolledBack,
                Err(e) => {
                    error!(
                        request_id = %ctx.request_id(),
                        session_id = %session.id(),
                        persistence_unit = %self.factory.persistence_unit(),
                        error = %e,
                        "rollback failed at end of request"
                    );
                    Completion::Failed
                }
            }
        } else {
            match session.commit().await {
                Ok(()) => Completion::Committed,
                Err(e) => {
                    error!(
                        request_id = %ctx.request_id(),
                        session_id = %session.id(),
                        persistence_unit = %self.factory.persistence_unit(),
                        error = %e,
                        "commit failed at end of request"
                    );
                    Completion::Failed
                }
            }
        };

        debug!(
            request_id = %ctx.request_id(),
            session_id = %session.id(),
            ?completion,
            "unit of work finished"
        );
        session.close().await;
        Some(completion)
    }

    /// Mark the request's transaction rollback-only if `rollbackOnError` is set.
    ///
    /// Returns whether the transaction was marked.
    pub async fn on_request_failed(&self, ctx: &ContextOf<F>) -> bool {
        if !self.rollback_on_error {
            return false;
        }
        let Ok(mut session) = ctx.session().await else {
            return false;
        };
        if !session.status().is_active() {
            return false;
        }
        match session.set_rollback_only() {
            Ok(()) => true,
            Err(e) => {
                warn!(request_id = %ctx.request_id(), error = %e, "could not mark rollback-only");
                false
            }
        }
    }

    /// Release the factory's pooled resources.
    pub async fn shutdown(&self) {
        self.factory.close().await;
    }
}

/// Roll back (if needed) and close a session that must not be reused.
async fn discard<S: Session>(mut session: S) {
    if session.status().is_active() {
        if let Err(e) = session.rollback().await {
            warn!(session_id = %session.id(), error = %e, "rollback of discarded session failed");
        }
    }
    session.close().await;
}
