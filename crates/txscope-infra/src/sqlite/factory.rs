//! Session factory over a SQLite persistence unit.

use std::sync::Arc;

use sqlx::sqlite::SqlitePool;
use txscope_core::session::SessionFactory;
use txscope_types::config::ResolvedUnit;
use txscope_types::error::{InitError, PersistenceError};

use super::pool::DatabasePool;
use super::session::SqliteSession;

/// Process-wide factory: immutable after construction, owns the pool.
pub struct SqliteSessionFactory {
    unit: Arc<str>,
    pool: DatabasePool,
}

impl SqliteSessionFactory {
    /// The underlying pool, for work outside any unit of work.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool.inner
    }
}

impl SessionFactory for SqliteSessionFactory {
    type Session = SqliteSession;

    async fn build(unit: &ResolvedUnit) -> Result<Self, InitError> {
        if unit.user.is_some() || unit.password.is_some() {
            tracing::debug!(
                unit = %unit.name,
                "sqlite has no authentication; user/password are ignored"
            );
        }

        let pool = DatabasePool::new(unit)
            .await
            .map_err(|e| InitError::Factory(e.to_string()))?;

        tracing::debug!(
            unit = %unit.name,
            max_connections = unit.max_connections,
            migrate = unit.migrate,
            "sqlite pool connected"
        );

        Ok(Self {
            unit: Arc::from(unit.name.as_str()),
            pool,
        })
    }

    fn persistence_unit(&self) -> &str {
        &self.unit
    }

    async fn create_session(&self) -> Result<SqliteSession, PersistenceError> {
        if self.pool.is_closed() {
            return Err(PersistenceError::Connection("session factory is closed".to_string()));
        }
        Ok(SqliteSession::new(Arc::clone(&self.unit), self.pool.inner.clone()))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use txscope_core::session::Session;
    use txscope_types::config::PersistenceUnitDef;

    use super::*;

    #[tokio::test]
    async fn test_build_reports_bad_url() {
        let def = PersistenceUnitDef::sqlite("notes", "sqlite:///nonexistent-dir/x/y.db?mode=ro");
        let err = SqliteSessionFactory::build(&ResolvedUnit::from_def(&def).unwrap())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, InitError::Factory(_)));
    }

    #[tokio::test]
    async fn test_sessions_are_distinct() {
        let def = PersistenceUnitDef::sqlite("notes", "sqlite::memory:");
        let factory = SqliteSessionFactory::build(&ResolvedUnit::from_def(&def).unwrap())
            .await
            .unwrap();

        let a = factory.create_session().await.unwrap();
        let b = factory.create_session().await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.persistence_unit(), "notes");
        assert_eq!(factory.persistence_unit(), "notes");
    }

    #[tokio::test]
    async fn test_closed_factory_refuses_sessions() {
        let def = PersistenceUnitDef::sqlite("notes", "sqlite::memory:");
        let factory = SqliteSessionFactory::build(&ResolvedUnit::from_def(&def).unwrap())
            .await
            .unwrap();

        factory.close().await;
        assert!(matches!(
            factory.create_session().await,
            Err(PersistenceError::Connection(_))
        ));
    }
}
