//! Connection pool for one persistence unit, in WAL mode.
//!
//! Every session of a unit draws its connection from this pool. File-backed
//! databases use WAL journal mode so readers do not block the writer. An
//! in-memory database exists per connection, so it is pinned to a single
//! connection that is never recycled.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use txscope_types::config::ResolvedUnit;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pooled connections for a persistence unit.
#[derive(Clone)]
pub struct DatabasePool {
    pub inner: SqlitePool,
}

impl DatabasePool {
    /// Connect the pool described by `unit`.
    ///
    /// Runs the embedded migrations first when the unit asks for them.
    pub async fn new(unit: &ResolvedUnit) -> Result<Self, sqlx::Error> {
        let in_memory = is_in_memory(&unit.url);

        let mut opts = SqliteConnectOptions::from_str(&unit.url)?
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);
        if !in_memory {
            opts = opts.journal_mode(SqliteJournalMode::Wal);
        }

        let mut pool_opts = SqlitePoolOptions::new().acquire_timeout(ACQUIRE_TIMEOUT);
        pool_opts = if in_memory {
            tracing::debug!(unit = %unit.name, "in-memory database, pinning pool to one connection");
            pool_opts
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_opts.max_connections(unit.max_connections)
        };

        let inner = pool_opts.connect_with(opts).await?;

        if unit.migrate {
            sqlx::migrate!("../../migrations").run(&inner).await?;
        }

        Ok(Self { inner })
    }

    pub async fn close(&self) {
        self.inner.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use txscope_types::config::PersistenceUnitDef;
    use txscope_types::config::{AppProperties, PersistenceUnits, PluginConfig};

    use super::*;

    fn unit(url: &str, migrate: bool) -> ResolvedUnit {
        let mut def = PersistenceUnitDef::sqlite("notes", url);
        def.migrate = migrate;
        let units = PersistenceUnits::new(vec![def]).unwrap();
        let props: AppProperties = [("plugin.jpa.config.persistenceUnit", "notes")]
            .into_iter()
            .collect();
        let plugin = PluginConfig::from_properties("jpa", &props).unwrap();
        ResolvedUnit::resolve(&plugin, &units).unwrap()
    }

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

        let pool = DatabasePool::new(&unit(&url, true)).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.inner)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert!(table_names.contains(&"notes"), "notes table missing");
    }

    #[tokio::test]
    async fn test_pool_skips_migrations_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("bare.db").display());

        let pool = DatabasePool::new(&unit(&url, false)).await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = 'notes'")
                .fetch_all(&pool.inner)
                .await
                .unwrap();
        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_pool_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("wal.db").display());

        let pool = DatabasePool::new(&unit(&url, true)).await.unwrap();

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.inner)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_pool_foreign_keys_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("fk.db").display());

        let pool = DatabasePool::new(&unit(&url, true)).await.unwrap();

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.inner)
            .await
            .unwrap();

        assert_eq!(result.0, 1, "foreign keys should be enabled");
    }

    #[tokio::test]
    async fn test_in_memory_pool_keeps_schema() {
        let pool = DatabasePool::new(&unit("sqlite::memory:", true)).await.unwrap();

        // A second acquire must see the same database.
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes")
            .fetch_one(&pool.inner)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file.db?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://notes.db?mode=rwc"));
    }
}
