//! Application state wiring the persistence plugin into the host.
//!
//! The unit-of-work lifecycle is generic over the session factory; AppState
//! pins it to the SQLite implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use txscope_core::context::UnitOfWorkContext;
use txscope_core::unit_of_work::RequestScopedUnitOfWork;
use txscope_infra::config::{load_app_properties, load_persistence_units};
use txscope_infra::sqlite::{SqliteSession, SqliteSessionFactory};

/// Unit-of-work lifecycle pinned to SQLite.
pub type ConcreteUnitOfWork = RequestScopedUnitOfWork<SqliteSessionFactory>;

/// Per-request context type stored in request extensions.
pub type RequestUnitOfWork = UnitOfWorkContext<SqliteSession>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub uow: Arc<ConcreteUnitOfWork>,
    pub started_at: Instant,
}

impl AppState {
    /// Load both config files and run the plugin's `init` hook.
    ///
    /// Fails (aborting startup) if either file cannot be read or the plugin
    /// cannot build its session factory.
    pub async fn init(config_path: &Path, units_path: &Path, plugin: &str) -> anyhow::Result<Self> {
        let props = load_app_properties(config_path)
            .await
            .context("loading application properties")?;
        let units = load_persistence_units(units_path)
            .await
            .context("loading persistence units")?;

        let uow = ConcreteUnitOfWork::init(plugin, &props, &units)
            .await
            .with_context(|| format!("initializing persistence plugin '{plugin}'"))?;

        Ok(Self::from_unit_of_work(uow))
    }

    pub fn from_unit_of_work(uow: ConcreteUnitOfWork) -> Self {
        Self {
            uow: Arc::new(uow),
            started_at: Instant::now(),
        }
    }
}
