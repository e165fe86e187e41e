//! SQLite persistence provider.
//!
//! A persistence unit maps to one `DatabasePool` (WAL mode, foreign keys,
//! busy timeout). `SqliteSessionFactory` hands out `SqliteSession`s, each of
//! which owns a pooled connection inside a `sqlx::Transaction` while active.

pub mod factory;
pub mod note;
pub mod pool;
pub mod session;

pub use factory::SqliteSessionFactory;
pub use session::SqliteSession;

use txscope_types::error::PersistenceError;

/// Map a sqlx error into the storage-agnostic error type.
pub(crate) fn map_sqlx(e: sqlx::Error) -> PersistenceError {
    match e {
        sqlx::Error::RowNotFound => PersistenceError::NotFound,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PersistenceError::Connection(e.to_string())
        }
        other => PersistenceError::Query(other.to_string()),
    }
}
