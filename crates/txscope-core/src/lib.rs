//! Request-scoped unit-of-work lifecycle for txscope.
//!
//! This crate defines the persistence ports (`SessionFactory`, `Session`,
//! `Persistable`) that the infrastructure layer implements, plus the
//! storage-agnostic lifecycle that binds one session to one request. It
//! depends only on `txscope-types` -- never on `txscope-infra` or any
//! database crate.

pub mod context;
pub mod session;
pub mod unit_of_work;

pub use context::{SessionGuard, UnitOfWorkContext};
pub use session::{Persistable, Session, SessionFactory};
pub use unit_of_work::{ContextOf, RequestScopedUnitOfWork};
