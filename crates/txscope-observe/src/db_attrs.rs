//! OpenTelemetry database semantic convention values.
//!
//! Session spans (`db.transaction`, `db.persist`) carry the fields
//! `db.system`, `db.operation.name`, `db.namespace` (the persistence unit) and
//! `db.session.id`. Field names are literals in the span macros; this module
//! holds the values recorded in them.

/// Value for `db.system`.
pub const SYSTEM_SQLITE: &str = "sqlite";

// --- Operation name values ---

pub const OP_BEGIN: &str = "begin";
pub const OP_COMMIT: &str = "commit";
pub const OP_ROLLBACK: &str = "rollback";
pub const OP_PERSIST: &str = "persist";
