//! Transaction status as seen by application code.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of the transaction held by a session.
///
/// A session's transaction is either absent or active; `RollbackOnly` is an
/// active transaction that the end-of-request hook must roll back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// No transaction (never begun, or already committed / rolled back).
    Absent,
    /// Active and eligible for commit.
    Active,
    /// Active but marked so that it can only be rolled back.
    RollbackOnly,
}

impl TransactionStatus {
    /// Whether a transaction is in progress (including rollback-only).
    pub fn is_active(self) -> bool {
        matches!(self, TransactionStatus::Active | TransactionStatus::RollbackOnly)
    }

    /// Whether the transaction has been marked rollback-only.
    pub fn is_rollback_only(self) -> bool {
        self == TransactionStatus::RollbackOnly
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Absent => write!(f, "absent"),
            TransactionStatus::Active => write!(f, "active"),
            TransactionStatus::RollbackOnly => write!(f, "rollback_only"),
        }
    }
}

/// How the end-of-request hook resolved a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    Committed,
    RolledBack,
    /// The transaction was already finished by application code.
    AlreadyComplete,
    /// Commit or rollback failed; the error was logged and the session closed.
    Failed,
}

impl Completion {
    pub fn as_str(self) -> &'static str {
        match self {
            Completion::Committed => "committed",
            Completion::RolledBack => "rolled_back",
            Completion::AlreadyComplete => "already_complete",
            Completion::Failed => "failed",
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_only_counts_as_active() {
        assert!(TransactionStatus::RollbackOnly.is_active());
        assert!(TransactionStatus::Active.is_active());
        assert!(!TransactionStatus::Absent.is_active());
        assert!(TransactionStatus::RollbackOnly.is_rollback_only());
        assert!(!TransactionStatus::Active.is_rollback_only());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TransactionStatus::RollbackOnly).unwrap();
        assert_eq!(json, "\"rollback_only\"");
        assert_eq!(TransactionStatus::RollbackOnly.to_string(), "rollback_only");
    }
}
