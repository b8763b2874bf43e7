//! Error types for epc-ingest
//!
//! Errors split into two severities. Fatal errors (unreadable input, a store
//! that cannot be reached) abort the run. Everything else is scoped to one
//! record: the orchestrator records it in the migration report and moves on.

use thiserror::Error;

/// Ingest error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// Input file missing, unreadable or not JSON (fatal)
    #[error("Input error: {0}")]
    Input(String),

    /// Persistence layer unreachable or misconfigured (fatal)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Entity-level write failure (record-scoped)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid configuration (fatal)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// epc-common error
    #[error("Common error: {0}")]
    Common(epc_common::Error),
}

impl IngestError {
    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IngestError::Persistence(_))
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        classify_sqlx(err)
    }
}

impl From<epc_common::Error> for IngestError {
    fn from(err: epc_common::Error) -> Self {
        match err {
            epc_common::Error::Database(db_err) => classify_sqlx(db_err),
            epc_common::Error::Config(msg) => IngestError::Config(msg),
            other => IngestError::Common(other),
        }
    }
}

/// Separate connection-level failures from entity-level ones
///
/// Connection-level: the pool or driver cannot talk to the database at all,
/// or the database file itself refuses writes (read-only, full, corrupt, I/O
/// failure). Entity-level: the database answered but rejected this statement
/// (constraint violation, trigger abort, missing row, decode mismatch).
pub fn classify_sqlx(err: sqlx::Error) -> IngestError {
    match err {
        sqlx::Error::Database(ref db_err) if is_store_failure(db_err.code().as_deref()) => {
            IngestError::StoreUnavailable(err.to_string())
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::Configuration(_) => IngestError::StoreUnavailable(err.to_string()),
        other => IngestError::Persistence(other.to_string()),
    }
}

/// SQLite primary result codes that mean the store as a whole is unusable
const STORE_FAILURE_CODES: &[i32] = &[
    8,  // SQLITE_READONLY
    10, // SQLITE_IOERR
    11, // SQLITE_CORRUPT
    13, // SQLITE_FULL
    14, // SQLITE_CANTOPEN
    26, // SQLITE_NOTADB
];

/// Extended codes carry the primary code in their low byte
fn is_store_failure(code: Option<&str>) -> bool {
    code.and_then(|code| code.parse::<i32>().ok())
        .map(|code| STORE_FAILURE_CODES.contains(&(code & 0xff)))
        .unwrap_or(false)
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_fatal() {
        assert!(classify_sqlx(sqlx::Error::PoolClosed).is_fatal());
        assert!(classify_sqlx(sqlx::Error::PoolTimedOut).is_fatal());
    }

    #[test]
    fn test_row_errors_are_record_scoped() {
        let err = classify_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(err, IngestError::Persistence(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_store_failure_codes() {
        assert!(is_store_failure(Some("8")));
        // SQLITE_READONLY_DBMOVED
        assert!(is_store_failure(Some("1032")));
        assert!(is_store_failure(Some("13")));
        // SQLITE_CONSTRAINT_UNIQUE
        assert!(!is_store_failure(Some("2067")));
        // SQLITE_BUSY is retried, not fatal
        assert!(!is_store_failure(Some("5")));
        assert!(!is_store_failure(None));
    }

    #[test]
    fn test_common_config_error_maps_to_config() {
        let err: IngestError = epc_common::Error::Config("bad".to_string()).into();
        assert!(matches!(err, IngestError::Config(_)));
        assert!(err.is_fatal());
    }
}
