//! # Database & Engine Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                │
//! │                                                                     │
//! │  SQLite Error (sqlx::Error)                                        │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  DbError (this module) ← Adds context and categorization            │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  EngineError (this module) ← What engine callers match on:          │
//! │       │                      business rejection / transient         │
//! │       │                      conflict / infrastructure failure      │
//! │       ▼                                                             │
//! │  Collaborator maps to its wire format (409 / 400 / 500, ...)        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use barman_core::CoreError;

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
///
/// These wrap sqlx errors and provide additional context for debugging and
/// caller feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    #[error("Duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A concurrent writer got there first.
    ///
    /// ## When This Occurs
    /// - SQLite reports busy/locked at the write boundary
    /// - A guarded decrement matched zero rows because the snapshot moved
    ///
    /// The batch engine rolls back and retries validation once on this.
    #[error("Write conflict: {0}")]
    WriteConflict(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound          → DbError::NotFound
/// sqlx::Error::Database (busy)      → DbError::WriteConflict
/// sqlx::Error::Database (UNIQUE)    → DbError::UniqueViolation
/// sqlx::Error::Database (FK)        → DbError::ForeignKeyViolation
/// sqlx::Error::PoolTimedOut         → DbError::PoolExhausted
/// Other                             → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                // SQLite constraint and contention messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "database is locked" / "database is busy"
                if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::WriteConflict(msg)
                } else if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation { message: msg }
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Engine Error
// =============================================================================

/// What callers of the sale engine see.
///
/// Business rejections carry the exact remediation data the caller needs
/// (available stock, required tab limit); a `Conflict` is surfaced only
/// after the engine has already retried validation once on its own.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule rejected the operation; all ledgers are untouched.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// Concurrent write conflict persisted across the automatic retry.
    /// Transient: the caller may resubmit the identical request.
    #[error("Concurrent write conflict, please retry")]
    Conflict,

    /// Infrastructure failure.
    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::WriteConflict(_) => EngineError::Conflict,
            other => EngineError::Db(other),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::from(DbError::from(err))
    }
}

impl EngineError {
    /// Whether this failure is transient and worth a caller-side retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Conflict)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
