//! Error types for archway-db.

use archway_core::ArchiveError;
use miette::Diagnostic;
use thiserror::Error;

/// Database error type for archway-db operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Database connection failed: {0}")]
    #[diagnostic(
        code(archway_db::connection),
        help("Check that the configured database exists and is readable")
    )]
    ConnectionError(String),

    #[error("Database query failed: {0}")]
    #[diagnostic(code(archway_db::query))]
    QueryError(String),

    #[error("Record not found: {0}")]
    #[diagnostic(
        code(archway_db::not_found),
        help("Record IDs are the numeric row IDs of the Resources and ResourcesComponents tables")
    )]
    NotFound(String),
}

impl From<diesel::result::Error> for DbError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => DbError::NotFound("Record not found".to_string()),
            diesel::result::Error::DatabaseError(_, info) => {
                DbError::QueryError(info.message().to_string())
            }
            other => DbError::QueryError(other.to_string()),
        }
    }
}

impl From<diesel::result::ConnectionError> for DbError {
    fn from(err: diesel::result::ConnectionError) -> Self {
        DbError::ConnectionError(err.to_string())
    }
}

impl From<DbError> for ArchiveError {
    fn from(err: DbError) -> Self {
        ArchiveError::Database(err.to_string())
    }
}

/// Result type alias for archway-db operations.
pub type Result<T> = std::result::Result<T, DbError>;
