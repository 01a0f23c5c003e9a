//! Error types for archway.
//!
//! Every backend surfaces failures through [`ArchiveError`] so that callers can
//! handle remote problems without knowing which system of record is in play.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by archive clients.
#[derive(Error, Diagnostic, Debug)]
pub enum ArchiveError {
    #[error("Unable to connect to {url}: {message}")]
    #[diagnostic(
        code(archway::connection),
        help("Check that the server is running and reachable from this machine")
    )]
    Connection { url: String, message: String },

    #[error("Authentication failed: {0}")]
    #[diagnostic(
        code(archway::authentication),
        help("Verify the configured user name, password or API key")
    )]
    Authentication(String),

    #[error("Server responded with status code {status} (URL: {url})")]
    #[diagnostic(code(archway::communication))]
    Communication {
        status: u16,
        url: String,
        body: String,
    },

    #[error("{0}")]
    #[diagnostic(code(archway::backend))]
    Backend(String),

    #[error("{0}")]
    #[diagnostic(code(archway::invalid_input))]
    InvalidInput(String),

    #[error("{backend} does not support {operation}")]
    #[diagnostic(
        code(archway::unsupported),
        help("This operation is only available on some backends")
    )]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("Database operation failed: {0}")]
    #[diagnostic(code(archway::database))]
    Database(String),

    #[error(transparent)]
    #[diagnostic(code(archway::json))]
    Json(#[from] serde_json::Error),

    #[error("Session has been closed")]
    #[diagnostic(
        code(archway::session_closed),
        help("Create a new client to open another session")
    )]
    SessionClosed,
}

impl ArchiveError {
    pub fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Self::Unsupported {
            backend,
            operation,
        }
    }

    /// HTTP status carried by a [`ArchiveError::Communication`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Communication {
                status, ..
            } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// A specialized Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArchiveError::Communication {
            status: 404,
            url: "http://localhost:8089/repositories/2/resources/1".to_string(),
            body: "{}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Server responded with status code 404 (URL: http://localhost:8089/repositories/2/resources/1)"
        );
        assert_eq!(err.status(), Some(404));

        let err = ArchiveError::unsupported("Archivist's Toolkit", "delete_record");
        assert_eq!(
            err.to_string(),
            "Archivist's Toolkit does not support delete_record"
        );
        assert!(err.is_unsupported());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: ArchiveError = parse.unwrap_err().into();
        assert!(matches!(err, ArchiveError::Json(_)));
    }
}
