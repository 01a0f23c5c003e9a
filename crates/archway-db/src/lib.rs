//! Access to an Archivists' Toolkit database.

pub mod connection;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::DbConnection;
pub use error::{DbError, Result};
pub use models::note_type_name;
pub use repository::{
    IdentifierMatch, NewDigitalObject, RecordChanges, RecordKey, ResourceFilter,
    ToolkitRepository,
};
