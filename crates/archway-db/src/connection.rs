//! Database connection management.

use std::path::Path;

use diesel::{Connection, SqliteConnection};
use tracing::debug;

use crate::error::Result;

/// Connection to an Archivists' Toolkit database.
///
/// The schema is owned by the Toolkit itself; no migrations are run.
pub struct DbConnection {
    conn: SqliteConnection,
}

impl DbConnection {
    /// Opens the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let conn = SqliteConnection::establish(&path_str)?;
        debug!(database = %path_str, "connected to Archivists' Toolkit database");
        Ok(Self { conn })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Gets a mutable reference to the underlying connection.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl std::ops::Deref for DbConnection {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl std::ops::DerefMut for DbConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}
