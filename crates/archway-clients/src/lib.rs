//! Backend adapters implementing [`ArchiveClient`].
//!
//! [`connect`] turns a configured backend into a ready client: it logs in to
//! ArchivesSpace, prepares the AtoM API key session or opens the Toolkit
//! database.

use std::time::Duration;

use archway_config::BackendConfig;
use archway_core::{ArchiveClient, ArchiveError, BackendKind, Result};
use archway_http::{resolve_base_url, ClientConfig, UreqTransport};
use tracing::debug;

pub mod archivesspace;
pub mod atom;
mod json;
pub mod toolkit;


pub use archivesspace::ArchivesSpaceClient;
pub use atom::AtomClient;
pub use toolkit::ToolkitClient;

/// Recorded as creator of rows written to a Toolkit database when the
/// backend names no user.
const DEFAULT_TOOLKIT_USER: &str = "archway";

fn required<'a>(backend: &'a BackendConfig, value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value.as_deref().ok_or_else(|| {
        ArchiveError::InvalidInput(format!(
            "Backend '{}' is missing required field '{field}'",
            backend.name
        ))
    })
}

/// Opens a client for `backend`. REST requests time out after `timeout`.
pub fn connect(backend: &BackendConfig, timeout: Duration) -> Result<Box<dyn ArchiveClient>> {
    backend
        .validate()
        .map_err(|err| ArchiveError::InvalidInput(err.to_string()))?;
    debug!(backend = %backend.name, kind = %backend.kind, "connecting");

    let transport = || Box::new(UreqTransport::new(&ClientConfig::with_timeout(timeout)));

    match backend.kind {
        BackendKind::ArchivesSpace => {
            let host = required(backend, &backend.host, "host")?;
            let base_url = resolve_base_url(host, Some(backend.port()))?;
            let repository = backend.repository.ok_or_else(|| {
                ArchiveError::InvalidInput(format!(
                    "Backend '{}' is missing required field 'repository'",
                    backend.name
                ))
            })?;
            let client = ArchivesSpaceClient::login(
                &base_url,
                required(backend, &backend.user, "user")?,
                required(backend, &backend.password, "password")?,
                repository,
                transport(),
            )?;
            Ok(Box::new(client))
        }
        BackendKind::Atom => {
            let client = AtomClient::new(
                required(backend, &backend.url, "url")?,
                required(backend, &backend.api_key, "api_key")?,
                transport(),
            )?;
            Ok(Box::new(client))
        }
        BackendKind::Toolkit => {
            let user = backend.user.as_deref().unwrap_or(DEFAULT_TOOLKIT_USER);
            let client = ToolkitClient::open(required(backend, &backend.database, "database")?, user)?;
            Ok(Box::new(client))
        }
    }
}
