use archway_core::BackendKind;
use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Port ArchivesSpace's backend API listens on by default.
pub const DEFAULT_ASPACE_PORT: u16 = 8089;

/// A named connection to one system of record.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct BackendConfig {
    /// Unique name used to select this backend.
    pub name: String,

    /// Kind of system: "archivesspace", "atom" or "toolkit".
    pub kind: BackendKind,

    /// ArchivesSpace host name, or a full URL (the port is then ignored).
    pub host: Option<String>,

    /// ArchivesSpace backend port.
    /// Default: 8089
    pub port: Option<u16>,

    /// ArchivesSpace user name.
    pub user: Option<String>,

    /// ArchivesSpace password.
    pub password: Option<String>,

    /// ArchivesSpace repository number.
    pub repository: Option<u32>,

    /// Base URL of the AtoM site.
    pub url: Option<String>,

    /// AtoM REST API key.
    pub api_key: Option<String>,

    /// Path to the Archivists' Toolkit database.
    pub database: Option<String>,
}

impl BackendConfig {
    fn empty(name: impl Into<String>, kind: BackendKind) -> Self {
        Self {
            name: name.into(),
            kind,
            host: None,
            port: None,
            user: None,
            password: None,
            repository: None,
            url: None,
            api_key: None,
            database: None,
        }
    }

    pub fn archivesspace(
        name: impl Into<String>,
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        repository: u32,
    ) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(DEFAULT_ASPACE_PORT),
            user: Some(user.into()),
            password: Some(password.into()),
            repository: Some(repository),
            ..Self::empty(name, BackendKind::ArchivesSpace)
        }
    }

    pub fn atom(name: impl Into<String>, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            api_key: Some(api_key.into()),
            ..Self::empty(name, BackendKind::Atom)
        }
    }

    pub fn toolkit(name: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            ..Self::empty(name, BackendKind::Toolkit)
        }
    }

    /// Checks that every field this backend's kind needs is present.
    pub fn validate(&self) -> Result<()> {
        let required: Vec<(&'static str, bool)> = match self.kind {
            BackendKind::ArchivesSpace => {
                vec![
                    ("host", is_set(&self.host)),
                    ("user", is_set(&self.user)),
                    ("password", self.password.is_some()),
                    ("repository", self.repository.is_some()),
                ]
            }
            BackendKind::Atom => {
                vec![("url", is_set(&self.url)), ("api_key", is_set(&self.api_key))]
            }
            BackendKind::Toolkit => vec![("database", is_set(&self.database))],
        };

        match required.into_iter().find(|(_, present)| !present) {
            Some((field, _)) => {
                Err(ConfigError::MissingField {
                    backend: self.name.clone(),
                    field,
                })
            }
            None => Ok(()),
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_ASPACE_PORT)
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_validate() {
        assert!(BackendConfig::archivesspace("aspace", "localhost", "admin", "admin", 2)
            .validate()
            .is_ok());
        assert!(BackendConfig::atom("atom", "http://atom.example", "key")
            .validate()
            .is_ok());
        assert!(BackendConfig::toolkit("at", "/tmp/at.db").validate().is_ok());
    }

    #[test]
    fn test_missing_field() {
        let mut backend = BackendConfig::atom("atom", "http://atom.example", "");
        let err = backend.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "api_key",
                ..
            }
        ));

        backend.kind = BackendKind::Toolkit;
        assert!(matches!(
            backend.validate(),
            Err(ConfigError::MissingField {
                field: "database",
                ..
            })
        ));
    }

    #[test]
    fn test_default_port() {
        let mut backend = BackendConfig::archivesspace("aspace", "localhost", "admin", "admin", 2);
        backend.port = None;
        assert_eq!(backend.port(), 8089);
    }
}
