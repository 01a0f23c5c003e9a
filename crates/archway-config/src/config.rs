use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::{debug, info};

use crate::{
    annotations::{annotate_first_table, annotate_table},
    backend::BackendConfig,
    error::{ConfigError, Result},
};

/// Request timeout applied when the configuration sets none, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// archway configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Name of the backend used when none is selected on the command line.
    pub default_backend: String,

    /// Timeout for every request sent to a REST backend, in seconds.
    /// Default: 120
    pub timeout: Option<u64>,

    /// Configured backends.
    pub backends: Vec<BackendConfig>,
}

/// Location of the configuration file: `$ARCHWAY_CONFIG`, else
/// `$XDG_CONFIG_HOME/archway/config.toml`.
pub fn default_config_path() -> PathBuf {
    match std::env::var("ARCHWAY_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("archway").join("config.toml"),
    }
}

fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_default()
                .join(".config")
        })
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            default_backend: "aspace".to_string(),
            timeout: Some(DEFAULT_TIMEOUT_SECS),
            backends: vec![BackendConfig::archivesspace(
                "aspace",
                "localhost",
                "admin",
                "admin",
                2,
            )],
        }
    }

    /// Loads the configuration from [`default_config_path`], falling back to
    /// the default configuration when no file exists.
    pub fn new() -> Result<Self> {
        Self::load(default_config_path())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!("loaded configuration from {}", path.display());
                toml::from_str(&content)?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no configuration at {}, using defaults", path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;
        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        self.timeout.get_or_insert(DEFAULT_TIMEOUT_SECS);

        let mut seen = HashSet::new();
        for backend in &self.backends {
            if !seen.insert(backend.name.as_str()) {
                return Err(ConfigError::DuplicateBackendName(backend.name.clone()));
            }
            backend.validate()?;
        }

        if !seen.contains(self.default_backend.as_str()) {
            return Err(ConfigError::MissingDefaultBackend(
                self.default_backend.clone(),
            ));
        }

        Ok(())
    }

    /// The backend called `name`, or the default backend.
    pub fn backend(&self, name: Option<&str>) -> Result<&BackendConfig> {
        let name = name.unwrap_or(&self.default_backend);
        self.backends
            .iter()
            .find(|backend| backend.name == name)
            .ok_or_else(|| ConfigError::MissingBackend(name.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(backends) = doc
            .get_mut("backends")
            .and_then(|item| item.as_array_of_tables_mut())
        {
            annotate_first_table::<BackendConfig>(backends)?;
        }

        Ok(doc)
    }
}

/// Writes the default configuration, with its documentation as comments, to `path`.
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists(
            path.display().to_string(),
        ));
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use archway_core::BackendKind;
    use serial_test::serial;
    use tempfile::TempDir;

    use super::*;
    use crate::test_utils::with_env;

    const SAMPLE: &str = r#"
default_backend = "atom"
timeout = 30

[[backends]]
name = "aspace"
kind = "archivesspace"
host = "https://aspace.example.org"
user = "admin"
password = "secret"
repository = 2

[[backends]]
name = "atom"
kind = "atom"
url = "http://atom.example.org"
api_key = "abc123"

[[backends]]
name = "legacy"
kind = "toolkit"
database = "/srv/at.db"
"#;

    #[test]
    fn test_default_config() {
        let mut config = Config::default_config();
        assert!(config.resolve().is_ok());
        let backend = config.backend(None).unwrap();
        assert_eq!(backend.kind, BackendKind::ArchivesSpace);
        assert_eq!(backend.port(), 8089);
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backends.len(), 3);
        assert_eq!(config.backend(None).unwrap().kind, BackendKind::Atom);
        assert_eq!(
            config.backend(Some("legacy")).unwrap().database.as_deref(),
            Some("/srv/at.db")
        );
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(matches!(
            config.backend(Some("dspace")),
            Err(ConfigError::MissingBackend(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, {
            let mut default = Config::default_config();
            default.resolve().unwrap();
            default
        });
    }

    #[test]
    fn test_resolve_missing_default_backend() {
        let mut config = Config::default_config();
        config.default_backend = "nonexistent".to_string();
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::MissingDefaultBackend(_))
        ));
    }

    #[test]
    fn test_resolve_duplicate_backend() {
        let mut config = Config::default_config();
        config.backends.push(BackendConfig::toolkit("aspace", "/tmp/at.db"));
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::DuplicateBackendName(name)) if name == "aspace"
        ));
    }

    #[test]
    fn test_resolve_sets_timeout() {
        let mut config = Config::default_config();
        config.timeout = None;
        config.resolve().unwrap();
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_generate_default_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archway").join("config.toml");

        generate_default_config(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# Timeout for every request"));
        assert!(Config::load(&path).is_ok());

        assert!(matches!(
            generate_default_config(&path),
            Err(ConfigError::ConfigAlreadyExists(_))
        ));
    }

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        with_env(vec![("ARCHWAY_CONFIG", Some("/custom/archway.toml"))], || {
            assert_eq!(default_config_path(), PathBuf::from("/custom/archway.toml"));
        });
    }

    #[test]
    #[serial]
    fn test_config_path_xdg() {
        with_env(
            vec![
                ("ARCHWAY_CONFIG", None),
                ("XDG_CONFIG_HOME", Some("/xdg/config")),
            ],
            || {
                assert_eq!(
                    default_config_path(),
                    PathBuf::from("/xdg/config/archway/config.toml")
                );
            },
        );
    }
}
