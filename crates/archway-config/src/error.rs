use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(archway_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(archway_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists: {0}")]
    #[diagnostic(
        code(archway_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists(String),

    #[error("Missing default backend: {0}")]
    #[diagnostic(
        code(archway_config::missing_default_backend),
        help("Ensure the default_backend field references a configured backend")
    )]
    MissingDefaultBackend(String),

    #[error("Unknown backend: {0}")]
    #[diagnostic(
        code(archway_config::missing_backend),
        help("Add the backend to your configuration or use an existing one")
    )]
    MissingBackend(String),

    #[error("Duplicate backend name: {0}")]
    #[diagnostic(
        code(archway_config::duplicate_backend),
        help("Each backend must have a unique name")
    )]
    DuplicateBackendName(String),

    #[error("Backend '{backend}' is missing required field '{field}'")]
    #[diagnostic(
        code(archway_config::missing_field),
        help("ArchivesSpace needs host, user, password and repository; AtoM needs url and api_key; the Toolkit needs database")
    )]
    MissingField {
        backend: String,
        field: &'static str,
    },

    #[error("IO error: {0}")]
    #[diagnostic(code(archway_config::io))]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(archway_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(archway_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
