use archway_config::ConfigError;
use archway_core::ArchiveError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to serialize output: {0}")]
    #[diagnostic(code(archway::output))]
    Output(#[from] serde_json::Error),
}

pub type CliResult<T> = std::result::Result<T, CliError>;
