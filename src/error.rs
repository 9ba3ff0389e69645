use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AtlasError {
    #[error("config file not found: {0}")]
    #[diagnostic(help("pass an existing file to --config or omit the flag to use defaults"))]
    MissingConfig(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read dataset source {path}: {message}")]
    SourceRead { path: PathBuf, message: String },

    #[error("failed to parse dataset source: {0}")]
    SourceParse(String),

    #[error("dataset not found: {0}")]
    #[diagnostic(help("attribute nodes such as robot_*, env_* and fmt_* have no detail view"))]
    DatasetNotFound(String),

    #[error("dataset {0} has no URL")]
    MissingUrl(String),

    #[error("failed to open URL: {0}")]
    Navigation(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to encode output: {0}")]
    Output(String),
}
