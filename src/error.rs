//! Error types shared across the scanner.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading and parsing a source file.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse file: {path}")]
    ParseError { path: String },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Tree-sitter language initialization failed")]
    LanguageInit,
}

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors raised while loading a scan configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Root directory does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// A detector failed while inspecting a node.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("{detector}: unexpected node shape at {line}:{column}")]
    UnexpectedShape {
        detector: String,
        line: usize,
        column: usize,
    },

    #[error("{detector}: {message}")]
    Other { detector: String, message: String },
}

/// A scan could not start.
#[derive(Error, Debug)]
pub enum ScanSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
