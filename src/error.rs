use std::path::PathBuf;
use thiserror::Error;

use crate::input::ValidationError;

#[derive(Error, Debug)]
pub enum HahnemannError {
    #[error("Config directory not found at {0}. Run 'hahnemann init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting [pdf] {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Please enter both username and password.")]
    MissingCredentials,

    #[error("The identity provider returned an empty credential")]
    EmptyCredential,

    #[error("Please log in first.")]
    NotAuthenticated,

    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unterminated quote in '{0}'")]
    UnterminatedQuote(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Line {row}: {source}")]
    InvalidLine {
        row: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Invalid line format '{0}'. Expected 'name:quantity:price[:discount]' (e.g., 'Paracetamol:10:5.00:10')")]
    InvalidLineFormat(String),

    #[error("Failed to parse line file {path}: {source}")]
    LineFileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invoice has no row {row} (it has {count})")]
    RowNotFound { row: usize, count: usize },

    #[error("No invoice lines specified. Use --line <name>:<qty>:<price>[:<discount>] or --lines <file>.")]
    NoLines,

    #[error("Failed to load watermark from {source_name}: {reason}")]
    WatermarkLoad { source_name: String, reason: String },

    #[error("Timed out after {secs}s waiting for watermark from {source_name}")]
    WatermarkTimeout { source_name: String, secs: u64 },

    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HahnemannError>;
