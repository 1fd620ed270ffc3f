use thiserror::Error;

use crate::subtitle::{ParseError, ValidationError};

#[derive(Error, Debug)]
pub enum SrtkitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed subtitle file: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid subtitle file: {0}")]
    Validation(#[from] ValidationError),

    #[error("External tool error: {0}")]
    ExternalTool(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, SrtkitError>;
