// ABOUTME: Error types for the deck-slides application
// ABOUTME: Provides structured error handling for extraction, templates and PPTX output

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Template error in {path}: {message}")]
    TemplateError { path: PathBuf, message: String },

    #[error("Presentation is missing a required part: {0}")]
    MissingPart(String),

    #[error("PPTX generation error: {0}")]
    PptxError(String),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<zip::result::ZipError> for DeckError {
    fn from(err: zip::result::ZipError) -> Self {
        DeckError::PptxError(format!("ZIP operation failed: {}", err))
    }
}

impl From<quick_xml::Error> for DeckError {
    fn from(err: quick_xml::Error) -> Self {
        DeckError::XmlError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
