//! Error types for the docstitch library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the docstitch library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// An input could not be parsed as a PDF
    #[error("Malformed document {name}: {source}")]
    MalformedDocument {
        name: String,
        #[source]
        source: lopdf::Error,
    },

    /// Document merge needs at least two inputs
    #[error("At least 2 PDF documents are required to merge, got {0}")]
    NotEnoughDocuments(usize),

    /// None of the supplied images could be decoded
    #[error("No readable images to merge")]
    NoImages,

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No files found matching pattern: {0}")]
    NoFilesMatched(String),

    /// General error
    #[error("{0}")]
    General(String),
}
