//! Error types for invoice rendering and printing

use thiserror::Error;

/// Printer error types
///
/// Image errors (`Decode`, `ImageUnavailable`) are recoverable: the document
/// is printed without the image. Everything transport-related is fatal for
/// the current render.
#[derive(Debug, Error)]
pub enum PrintError {
    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport rejected a write or close
    #[error("Write failed: {0}")]
    Write(String),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Source bitmap could not be decoded
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// Image source could not supply bytes
    #[error("Image unavailable: {0}")]
    ImageUnavailable(String),

    /// OS print spooler error
    #[error("Spooler error: {0}")]
    Spooler(String),
}

impl PrintError {
    /// Whether the document render may continue without the affected image
    pub fn is_recoverable_image_error(&self) -> bool {
        matches!(self, PrintError::Decode(_) | PrintError::ImageUnavailable(_))
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
