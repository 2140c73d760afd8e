//! Error types for model loading and translation

use std::fmt;
use thiserror::Error;
use translatador_platform::PlatformError;

pub type Result<T> = std::result::Result<T, TrlError>;

/// The kind of native resource an operation was attempted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Model,
    Batch,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => f.write_str("Model"),
            Self::Batch => f.write_str("Batch"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TrlError {
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Failed to load model: {0}")]
    ModelLoadError(String),

    #[error("Translation failed: {0}")]
    TranslationError(String),

    #[error("{0} has already been closed")]
    ResourceClosedError(ResourceKind),

    #[error("Platform not supported: {0}")]
    PlatformUnsupportedError(#[from] PlatformError),

    #[error("Failed to load library: {0}")]
    LibraryLoadError(String),

    #[error("FFI error: {0}")]
    FfiError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TrlError {
    /// Whether the error leaves nothing usable behind.
    ///
    /// Translation errors are local to the failing call and the model stays
    /// usable. Closed-resource errors are programmer defects and are not fatal
    /// to the process, but retrying them can never succeed either.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::TranslationError(_) | Self::ResourceClosedError(_)
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::ResourceClosedError(_))
    }
}
