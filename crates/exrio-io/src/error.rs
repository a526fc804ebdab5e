//! Error types for EXR encode and decode.

use std::io;
use thiserror::Error;

/// Codec operation error.
///
/// Codec failures carry the underlying message verbatim. Model violations
/// found while encoding (an empty image, mis-sized channels) pass through as
/// [`IoError::Model`].
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed or unsupported EXR data.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// The image could not be written as EXR.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// An attribute key or value cannot be stored in an EXR header.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// The image violates a model invariant.
    #[error(transparent)]
    Model(#[from] exrio_core::Error),
}

/// Result type for codec operations.
pub type IoResult<T> = Result<T, IoError>;
