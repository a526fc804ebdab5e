//! Error types for the image model and tensor conversion.
//!
//! Every variant is a local, synchronous failure reported at the point of
//! violation. Nothing here is retried or recovered: the caller fixes the
//! input and calls again.
//!
//! # Usage
//!
//! ```rust
//! use exrio_core::{Error, Result};
//!
//! fn check_names(names: &[&str], layers: usize) -> Result<()> {
//!     if names.len() != layers {
//!         return Err(Error::arity_mismatch(layers, names.len()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_names(&["mask"], 2).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the image model and the pixel-tensor marshaller.
///
/// # Categories
///
/// - **Structure**: [`ShapeMismatch`](Error::ShapeMismatch),
///   [`SampleCountMismatch`](Error::SampleCountMismatch),
///   [`EmptyImage`](Error::EmptyImage)
/// - **Tensor options**: [`ArityMismatch`](Error::ArityMismatch),
///   [`UnsupportedDtype`](Error::UnsupportedDtype),
///   [`UnsupportedChannelCount`](Error::UnsupportedChannelCount)
/// - **Layer selection**: [`AmbiguousLayerReference`](Error::AmbiguousLayerReference)
#[derive(Debug, Error)]
pub enum Error {
    /// Layers or channels disagree on width, height or channel count.
    ///
    /// Returned when flattening an image to a tensor, when a channel of the
    /// wrong size is added to a layer, or when a tensor has an unusable rank.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape description
        expected: String,
        /// Actual shape description
        actual: String,
    },

    /// Number of supplied layer names differs from the tensor's leading dimension.
    #[error("arity mismatch: expected {expected} layer names, got {got}")]
    ArityMismatch {
        /// Leading tensor dimension
        expected: usize,
        /// Number of names supplied
        got: usize,
    },

    /// Tensor or buffer dtype outside float16/float32/uint32 (uint8 promotes).
    #[error("unsupported dtype: {dtype}")]
    UnsupportedDtype {
        /// Dtype name or description
        dtype: String,
    },

    /// Channel count outside {1, 3, 4} for tensor conversion.
    #[error("unsupported channel count: {count} (expected 1, 3 or 4)")]
    UnsupportedChannelCount {
        /// Channel count found
        count: usize,
    },

    /// An operation that needs exactly one layer got a multi-layer image.
    #[error("ambiguous layer reference: image has {layers} layers")]
    AmbiguousLayerReference {
        /// Number of layers in the image
        layers: usize,
    },

    /// Channel buffer length differs from `width * height`.
    #[error("channel `{channel}` holds {actual} samples, expected {expected}")]
    SampleCountMismatch {
        /// Channel name
        channel: String,
        /// `width * height`
        expected: usize,
        /// Buffer length
        actual: usize,
    },

    /// The image holds no layers.
    #[error("image has no layers")]
    EmptyImage,

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an [`Error::ShapeMismatch`] error.
    #[inline]
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an [`Error::ArityMismatch`] error.
    #[inline]
    pub fn arity_mismatch(expected: usize, got: usize) -> Self {
        Self::ArityMismatch { expected, got }
    }

    /// Creates an [`Error::UnsupportedDtype`] error.
    #[inline]
    pub fn unsupported_dtype(dtype: impl Into<String>) -> Self {
        Self::UnsupportedDtype {
            dtype: dtype.into(),
        }
    }

    /// Creates an [`Error::UnsupportedChannelCount`] error.
    #[inline]
    pub fn unsupported_channel_count(count: usize) -> Self {
        Self::UnsupportedChannelCount { count }
    }

    /// Creates an [`Error::AmbiguousLayerReference`] error.
    #[inline]
    pub fn ambiguous_layer(layers: usize) -> Self {
        Self::AmbiguousLayerReference { layers }
    }

    /// Creates an [`Error::SampleCountMismatch`] error.
    #[inline]
    pub fn sample_count(channel: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SampleCountMismatch {
            channel: channel.into(),
            expected,
            actual,
        }
    }

    /// Creates an [`Error::Other`] error.
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
