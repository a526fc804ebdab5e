//! Reader and writer traits.
//!
//! Implemented by [`ExrReader`](crate::ExrReader) and
//! [`ExrWriter`](crate::ExrWriter) so callers can hold a configured codec
//! and reuse it across files.

use crate::IoResult;
use exrio_core::Image;
use std::path::Path;

/// Decodes [`Image`]s from files or byte buffers.
///
/// # Example
///
/// ```rust,no_run
/// use exrio_io::{ExrReader, ImageReader};
///
/// let reader = ExrReader::new().with_layer("beauty");
/// let image = reader.read("render.exr")?;
/// println!("{} layer(s)", image.layer_count());
/// # Ok::<(), exrio_io::IoError>(())
/// ```
pub trait ImageReader {
    /// Reads an image from a file path.
    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<Image>;

    /// Reads an image from memory.
    fn read_from_memory(&self, data: &[u8]) -> IoResult<Image>;
}

/// Encodes [`Image`]s to files or byte buffers.
pub trait ImageWriter {
    /// Writes an image to a file path.
    fn write<P: AsRef<Path>>(&self, path: P, image: &Image) -> IoResult<()>;

    /// Writes an image to memory.
    fn write_to_memory(&self, image: &Image) -> IoResult<Vec<u8>>;
}
