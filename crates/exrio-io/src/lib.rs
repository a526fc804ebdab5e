//! # exrio-io
//!
//! OpenEXR encode and decode for the exrio image model.
//!
//! This crate is the boundary between EXR bytes and [`exrio_core::Image`].
//! Besides moving samples it keeps the model's guarantees intact across the
//! file format:
//!
//! - the caller's channel order, although EXR stores channels sorted by name
//! - image attributes, although EXR only has per-header attributes
//! - one set of chromaticities per file, handed to every decoded layer
//!
//! ## Quick Start
//!
//! ```rust
//! use exrio_core::{Colorspace, Image, Layer};
//!
//! let layer = Layer::new(Some("beauty"), 2, 2)
//!     .with_channel("R", vec![0.0f32; 4])?
//!     .with_channel("G", vec![0.0f32; 4])?
//!     .with_channel("B", vec![0.0f32; 4])?;
//! let image = Image::from_layer(layer).with_attribute("artist", "jane");
//!
//! let bytes = exrio_io::encode(&image)?;
//! let decoded = exrio_io::decode(&bytes)?;
//!
//! assert_eq!(decoded.attributes().get("artist").map(String::as_str), Some("jane"));
//! assert_eq!(decoded.colorspace(), Colorspace::Unknown);
//! # Ok::<(), exrio_io::IoError>(())
//! ```
//!
//! ## Configured codecs
//!
//! [`ExrReader`] and [`ExrWriter`] implement [`ImageReader`] and
//! [`ImageWriter`] for layer selection, compression and threading control.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod attributes;
pub mod error;
pub mod exr;
mod order;
pub mod traits;

pub use crate::error::{IoError, IoResult};
pub use crate::exr::{decode, encode, read, write, Compression, ExrReader, ExrWriter};
pub use crate::traits::{ImageReader, ImageWriter};
