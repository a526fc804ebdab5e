//! # exrio-core
//!
//! Layered image model for OpenEXR data.
//!
//! This crate provides the value types every other exrio crate works on:
//!
//! - [`Image`], [`Layer`], [`Channel`] - the layer/channel container
//! - [`PixelBuffer`], [`SampleType`] - per-channel storage over `f16`, `f32`, `u32`
//! - [`Attributes`] - string metadata on images and layers
//! - [`Colorspace`] and [`classify`] - colorspace inference from metadata
//!
//! ## Crate Structure
//!
//! ```text
//! exrio-primaries (chromaticity table)
//!    ^
//!    |
//! exrio-core (this crate)
//!    ^
//!    |
//!    +-- exrio-tensor (image <-> ndarray tensors)
//!    +-- exrio-io (EXR encode/decode)
//! ```
//!
//! All types are plain values. Nothing here performs I/O or holds shared
//! state; images are built fresh per decode or per tensor conversion.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod colorspace;
pub mod error;
pub mod image;
pub mod pixel;

pub use colorspace::{classify, classify_layer, Colorspace, ACES_CONTAINER_FLAG, COLORSPACE_ATTRIBUTE};
pub use error::{Error, Result};
pub use image::{Attributes, Channel, Image, Layer};
pub use pixel::{PixelBuffer, Sample, SampleType};

pub use exrio_primaries::Chromaticities;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use exrio_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colorspace::{Colorspace, COLORSPACE_ATTRIBUTE};
    pub use crate::error::{Error, Result};
    pub use crate::image::{Attributes, Channel, Image, Layer};
    pub use crate::pixel::{PixelBuffer, SampleType};
    pub use exrio_primaries::Chromaticities;
}
