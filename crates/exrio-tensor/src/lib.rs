//! # exrio-tensor
//!
//! Converts between layered [`Image`](exrio_core::Image)s and dense pixel
//! tensors backed by [`ndarray`].
//!
//! - [`to_pixels`] - image -> `(H, W, C)` or `(N, H, W, C)` tensor
//! - [`from_pixels`] - tensor -> image, with [`PixelOptions`] for colorspace
//!   tagging and layer names
//!
//! For every tensor `T` of shape `(H, W, C)` or `(N, H, W, C)` with
//! `C` in {1, 3, 4} and dtype float16, float32 or uint32:
//!
//! ```text
//! to_pixels(from_pixels(T)) == T
//! ```
//!
//! # Example
//!
//! ```rust
//! use exrio_core::Colorspace;
//! use exrio_tensor::{from_pixels_in, to_pixels};
//! use ndarray::Array3;
//!
//! let pixels = Array3::<f32>::from_elem((64, 64, 3), 0.18);
//! let image = from_pixels_in(pixels.clone(), Colorspace::AcesCg)?;
//! assert_eq!(image.colorspace(), Colorspace::AcesCg);
//! assert_eq!(to_pixels(&image)?.as_f32(), Some(&pixels.into_dyn()));
//! # Ok::<(), exrio_core::Error>(())
//! ```
//!
//! # Parallelism
//!
//! Layers are split and stacked on the rayon pool. Output order always
//! equals stored order.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod marshal;
mod options;
mod tensor;

pub use marshal::{from_pixels, from_pixels_default, from_pixels_in, to_pixels};
pub use options::PixelOptions;
pub use tensor::{Dtype, Tensor};
