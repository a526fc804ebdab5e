//! Sample types and channel pixel storage.
//!
//! OpenEXR channels hold one of three sample types. This module models that
//! closed set as a tagged buffer so every conversion boundary matches on it
//! exhaustively:
//!
//! - [`SampleType`] - the dtype tag (`f16`, `f32`, `u32`)
//! - [`PixelBuffer`] - owned samples of one channel
//! - [`Sample`] - trait implemented by the three element types
//!
//! # Example
//!
//! ```rust
//! use exrio_core::{PixelBuffer, SampleType};
//!
//! let buf = PixelBuffer::from(vec![0.0f32; 4]);
//! assert_eq!(buf.sample_type(), SampleType::F32);
//! assert_eq!(buf.len(), 4);
//! ```

use half::f16;
use std::fmt;

/// Numeric type of the samples in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// 16-bit float
    F16,
    /// 32-bit float
    F32,
    /// 32-bit unsigned integer
    U32,
}

impl SampleType {
    /// Dtype name, numpy style.
    pub const fn name(self) -> &'static str {
        match self {
            SampleType::F16 => "float16",
            SampleType::F32 => "float32",
            SampleType::U32 => "uint32",
        }
    }

    /// Size of one sample in bytes.
    pub const fn size_bytes(self) -> usize {
        match self {
            SampleType::F16 => 2,
            SampleType::F32 | SampleType::U32 => 4,
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Samples of one channel, row-major, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    /// Half-float samples.
    F16(Vec<f16>),
    /// Float samples.
    F32(Vec<f32>),
    /// Unsigned integer samples.
    U32(Vec<u32>),
}

impl PixelBuffer {
    /// Allocates `len` zero samples of the given type.
    pub fn zeros(sample_type: SampleType, len: usize) -> Self {
        match sample_type {
            SampleType::F16 => PixelBuffer::F16(vec![f16::ZERO; len]),
            SampleType::F32 => PixelBuffer::F32(vec![0.0; len]),
            SampleType::U32 => PixelBuffer::U32(vec![0; len]),
        }
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::F16(v) => v.len(),
            PixelBuffer::F32(v) => v.len(),
            PixelBuffer::U32(v) => v.len(),
        }
    }

    /// Returns `true` if the buffer holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dtype tag of the buffer.
    #[inline]
    pub fn sample_type(&self) -> SampleType {
        match self {
            PixelBuffer::F16(_) => SampleType::F16,
            PixelBuffer::F32(_) => SampleType::F32,
            PixelBuffer::U32(_) => SampleType::U32,
        }
    }

    /// Half-float samples, if that is the stored type.
    pub fn as_f16(&self) -> Option<&[f16]> {
        f16::samples(self)
    }

    /// Float samples, if that is the stored type.
    pub fn as_f32(&self) -> Option<&[f32]> {
        f32::samples(self)
    }

    /// Integer samples, if that is the stored type.
    pub fn as_u32(&self) -> Option<&[u32]> {
        u32::samples(self)
    }

    /// Converts every sample to `f32`.
    ///
    /// Lossy for large `u32` values; meant for previews and statistics, not
    /// for round trips.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            PixelBuffer::F16(v) => v.iter().map(|s| s.to_f32()).collect(),
            PixelBuffer::F32(v) => v.clone(),
            PixelBuffer::U32(v) => v.iter().map(|&s| s as f32).collect(),
        }
    }
}

/// Element type storable in a [`PixelBuffer`].
///
/// Lets generic code borrow typed slices out of a buffer and wrap typed
/// vectors back into one without matching on the variant itself.
pub trait Sample: Copy + Send + Sync + PartialEq + fmt::Debug + 'static {
    /// Dtype tag of this element type.
    const TYPE: SampleType;

    /// Borrows the samples if `buffer` stores this type.
    fn samples(buffer: &PixelBuffer) -> Option<&[Self]>;

    /// Wraps owned samples into a buffer.
    fn into_buffer(samples: Vec<Self>) -> PixelBuffer;
}

impl Sample for f16 {
    const TYPE: SampleType = SampleType::F16;

    #[inline]
    fn samples(buffer: &PixelBuffer) -> Option<&[Self]> {
        match buffer {
            PixelBuffer::F16(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    fn into_buffer(samples: Vec<Self>) -> PixelBuffer {
        PixelBuffer::F16(samples)
    }
}

impl Sample for f32 {
    const TYPE: SampleType = SampleType::F32;

    #[inline]
    fn samples(buffer: &PixelBuffer) -> Option<&[Self]> {
        match buffer {
            PixelBuffer::F32(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    fn into_buffer(samples: Vec<Self>) -> PixelBuffer {
        PixelBuffer::F32(samples)
    }
}

impl Sample for u32 {
    const TYPE: SampleType = SampleType::U32;

    #[inline]
    fn samples(buffer: &PixelBuffer) -> Option<&[Self]> {
        match buffer {
            PixelBuffer::U32(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    fn into_buffer(samples: Vec<Self>) -> PixelBuffer {
        PixelBuffer::U32(samples)
    }
}

impl<T: Sample> From<Vec<T>> for PixelBuffer {
    fn from(samples: Vec<T>) -> Self {
        T::into_buffer(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let buf = PixelBuffer::zeros(SampleType::F16, 6);
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.sample_type(), SampleType::F16);
        assert!(buf.as_f16().is_some_and(|s| s.iter().all(|v| *v == f16::ZERO)));
        assert!(buf.as_f32().is_none());
    }

    #[test]
    fn test_typed_access() {
        let buf = PixelBuffer::from(vec![1u32, 2, 3]);
        assert_eq!(buf.as_u32(), Some(&[1u32, 2, 3][..]));
        assert_eq!(buf.to_f32_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sample_type_names() {
        assert_eq!(SampleType::F16.name(), "float16");
        assert_eq!(SampleType::U32.to_string(), "uint32");
        assert_eq!(SampleType::F16.size_bytes(), 2);
        assert_eq!(SampleType::F32.size_bytes(), 4);
    }

    #[test]
    fn test_half_preview() {
        let buf = PixelBuffer::from(vec![f16::from_f32(0.1), f16::from_f32(2.5)]);
        let preview = buf.to_f32_vec();
        approx::assert_abs_diff_eq!(preview[0], 0.1, epsilon = 1e-3);
        approx::assert_relative_eq!(preview[1], 2.5);
    }

    #[test]
    fn test_empty() {
        assert!(PixelBuffer::F32(Vec::new()).is_empty());
        assert!(!PixelBuffer::zeros(SampleType::U32, 1).is_empty());
    }
}
