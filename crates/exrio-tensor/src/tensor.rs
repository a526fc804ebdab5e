//! Dynamically typed dense tensors.
//!
//! [`Tensor`] wraps an [`ndarray::ArrayD`] of one of the element types a
//! caller may hand in, the way a numpy array carries its dtype at runtime.
//! Only some dtypes are accepted for image conversion; the rest exist so the
//! rejection is an explicit [`UnsupportedDtype`](exrio_core::Error::UnsupportedDtype)
//! instead of a type error at the call site.

use half::f16;
use ndarray::{Array, ArrayD, Dimension};
use std::fmt;

/// Element type of a [`Tensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `f16`
    F16,
    /// `f32`
    F32,
    /// `f64`
    F64,
}

impl Dtype {
    /// Numpy-style name.
    pub const fn name(self) -> &'static str {
        match self {
            Dtype::U8 => "uint8",
            Dtype::U16 => "uint16",
            Dtype::I32 => "int32",
            Dtype::U32 => "uint32",
            Dtype::F16 => "float16",
            Dtype::F32 => "float32",
            Dtype::F64 => "float64",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dense n-dimensional array with a runtime dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    /// `u8` elements
    U8(ArrayD<u8>),
    /// `u16` elements
    U16(ArrayD<u16>),
    /// `i32` elements
    I32(ArrayD<i32>),
    /// `u32` elements
    U32(ArrayD<u32>),
    /// `f16` elements
    F16(ArrayD<f16>),
    /// `f32` elements
    F32(ArrayD<f32>),
    /// `f64` elements
    F64(ArrayD<f64>),
}

macro_rules! dispatch {
    ($tensor:expr, $arr:ident => $body:expr) => {
        match $tensor {
            Tensor::U8($arr) => $body,
            Tensor::U16($arr) => $body,
            Tensor::I32($arr) => $body,
            Tensor::U32($arr) => $body,
            Tensor::F16($arr) => $body,
            Tensor::F32($arr) => $body,
            Tensor::F64($arr) => $body,
        }
    };
}

impl Tensor {
    /// Element type.
    pub fn dtype(&self) -> Dtype {
        match self {
            Tensor::U8(_) => Dtype::U8,
            Tensor::U16(_) => Dtype::U16,
            Tensor::I32(_) => Dtype::I32,
            Tensor::U32(_) => Dtype::U32,
            Tensor::F16(_) => Dtype::F16,
            Tensor::F32(_) => Dtype::F32,
            Tensor::F64(_) => Dtype::F64,
        }
    }

    /// Axis lengths.
    pub fn shape(&self) -> &[usize] {
        dispatch!(self, arr => arr.shape())
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        dispatch!(self, arr => arr.ndim())
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        dispatch!(self, arr => arr.len())
    }

    /// Returns `true` if any axis has length zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `f16` array, if that is the dtype.
    pub fn as_f16(&self) -> Option<&ArrayD<f16>> {
        match self {
            Tensor::F16(arr) => Some(arr),
            _ => None,
        }
    }

    /// The `f32` array, if that is the dtype.
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            Tensor::F32(arr) => Some(arr),
            _ => None,
        }
    }

    /// The `u32` array, if that is the dtype.
    pub fn as_u32(&self) -> Option<&ArrayD<u32>> {
        match self {
            Tensor::U32(arr) => Some(arr),
            _ => None,
        }
    }
}

macro_rules! impl_from_array {
    ($($elem:ty => $variant:ident),* $(,)?) => {
        $(
            impl<D: Dimension> From<Array<$elem, D>> for Tensor {
                fn from(array: Array<$elem, D>) -> Self {
                    Tensor::$variant(array.into_dyn())
                }
            }
        )*
    };
}

impl_from_array!(
    u8 => U8,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    f16 => F16,
    f32 => F32,
    f64 => F64,
);
