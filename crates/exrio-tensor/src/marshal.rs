//! Image <-> tensor conversion.
//!
//! Layout conventions:
//!
//! - single layer: `(height, width, channels)`
//! - N layers: `(N, height, width, channels)`, layers in stored order
//! - channel axis in stored channel order, never re-sorted
//!
//! A `(1, height, width, channels)` tensor therefore comes back from
//! [`to_pixels`] as `(height, width, channels)`.
//!
//! Only container bookkeeping happens here. Sample values are copied
//! bit for bit; no gamma, scaling or clamping is applied.

use crate::options::PixelOptions;
use crate::tensor::Tensor;
use exrio_core::{
    Chromaticities, Colorspace, Error, Image, Layer, Result, Sample, SampleType,
    COLORSPACE_ATTRIBUTE,
};
use half::f16;
use ndarray::{ArrayD, Axis};
use rayon::prelude::*;

/// Channel names assigned by position.
const CHANNEL_NAMES: [&str; 4] = ["R", "G", "B", "A"];

/// Flattens an image into one dense tensor.
///
/// Every layer must share width, height and channel count, and all channels
/// must share one sample type.
///
/// # Errors
///
/// - [`Error::EmptyImage`] for an image without layers
/// - [`Error::ShapeMismatch`] if layers disagree on size or channel count
/// - [`Error::UnsupportedDtype`] if channels mix sample types
/// - [`Error::UnsupportedChannelCount`] for layers without channels
///
/// # Example
///
/// ```rust
/// use exrio_core::{Image, Layer};
/// use exrio_tensor::to_pixels;
///
/// let layer = Layer::new(None, 2, 1)
///     .with_channel("R", vec![1.0f32, 2.0])?
///     .with_channel("G", vec![3.0f32, 4.0])?;
/// let tensor = to_pixels(&Image::from_layer(layer))?;
/// assert_eq!(tensor.shape(), &[1, 2, 2]);
/// # Ok::<(), exrio_core::Error>(())
/// ```
pub fn to_pixels(image: &Image) -> Result<Tensor> {
    let layers = image.layers();
    let first = layers.first().ok_or(Error::EmptyImage)?;
    let (width, height, channels) = (first.width(), first.height(), first.channel_count());

    if channels == 0 {
        return Err(Error::unsupported_channel_count(0));
    }

    for layer in layers {
        if (layer.width(), layer.height(), layer.channel_count()) != (width, height, channels) {
            return Err(Error::shape_mismatch(
                format!("{width}x{height}x{channels}"),
                format!(
                    "{}x{}x{} (layer {})",
                    layer.width(),
                    layer.height(),
                    layer.channel_count(),
                    layer.name().unwrap_or("<unnamed>")
                ),
            ));
        }
    }

    let sample_type = common_sample_type(layers)?;
    let mut shape = vec![height as usize, width as usize, channels];
    if layers.len() > 1 {
        shape.insert(0, layers.len());
    }

    tracing::debug!(
        layers = layers.len(),
        ?shape,
        dtype = sample_type.name(),
        "flattening image to tensor"
    );

    Ok(match sample_type {
        SampleType::F16 => Tensor::F16(stack::<f16>(layers, shape)?),
        SampleType::F32 => Tensor::F32(stack::<f32>(layers, shape)?),
        SampleType::U32 => Tensor::U32(stack::<u32>(layers, shape)?),
    })
}

fn common_sample_type(layers: &[Layer]) -> Result<SampleType> {
    let mut common = None;
    for layer in layers {
        let ty = layer.sample_type().ok_or_else(|| {
            Error::unsupported_dtype(format!(
                "mixed sample types in layer {}",
                layer.name().unwrap_or("<unnamed>")
            ))
        })?;
        match common {
            None => common = Some(ty),
            Some(c) if c != ty => {
                return Err(Error::unsupported_dtype(format!(
                    "layers mix {c} and {ty}"
                )));
            }
            Some(_) => {}
        }
    }
    common.ok_or(Error::EmptyImage)
}

/// Interleaves each layer's planes into `(H, W, C)` order and stacks them.
fn stack<T: Sample>(layers: &[Layer], shape: Vec<usize>) -> Result<ArrayD<T>> {
    let slabs = layers
        .par_iter()
        .map(interleave::<T>)
        .collect::<Result<Vec<Vec<T>>>>()?;
    let data: Vec<T> = slabs.into_iter().flatten().collect();
    ArrayD::from_shape_vec(shape, data).map_err(|e| Error::other(e.to_string()))
}

fn interleave<T: Sample>(layer: &Layer) -> Result<Vec<T>> {
    let planes = layer
        .channels()
        .iter()
        .map(|ch| {
            T::samples(ch.pixels()).ok_or_else(|| Error::unsupported_dtype(ch.sample_type().name()))
        })
        .collect::<Result<Vec<&[T]>>>()?;

    let pixels = layer.width() as usize * layer.height() as usize;
    let mut data = Vec::with_capacity(pixels * planes.len());
    for i in 0..pixels {
        data.extend(planes.iter().map(|plane| plane[i]));
    }
    tracing::trace!(layer = layer.name(), samples = data.len(), "interleaved layer");
    Ok(data)
}

/// Builds an image from a `(H, W, C)` or `(N, H, W, C)` tensor.
///
/// Produces one layer per leading slice, with channels named `R`, `G`, `B`,
/// `A` by position. `uint8` input is promoted to `uint32` first. Every layer
/// gets the chromaticities of `options.colorspace`; tags other than sRGB
/// are also stamped as [`COLORSPACE_ATTRIBUTE`] on the image.
///
/// # Errors
///
/// - [`Error::UnsupportedDtype`] for dtypes other than float16, float32,
///   uint32 and uint8
/// - [`Error::ShapeMismatch`] for ranks other than 3 and 4
/// - [`Error::UnsupportedChannelCount`] for `C` outside {1, 3, 4}
/// - [`Error::ArityMismatch`] if `layer_names` does not have `N` entries
///
/// # Example
///
/// ```rust
/// use exrio_tensor::{from_pixels, to_pixels, PixelOptions, Tensor};
/// use ndarray::Array4;
///
/// let tensor = Tensor::from(Array4::<f32>::zeros((2, 8, 8, 1)));
/// let opts = PixelOptions::new().with_layer_names(["mask", "depth"]);
/// let image = from_pixels(tensor.clone(), &opts)?;
///
/// assert_eq!(image.layers()[1].name(), Some("depth"));
/// assert_eq!(to_pixels(&image)?, tensor);
/// # Ok::<(), exrio_core::Error>(())
/// ```
pub fn from_pixels(tensor: impl Into<Tensor>, options: &PixelOptions) -> Result<Image> {
    let tensor = match tensor.into() {
        Tensor::U8(arr) => {
            tracing::debug!("promoting uint8 tensor to uint32");
            Tensor::U32(arr.mapv(u32::from))
        }
        other => other,
    };

    let chromaticities = options.colorspace.chromaticities();
    let layers = match &tensor {
        Tensor::F16(arr) => split::<f16>(arr, options, chromaticities)?,
        Tensor::F32(arr) => split::<f32>(arr, options, chromaticities)?,
        Tensor::U32(arr) => split::<u32>(arr, options, chromaticities)?,
        Tensor::U8(_) | Tensor::U16(_) | Tensor::I32(_) | Tensor::F64(_) => {
            return Err(Error::unsupported_dtype(tensor.dtype().name()));
        }
    };

    let mut image = Image::from_layers(layers);
    if options.colorspace.requires_flag() {
        image
            .attributes_mut()
            .insert(COLORSPACE_ATTRIBUTE.to_string(), options.colorspace.name().to_string());
    }

    tracing::debug!(
        layers = image.layer_count(),
        colorspace = options.colorspace.name(),
        linear = options.colorspace.is_linear(),
        "built image from tensor"
    );
    Ok(image)
}

/// [`from_pixels`] with default options (sRGB, unnamed layers).
pub fn from_pixels_default(tensor: impl Into<Tensor>) -> Result<Image> {
    from_pixels(tensor, &PixelOptions::default())
}

/// [`from_pixels`] tagging the result with `colorspace`.
pub fn from_pixels_in(tensor: impl Into<Tensor>, colorspace: Colorspace) -> Result<Image> {
    from_pixels(tensor, &PixelOptions::new().with_colorspace(colorspace))
}

fn split<T: Sample>(
    array: &ArrayD<T>,
    options: &PixelOptions,
    chromaticities: Option<Chromaticities>,
) -> Result<Vec<Layer>> {
    let view = match array.ndim() {
        3 => array.view().insert_axis(Axis(0)),
        4 => array.view(),
        _ => {
            return Err(Error::shape_mismatch(
                "(H, W, C) or (N, H, W, C)",
                format!("{:?}", array.shape()),
            ));
        }
    };

    let &[count, height, width, channels] = view.shape() else {
        return Err(Error::shape_mismatch("(N, H, W, C)", format!("{:?}", view.shape())));
    };

    if !matches!(channels, 1 | 3 | 4) {
        return Err(Error::unsupported_channel_count(channels));
    }

    let names = match &options.layer_names {
        Some(names) if names.len() != count => {
            return Err(Error::arity_mismatch(count, names.len()));
        }
        Some(names) => Some(names.as_slice()),
        None => None,
    };

    let to_u32 = |v: usize| {
        u32::try_from(v).map_err(|_| Error::shape_mismatch("dimension within u32", v.to_string()))
    };
    let (width, height) = (to_u32(width)?, to_u32(height)?);

    (0..count)
        .into_par_iter()
        .map(|n| {
            let slice = view.index_axis(Axis(0), n);
            let name = names.map(|names| names[n].as_str());
            let mut layer = Layer::new(name, width, height);
            for (c, channel_name) in CHANNEL_NAMES.iter().take(channels).enumerate() {
                let plane: Vec<T> = slice.index_axis(Axis(2), c).iter().copied().collect();
                layer = layer.with_channel(*channel_name, T::into_buffer(plane))?;
            }
            if let Some(chromaticities) = chromaticities {
                layer = layer.with_chromaticities(chromaticities);
            }
            Ok(layer)
        })
        .collect()
}
