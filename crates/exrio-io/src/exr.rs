//! OpenEXR encode and decode.
//!
//! Converts between the layered [`Image`] model and EXR files through the
//! [`exr`] crate.
//!
//! # What survives a round trip
//!
//! - layer names, order and sizes
//! - channel names, sample types and the caller's channel order
//! - image and layer attributes as strings, including standard EXR
//!   attributes such as `renderingTransform`, `pixel_aspect` and the time
//!   code (see [`attributes`](crate::attributes))
//! - chromaticities, shared by all layers of a file
//!
//! Only lossless [`Compression`] modes are offered, so samples come back
//! bit for bit.
//!
//! # Example
//!
//! ```rust
//! use exrio_core::{Image, Layer};
//! use exrio_io::exr::{decode, encode};
//!
//! let layer = Layer::new(Some("beauty"), 2, 2)
//!     .with_channel("R", vec![0.0f32; 4])?
//!     .with_channel("G", vec![0.0f32; 4])?
//!     .with_channel("B", vec![0.0f32; 4])?;
//! let image = Image::from_layer(layer).with_attribute("artist", "jane");
//!
//! let decoded = decode(&encode(&image)?)?;
//! assert_eq!(decoded.single_layer()?.channel_names(), vec!["R", "G", "B"]);
//! # Ok::<(), exrio_io::IoError>(())
//! ```

use crate::attributes;
use crate::order;
use crate::{ImageReader, ImageWriter, IoError, IoResult};
use exr::image::write::WritableImage;
use exr::image::{AnyChannel, AnyChannels, Encoding, FlatSamples};
use exr::math::Vec2;
use exr::meta::attribute::{Chromaticities as ExrChromaticities, IntegerBounds};
use exr::meta::header::ImageAttributes;
use exr::prelude::{ReadChannels, ReadLayers};
use exrio_core::{Channel, Chromaticities, Image, Layer, PixelBuffer};
use std::io::Cursor;
use std::path::Path;

type ExrLayer = exr::image::Layer<AnyChannels<FlatSamples>>;

/// Reads an EXR file with default settings.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    ExrReader::new().read(path)
}

/// Writes an EXR file with default settings.
pub fn write<P: AsRef<Path>>(path: P, image: &Image) -> IoResult<()> {
    ExrWriter::new().write(path, image)
}

/// Decodes EXR bytes with default settings.
pub fn decode(data: &[u8]) -> IoResult<Image> {
    ExrReader::new().read_from_memory(data)
}

/// Encodes an image to EXR bytes with default settings.
pub fn encode(image: &Image) -> IoResult<Vec<u8>> {
    ExrWriter::new().write_to_memory(image)
}

// ============================================================================
// Compression
// ============================================================================

/// EXR compression method. Lossless modes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// No compression.
    None,
    /// Run-length encoding.
    Rle,
    /// ZIP, one scanline per block.
    Zips,
    /// ZIP, 16 scanlines per block.
    #[default]
    Zip,
    /// PIZ wavelet compression (good for noisy images).
    Piz,
}

impl Compression {
    fn to_exr(self) -> exr::compression::Compression {
        use exr::compression::Compression as C;
        match self {
            Compression::None => C::Uncompressed,
            Compression::Rle => C::RLE,
            Compression::Zips => C::ZIP1,
            Compression::Zip => C::ZIP16,
            Compression::Piz => C::PIZ,
        }
    }
}

// ============================================================================
// ExrReader
// ============================================================================

/// EXR decoder.
///
/// # Example
///
/// ```rust,no_run
/// use exrio_io::{ExrReader, ImageReader};
///
/// let reader = ExrReader::new().with_layer("depth").pedantic(true);
/// let image = reader.read("render.exr")?;
/// assert_eq!(image.layer_count(), 1);
/// # Ok::<(), exrio_io::IoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExrReader {
    layer: Option<String>,
    pedantic: bool,
    parallel: bool,
}

impl ExrReader {
    /// Creates a reader that returns every layer.
    pub fn new() -> Self {
        Self {
            layer: None,
            pedantic: false,
            parallel: true,
        }
    }

    /// Returns only the layer with this name.
    pub fn with_layer(mut self, name: impl Into<String>) -> Self {
        self.layer = Some(name.into());
        self
    }

    /// Rejects files with minor format violations instead of tolerating them.
    pub fn pedantic(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }

    /// Decompresses blocks on multiple threads. Default on.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn decode_impl(&self, data: &[u8]) -> IoResult<Image> {
        let mut reader = exr::image::read::read()
            .no_deep_data()
            .largest_resolution_level()
            .all_channels()
            .all_layers()
            .all_attributes();
        if self.pedantic {
            reader = reader.pedantic();
        }
        if !self.parallel {
            reader = reader.non_parallel();
        }

        let raw = reader
            .from_buffered(Cursor::new(data))
            .map_err(|e| IoError::DecodeError(e.to_string()))?;

        let chromaticities = raw.attributes.chromaticities.as_ref().map(from_exr_chromaticities);
        let image_attributes =
            attributes::decode_image(&raw.attributes, raw.layer_data.first().map(|l| &l.attributes));

        let mut layers = Vec::with_capacity(raw.layer_data.len());
        for layer in raw.layer_data {
            if let Some(wanted) = &self.layer {
                let name = layer.attributes.layer_name.as_ref().map(attributes::string);
                if name.as_deref() != Some(wanted.as_str()) {
                    continue;
                }
            }
            layers.push(decode_layer(layer, chromaticities)?);
        }

        if layers.is_empty() {
            return Err(IoError::DecodeError(match &self.layer {
                Some(name) => format!("no layer named `{name}`"),
                None => "file contains no layers".into(),
            }));
        }

        tracing::debug!(
            layers = layers.len(),
            bytes = data.len(),
            chromaticities = chromaticities.is_some(),
            "decoded EXR"
        );
        Ok(Image::from_layers(layers).with_attributes(image_attributes))
    }
}

impl Default for ExrReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ExrReader {
    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<Image> {
        let data = std::fs::read(path.as_ref())?;
        self.decode_impl(&data)
    }

    fn read_from_memory(&self, data: &[u8]) -> IoResult<Image> {
        self.decode_impl(data)
    }
}

fn decode_layer(layer: ExrLayer, chromaticities: Option<Chromaticities>) -> IoResult<Layer> {
    let dimension = |v: usize| {
        u32::try_from(v).map_err(|_| IoError::DecodeError(format!("layer dimension {v} exceeds u32")))
    };
    let (width, height) = (dimension(layer.size.0)?, dimension(layer.size.1)?);
    let name = layer.attributes.layer_name.as_ref().map(attributes::string);
    let (layer_attributes, record) = attributes::decode_layer(&layer.attributes);

    let stored: Vec<String> = layer
        .channel_data
        .list
        .iter()
        .map(|c| attributes::string(&c.name))
        .collect();
    let order = order::restore(&stored, record.as_deref());

    let mut slots: Vec<Option<AnyChannel<FlatSamples>>> =
        layer.channel_data.list.into_iter().map(Some).collect();

    let mut out = Layer::new(name.as_deref(), width, height).with_attributes(layer_attributes);
    for index in order {
        let Some(channel) = slots.get_mut(index).and_then(Option::take) else {
            continue;
        };
        if channel.sampling != Vec2(1, 1) {
            return Err(IoError::DecodeError(format!(
                "channel `{}` is subsampled, which is not supported",
                attributes::string(&channel.name)
            )));
        }
        let pixels = match channel.sample_data {
            FlatSamples::F16(v) => PixelBuffer::F16(v),
            FlatSamples::F32(v) => PixelBuffer::F32(v),
            FlatSamples::U32(v) => PixelBuffer::U32(v),
        };
        out.push_channel(Channel::new(attributes::string(&channel.name), width, height, pixels)?)?;
    }
    out.set_chromaticities(chromaticities);

    tracing::trace!(
        layer = out.name(),
        channels = ?out.channel_names(),
        "decoded layer"
    );
    Ok(out)
}

// ============================================================================
// ExrWriter
// ============================================================================

/// EXR encoder.
///
/// # Example
///
/// ```rust,no_run
/// use exrio_core::Image;
/// use exrio_io::{Compression, ExrWriter, ImageWriter};
///
/// # fn run(image: &Image) -> exrio_io::IoResult<()> {
/// let writer = ExrWriter::new().with_compression(Compression::Piz);
/// writer.write("out.exr", image)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ExrWriter {
    compression: Compression,
    parallel: bool,
}

impl ExrWriter {
    /// Creates a writer with ZIP compression.
    pub fn new() -> Self {
        Self {
            compression: Compression::default(),
            parallel: true,
        }
    }

    /// Sets the compression method.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Compresses blocks on multiple threads. Default on.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Compression in use.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    fn encode_impl(&self, image: &Image) -> IoResult<Vec<u8>> {
        image.validate()?;

        let chromaticities = shared_chromaticities(image)?;
        let multi = image.layer_count() > 1;
        let encoding = Encoding {
            compression: self.compression.to_exr(),
            ..Encoding::UNCOMPRESSED
        };

        let layers = image
            .layers()
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                let name = match layer.name() {
                    Some(name) => Some(name.to_string()),
                    None if multi => Some(format!("layer{index}")),
                    None => None,
                };
                encode_layer(layer, name.as_deref(), encoding.clone())
            })
            .collect::<IoResult<Vec<ExrLayer>>>()?;

        let display = layers.iter().fold(Vec2(0, 0), |acc, layer| {
            Vec2(acc.0.max(layer.size.0), acc.1.max(layer.size.1))
        });
        let mut shared = ImageAttributes::new(IntegerBounds::from_dimensions(display));
        shared.chromaticities = chromaticities.map(to_exr_chromaticities);
        attributes::encode_image(image.attributes(), &mut shared)?;

        let raw = exr::image::Image::from_layers(shared, layers);
        let mut buffer = Vec::new();
        let writer = raw.write();
        let writer = if self.parallel { writer } else { writer.non_parallel() };
        writer
            .to_buffered(Cursor::new(&mut buffer))
            .map_err(|e| IoError::EncodeError(e.to_string()))?;

        tracing::debug!(
            layers = image.layer_count(),
            bytes = buffer.len(),
            compression = ?self.compression,
            "encoded EXR"
        );
        Ok(buffer)
    }
}

impl Default for ExrWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ExrWriter {
    fn write<P: AsRef<Path>>(&self, path: P, image: &Image) -> IoResult<()> {
        let data = self.encode_impl(image)?;
        std::fs::write(path.as_ref(), data)?;
        Ok(())
    }

    fn write_to_memory(&self, image: &Image) -> IoResult<Vec<u8>> {
        self.encode_impl(image)
    }
}

fn encode_layer(layer: &Layer, name: Option<&str>, encoding: Encoding) -> IoResult<ExrLayer> {
    let order = layer.channel_names();
    let layer_attributes = attributes::encode_layer(name, layer.attributes(), &order)?;

    let channels = layer
        .channels()
        .iter()
        .map(|channel| {
            let samples = match channel.pixels() {
                PixelBuffer::F16(v) => FlatSamples::F16(v.clone()),
                PixelBuffer::F32(v) => FlatSamples::F32(v.clone()),
                PixelBuffer::U32(v) => FlatSamples::U32(v.clone()),
            };
            Ok(AnyChannel::new(attributes::text("channel", channel.name())?, samples))
        })
        .collect::<IoResult<Vec<_>>>()?;

    tracing::trace!(layer = name, channels = ?order, "encoding layer");
    Ok(exr::image::Layer::new(
        (layer.width() as usize, layer.height() as usize),
        layer_attributes,
        encoding,
        AnyChannels::sort(channels.into()),
    ))
}

/// The one set of chromaticities all layers agree on, if any layer has one.
fn shared_chromaticities(image: &Image) -> IoResult<Option<Chromaticities>> {
    let mut shared: Option<Chromaticities> = None;
    for layer in image.layers() {
        match (shared, layer.chromaticities()) {
            (None, Some(c)) => shared = Some(*c),
            (Some(s), Some(c)) if !s.matches(c) => {
                return Err(IoError::EncodeError(format!(
                    "layer {} has chromaticities {:?}, other layers have {:?}; EXR stores one set per file",
                    layer.name().unwrap_or("<unnamed>"),
                    c,
                    s
                )));
            }
            _ => {}
        }
    }
    Ok(shared)
}

fn to_exr_chromaticities(c: Chromaticities) -> ExrChromaticities {
    let v = |(x, y): (f32, f32)| Vec2(x, y);
    ExrChromaticities {
        red: v(c.red),
        green: v(c.green),
        blue: v(c.blue),
        white: v(c.white),
    }
}

fn from_exr_chromaticities(c: &ExrChromaticities) -> Chromaticities {
    Chromaticities::new(
        (c.red.0, c.red.1),
        (c.green.0, c.green.1),
        (c.blue.0, c.blue.1),
        (c.white.0, c.white.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use exrio_core::{Colorspace, COLORSPACE_ATTRIBUTE};
    use exrio_primaries::{AP0, SRGB};
    use half::f16;

    fn rgb(name: Option<&str>, w: u32, h: u32) -> Layer {
        let n = (w * h) as usize;
        Layer::new(name, w, h)
            .with_channel("R", (0..n).map(|i| i as f32).collect::<Vec<_>>())
            .and_then(|l| l.with_channel("G", vec![0.5f32; n]))
            .and_then(|l| l.with_channel("B", vec![1.0f32; n]))
            .expect("rgb layer")
    }

    #[test]
    fn test_roundtrip_keeps_channel_order() {
        let image = Image::from_layer(rgb(Some("beauty"), 4, 3));
        let decoded = decode(&encode(&image).unwrap()).unwrap();

        let layer = decoded.single_layer().unwrap();
        assert_eq!(layer.name(), Some("beauty"));
        assert_eq!(layer.channel_names(), vec!["R", "G", "B"]);
        assert_eq!(layer.channels(), image.layers()[0].channels());
    }

    #[test]
    fn test_every_compression_is_lossless() {
        let layer = Layer::new(None, 8, 8)
            .with_channel("Y", (0..64).map(|i| f16::from_f32(i as f32 / 7.0)).collect::<Vec<_>>())
            .and_then(|l| l.with_channel("id", (0..64u32).map(|i| i * 977).collect::<Vec<_>>()))
            .unwrap();
        let image = Image::from_layer(layer);

        for compression in [
            Compression::None,
            Compression::Rle,
            Compression::Zips,
            Compression::Zip,
            Compression::Piz,
        ] {
            let writer = ExrWriter::new().with_compression(compression).parallel(false);
            let bytes = writer.write_to_memory(&image).unwrap();
            let decoded = ExrReader::new().parallel(false).read_from_memory(&bytes).unwrap();
            assert_eq!(decoded.layers()[0].channels(), image.layers()[0].channels(), "{compression:?}");
        }
    }

    #[test]
    fn test_unnamed_layers_get_index_names() {
        let image = Image::from_layers([rgb(None, 2, 2), rgb(Some("specular"), 2, 2)]);
        let decoded = decode(&encode(&image).unwrap()).unwrap();
        let names: Vec<_> = decoded.layers().iter().map(Layer::name).collect();
        assert_eq!(names, vec![Some("layer0"), Some("specular")]);
    }

    #[test]
    fn test_chromaticities_shared() {
        let image = Image::from_layers([
            rgb(Some("a"), 2, 2).with_chromaticities(AP0),
            rgb(Some("b"), 2, 2),
        ]);
        let decoded = decode(&encode(&image).unwrap()).unwrap();
        assert!(decoded.layers().iter().all(|l| l.chromaticities() == Some(&AP0)));
        assert_eq!(decoded.colorspace(), Colorspace::Aces2065_1);

        let conflicting = Image::from_layers([
            rgb(Some("a"), 2, 2).with_chromaticities(AP0),
            rgb(Some("b"), 2, 2).with_chromaticities(SRGB),
        ]);
        assert!(matches!(encode(&conflicting), Err(IoError::EncodeError(_))));
    }

    #[test]
    fn test_flag_survives() {
        let image = Image::from_layer(rgb(None, 2, 2).with_chromaticities(exrio_primaries::AP1))
            .with_attribute(COLORSPACE_ATTRIBUTE, "ACEScct");
        let decoded = decode(&encode(&image).unwrap()).unwrap();
        assert_eq!(decoded.attributes(), image.attributes());
        assert_eq!(decoded.colorspace(), Colorspace::AcesCct);
    }

    #[test]
    fn test_select_layer() {
        let image = Image::from_layers([rgb(Some("diffuse"), 2, 2), rgb(Some("specular"), 3, 1)]);
        let bytes = encode(&image).unwrap();

        let only = ExrReader::new().with_layer("specular").read_from_memory(&bytes).unwrap();
        assert_eq!(only.layer_count(), 1);
        assert_eq!(only.layers()[0].width(), 3);

        assert!(matches!(
            ExrReader::new().with_layer("nope").read_from_memory(&bytes),
            Err(IoError::DecodeError(_))
        ));
    }

    #[test]
    fn test_empty_image_rejected() {
        assert!(matches!(
            encode(&Image::new()),
            Err(IoError::Model(exrio_core::Error::EmptyImage))
        ));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(decode(b"not an exr file"), Err(IoError::DecodeError(_))));
    }
}
