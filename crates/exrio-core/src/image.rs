//! Layered image model: [`Image`] -> [`Layer`] -> [`Channel`].
//!
//! An [`Image`] is an ordered list of layers plus free-form string
//! attributes. Each [`Layer`] groups equally sized channels and may carry
//! its own attributes and chromaticities. A [`Channel`] is one named plane
//! of samples.
//!
//! # Ordering
//!
//! Channel order inside a layer and layer order inside an image are both
//! significant and are kept exactly as constructed. `[R, G, B]` stays
//! `[R, G, B]`; it is never re-sorted.
//!
//! # Usage
//!
//! ```rust
//! use exrio_core::{Colorspace, Image, Layer};
//!
//! let layer = Layer::new(Some("beauty"), 2, 2)
//!     .with_channel("R", vec![0.0f32; 4])?
//!     .with_channel("G", vec![0.0f32; 4])?
//!     .with_channel("B", vec![0.0f32; 4])?;
//!
//! let image = Image::from_layer(layer).with_attribute("artist", "jane");
//! assert_eq!(image.single_layer()?.channel_names(), vec!["R", "G", "B"]);
//! assert_eq!(image.colorspace(), Colorspace::Unknown);
//! # Ok::<(), exrio_core::Error>(())
//! ```

use crate::colorspace::{classify, classify_layer, Colorspace};
use crate::error::{Error, Result};
use crate::pixel::{PixelBuffer, SampleType};
use exrio_primaries::Chromaticities;
use std::collections::BTreeMap;

/// String-keyed, string-valued metadata, iterated in key order.
pub type Attributes = BTreeMap<String, String>;

// ============================================================================
// Channel
// ============================================================================

/// One named 2-D plane of samples.
///
/// Invariant: `pixels.len() == width * height`.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    name: String,
    width: u32,
    height: u32,
    pixels: PixelBuffer,
}

impl Channel {
    /// Creates a channel, checking the sample count against the size.
    ///
    /// # Errors
    ///
    /// [`Error::SampleCountMismatch`] when `pixels` does not hold exactly
    /// `width * height` samples.
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: impl Into<PixelBuffer>,
    ) -> Result<Self> {
        let name = name.into();
        let pixels = pixels.into();
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::sample_count(name, expected, pixels.len()));
        }
        Ok(Self {
            name,
            width,
            height,
            pixels,
        })
    }

    /// Channel name, e.g. `"R"` or `"Z"`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The samples, row-major.
    #[inline]
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Consumes the channel, returning its samples.
    #[inline]
    pub fn into_pixels(self) -> PixelBuffer {
        self.pixels
    }

    /// Dtype of the samples.
    #[inline]
    pub fn sample_type(&self) -> SampleType {
        self.pixels.sample_type()
    }
}

// ============================================================================
// Layer
// ============================================================================

/// Named group of equally sized channels.
///
/// Invariant: every channel has the layer's width and height.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: Option<String>,
    width: u32,
    height: u32,
    channels: Vec<Channel>,
    attributes: Attributes,
    chromaticities: Option<Chromaticities>,
}

impl Layer {
    /// Creates an empty layer of the given size.
    pub fn new(name: Option<&str>, width: u32, height: u32) -> Self {
        Self {
            name: name.map(str::to_string),
            width,
            height,
            channels: Vec::new(),
            attributes: Attributes::new(),
            chromaticities: None,
        }
    }

    /// Appends a channel built from `pixels`.
    ///
    /// # Errors
    ///
    /// [`Error::SampleCountMismatch`] if `pixels` does not cover the layer.
    pub fn with_channel(
        mut self,
        name: impl Into<String>,
        pixels: impl Into<PixelBuffer>,
    ) -> Result<Self> {
        let channel = Channel::new(name, self.width, self.height, pixels)?;
        self.channels.push(channel);
        Ok(self)
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Replaces all attributes.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Attaches chromaticities.
    pub fn with_chromaticities(mut self, chromaticities: Chromaticities) -> Self {
        self.chromaticities = Some(chromaticities);
        self
    }

    /// Appends an existing channel.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] if the channel is not the layer's size.
    pub fn push_channel(&mut self, channel: Channel) -> Result<()> {
        if channel.width != self.width || channel.height != self.height {
            return Err(Error::shape_mismatch(
                format!("{}x{}", self.width, self.height),
                format!("{}x{} (channel `{}`)", channel.width, channel.height, channel.name),
            ));
        }
        self.channels.push(channel);
        Ok(())
    }

    /// Layer name, if any.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Renames the layer.
    pub fn set_name(&mut self, name: Option<&str>) {
        self.name = name.map(str::to_string);
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channels in stored order.
    #[inline]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Consumes the layer, returning its channels in stored order.
    pub fn into_channels(self) -> Vec<Channel> {
        self.channels
    }

    /// Number of channels.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channel names in stored order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(Channel::name).collect()
    }

    /// Finds a channel by exact name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Common sample type of all channels; `None` when mixed or empty.
    pub fn sample_type(&self) -> Option<SampleType> {
        let first = self.channels.first()?.sample_type();
        self.channels
            .iter()
            .all(|c| c.sample_type() == first)
            .then_some(first)
    }

    /// Layer attributes.
    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable layer attributes, for edits before re-encoding.
    #[inline]
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Attached chromaticities.
    #[inline]
    pub fn chromaticities(&self) -> Option<&Chromaticities> {
        self.chromaticities.as_ref()
    }

    /// Replaces or clears the chromaticities.
    pub fn set_chromaticities(&mut self, chromaticities: Option<Chromaticities>) {
        self.chromaticities = chromaticities;
    }

    /// Colorspace inferred from this layer alone.
    pub fn colorspace(&self) -> Colorspace {
        classify_layer(&Attributes::new(), self)
    }

    /// Checks that every channel matches the layer size.
    pub fn validate(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize;
        for channel in &self.channels {
            if channel.width != self.width || channel.height != self.height {
                return Err(Error::shape_mismatch(
                    format!("{}x{}", self.width, self.height),
                    format!("{}x{} (channel `{}`)", channel.width, channel.height, channel.name),
                ));
            }
            if channel.pixels.len() != expected {
                return Err(Error::sample_count(
                    channel.name.clone(),
                    expected,
                    channel.pixels.len(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Image
// ============================================================================

/// Top-level container: ordered layers plus image attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    layers: Vec<Layer>,
    attributes: Attributes,
}

impl Image {
    /// Creates an image with no layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-layer image.
    pub fn from_layer(layer: Layer) -> Self {
        Self {
            layers: vec![layer],
            attributes: Attributes::new(),
        }
    }

    /// Creates an image from layers, keeping their order.
    pub fn from_layers(layers: impl IntoIterator<Item = Layer>) -> Self {
        Self {
            layers: layers.into_iter().collect(),
            attributes: Attributes::new(),
        }
    }

    /// Appends a layer.
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Adds an image attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Replaces all image attributes.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Appends a layer in place.
    pub fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Layers in stored order.
    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Consumes the image, returning its layers.
    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }

    /// Number of layers.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Finds the first layer with the given name.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == Some(name))
    }

    /// Mutable access to a layer by index, for attribute or chromaticity edits.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// The only layer of the image.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyImage`] if there are no layers
    /// - [`Error::AmbiguousLayerReference`] if there is more than one
    pub fn single_layer(&self) -> Result<&Layer> {
        match self.layers.as_slice() {
            [] => Err(Error::EmptyImage),
            [layer] => Ok(layer),
            layers => Err(Error::ambiguous_layer(layers.len())),
        }
    }

    /// Image attributes.
    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable image attributes, for edits before re-encoding.
    #[inline]
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Colorspace of the image, inferred from metadata only.
    ///
    /// Uses the image attributes and the first layer. See
    /// [`classify`](crate::colorspace::classify).
    pub fn colorspace(&self) -> Colorspace {
        classify(self)
    }

    /// Colorspace of one layer, honoring image-level flags.
    pub fn layer_colorspace(&self, index: usize) -> Option<Colorspace> {
        self.layers
            .get(index)
            .map(|layer| classify_layer(&self.attributes, layer))
    }

    /// Checks the structural invariants: at least one layer, and every
    /// channel sized like its layer.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::EmptyImage);
        }
        self.layers.iter().try_for_each(Layer::validate)
    }
}
