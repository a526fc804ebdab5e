//! Options for building images from tensors.

use exrio_core::Colorspace;

/// Configuration for [`from_pixels`](crate::from_pixels).
///
/// # Example
///
/// ```rust
/// use exrio_core::Colorspace;
/// use exrio_tensor::PixelOptions;
///
/// let opts = PixelOptions::new()
///     .with_colorspace(Colorspace::AcesCg)
///     .with_layer_names(["mask", "depth"]);
/// assert_eq!(opts.layer_names.as_deref().map(|n| n.len()), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelOptions {
    /// Colorspace the pixel values are already in. Default sRGB.
    pub colorspace: Colorspace,
    /// One name per leading tensor slice, in order.
    pub layer_names: Option<Vec<String>>,
}

impl PixelOptions {
    /// Default options: sRGB, unnamed layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the colorspace tag.
    pub fn with_colorspace(mut self, colorspace: Colorspace) -> Self {
        self.colorspace = colorspace;
        self
    }

    /// Sets the layer names.
    pub fn with_layer_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layer_names = Some(names.into_iter().map(Into::into).collect());
        self
    }
}
