//! Colorspace tags and metadata-only colorspace inference.
//!
//! OpenEXR has no single colorspace field. What a file does carry is a
//! `chromaticities` attribute and arbitrary string metadata. This module
//! maps those to a [`Colorspace`] tag without looking at pixel values.
//!
//! # Classification Order
//!
//! First match wins:
//!
//! 1. A recognized [`COLORSPACE_ATTRIBUTE`] value on the image, then on the layer
//! 2. An [`ACES_CONTAINER_FLAG`] of `"1"` (SMPTE ST 2065-4 container) -> ACES2065-1
//! 3. Exact chromaticities match: AP0 -> ACES2065-1, AP1 -> ACEScg, sRGB -> sRGB
//! 4. [`Colorspace::Unknown`]
//!
//! ACEScg, ACEScct and ACEScc share AP1 primaries and differ only in their
//! transfer function, so primaries alone always resolve to ACEScg. The
//! explicit attribute is the only way to tell the log encodings apart.
//!
//! # Example
//!
//! ```rust
//! use exrio_core::{Colorspace, Image, Layer, COLORSPACE_ATTRIBUTE};
//! use exrio_primaries::AP1;
//!
//! let layer = Layer::new(None, 1, 1).with_chromaticities(AP1);
//! let image = Image::from_layer(layer);
//! assert_eq!(image.colorspace(), Colorspace::AcesCg);
//!
//! let image = image.with_attribute(COLORSPACE_ATTRIBUTE, "ACEScct");
//! assert_eq!(image.colorspace(), Colorspace::AcesCct);
//! ```

use crate::image::{Attributes, Image, Layer};
use exrio_primaries::{Chromaticities, PrimarySet};
use std::fmt;
use std::str::FromStr;

/// Reserved attribute naming the colorspace pixel values are encoded in.
///
/// Stamped on images whose colorspace cannot be told from primaries alone.
pub const COLORSPACE_ATTRIBUTE: &str = "oiio:ColorSpace";

/// ACES image container marker; `"1"` marks an ACES2065-1 file.
pub const ACES_CONTAINER_FLAG: &str = "acesImageContainerFlag";

/// Recognized colorspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Colorspace {
    /// ACES2065-1: AP0 primaries, linear.
    Aces2065_1,
    /// ACEScg: AP1 primaries, linear.
    AcesCg,
    /// ACEScct: AP1 primaries, log with toe.
    AcesCct,
    /// ACEScc: AP1 primaries, pure log.
    AcesCc,
    /// sRGB: Rec.709 primaries, sRGB transfer.
    #[default]
    Srgb,
    /// Rec.709 primaries, linear.
    LinearSrgb,
    /// No recognizable metadata.
    Unknown,
}

impl Colorspace {
    /// Every recognized tag, excluding [`Colorspace::Unknown`].
    pub const KNOWN: [Colorspace; 6] = [
        Colorspace::Aces2065_1,
        Colorspace::AcesCg,
        Colorspace::AcesCct,
        Colorspace::AcesCc,
        Colorspace::Srgb,
        Colorspace::LinearSrgb,
    ];

    /// Stable name, as written to [`COLORSPACE_ATTRIBUTE`].
    pub const fn name(self) -> &'static str {
        match self {
            Colorspace::Aces2065_1 => "ACES2065-1",
            Colorspace::AcesCg => "ACEScg",
            Colorspace::AcesCct => "ACEScct",
            Colorspace::AcesCc => "ACEScc",
            Colorspace::Srgb => "sRGB",
            Colorspace::LinearSrgb => "Linear sRGB",
            Colorspace::Unknown => "Unknown",
        }
    }

    /// Primary set the colorspace is defined on.
    pub const fn primary_set(self) -> Option<PrimarySet> {
        match self {
            Colorspace::Aces2065_1 => Some(PrimarySet::Ap0),
            Colorspace::AcesCg | Colorspace::AcesCct | Colorspace::AcesCc => {
                Some(PrimarySet::Ap1)
            }
            Colorspace::Srgb | Colorspace::LinearSrgb => Some(PrimarySet::Srgb),
            Colorspace::Unknown => None,
        }
    }

    /// Chromaticities to attach when tagging an image.
    pub const fn chromaticities(self) -> Option<Chromaticities> {
        match self.primary_set() {
            Some(set) => Some(set.chromaticities()),
            None => None,
        }
    }

    /// Whether tagging needs the explicit attribute.
    ///
    /// Only sRGB is the flag-less default for its primaries; every other
    /// recognized tag is stamped so a later decode classifies it exactly.
    pub const fn requires_flag(self) -> bool {
        !matches!(self, Colorspace::Srgb | Colorspace::Unknown)
    }

    /// Whether the colorspace belongs to the ACES family.
    pub const fn is_aces(self) -> bool {
        matches!(
            self,
            Colorspace::Aces2065_1 | Colorspace::AcesCg | Colorspace::AcesCct | Colorspace::AcesCc
        )
    }

    /// Whether values are scene-linear.
    pub const fn is_linear(self) -> bool {
        matches!(
            self,
            Colorspace::Aces2065_1 | Colorspace::AcesCg | Colorspace::LinearSrgb
        )
    }

    /// The flag-less tag for a primary set.
    pub const fn from_primary_set(set: PrimarySet) -> Self {
        match set {
            PrimarySet::Ap0 => Colorspace::Aces2065_1,
            PrimarySet::Ap1 => Colorspace::AcesCg,
            PrimarySet::Srgb => Colorspace::Srgb,
        }
    }
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colorspace {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-' | '.'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "aces20651" | "aces" | "acesap0" => Ok(Colorspace::Aces2065_1),
            "acescg" => Ok(Colorspace::AcesCg),
            "acescct" => Ok(Colorspace::AcesCct),
            "acescc" => Ok(Colorspace::AcesCc),
            "srgb" => Ok(Colorspace::Srgb),
            "linearsrgb" | "linearrgb" | "linsrgb" | "srgblinear" | "linearrec709" => {
                Ok(Colorspace::LinearSrgb)
            }
            "unknown" => Ok(Colorspace::Unknown),
            _ => Err(crate::Error::other(format!("unrecognized colorspace: {s}"))),
        }
    }
}

/// Parses a recognized flag value; `Unknown` and garbage yield `None`.
fn flag_value(attributes: &Attributes) -> Option<Colorspace> {
    attributes
        .get(COLORSPACE_ATTRIBUTE)
        .and_then(|v| v.parse::<Colorspace>().ok())
        .filter(|cs| *cs != Colorspace::Unknown)
}

fn aces_container(attributes: &Attributes) -> bool {
    attributes
        .get(ACES_CONTAINER_FLAG)
        .is_some_and(|v| v.trim() == "1")
}

/// Classifies one layer given the attributes of its image.
///
/// Pure: performs no I/O and reads no pixel data.
pub fn classify_layer(image_attributes: &Attributes, layer: &Layer) -> Colorspace {
    if let Some(cs) = flag_value(image_attributes).or_else(|| flag_value(layer.attributes())) {
        return cs;
    }

    if aces_container(image_attributes) || aces_container(layer.attributes()) {
        return Colorspace::Aces2065_1;
    }

    layer
        .chromaticities()
        .and_then(PrimarySet::identify)
        .map(Colorspace::from_primary_set)
        .unwrap_or(Colorspace::Unknown)
}

/// Classifies an image from its attributes and its first layer.
///
/// An image without layers can still be classified by its attributes.
pub fn classify(image: &Image) -> Colorspace {
    match image.layers().first() {
        Some(layer) => classify_layer(image.attributes(), layer),
        None => flag_value(image.attributes())
            .or_else(|| aces_container(image.attributes()).then_some(Colorspace::Aces2065_1))
            .unwrap_or(Colorspace::Unknown),
    }
}
