//! # exrio-primaries
//!
//! Chromaticity primaries and white points used to tag OpenEXR images.
//!
//! OpenEXR stores the gamut of an image as a `chromaticities` header
//! attribute: four CIE xy pairs for the red, green and blue primaries and
//! the white point. This crate holds the reference table those values are
//! compared against when an image's colorspace is inferred, and the values
//! stamped onto images built from raw pixel tensors.
//!
//! # Included Primary Sets
//!
//! | Set | White | Used by |
//! |-----|-------|---------|
//! | ACES AP0 | ACES (~D60) | ACES2065-1 |
//! | ACES AP1 | ACES (~D60) | ACEScg, ACEScct, ACEScc |
//! | sRGB / Rec.709 | D65 | sRGB, Linear sRGB |
//!
//! # Usage
//!
//! ```rust
//! use exrio_primaries::{lookup, PrimarySet, AP1};
//!
//! assert_eq!(lookup("AP1"), Some(AP1));
//! assert_eq!(PrimarySet::identify(&AP1), Some(PrimarySet::Ap1));
//! ```
//!
//! The table is plain `const` data. Per-image overrides are made on a copy:
//!
//! ```rust
//! use exrio_primaries::SRGB;
//!
//! let custom = SRGB.with_white((0.32168, 0.33767));
//! assert_ne!(custom, SRGB);
//! ```
//!
//! # Used By
//!
//! - `exrio-core` - colorspace classification
//! - `exrio-tensor` - tagging images built from pixel tensors

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// CIE xy chromaticities of an RGB colorspace.
///
/// Mirrors the OpenEXR `chromaticities` attribute. No range validation is
/// applied: historical files carry primaries outside the spectral locus
/// (AP0 blue has a negative y).
///
/// # Example
///
/// ```rust
/// use exrio_primaries::Chromaticities;
///
/// let rec709 = Chromaticities {
///     red: (0.64, 0.33),
///     green: (0.30, 0.60),
///     blue: (0.15, 0.06),
///     white: (0.3127, 0.3290),
/// };
/// assert_eq!(rec709, exrio_primaries::SRGB);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chromaticities {
    /// Red primary (x, y)
    pub red: (f32, f32),
    /// Green primary (x, y)
    pub green: (f32, f32),
    /// Blue primary (x, y)
    pub blue: (f32, f32),
    /// White point (x, y)
    pub white: (f32, f32),
}

impl Chromaticities {
    /// Creates chromaticities from the four xy pairs.
    #[inline]
    pub const fn new(
        red: (f32, f32),
        green: (f32, f32),
        blue: (f32, f32),
        white: (f32, f32),
    ) -> Self {
        Self {
            red,
            green,
            blue,
            white,
        }
    }

    /// Returns a copy with the red primary replaced.
    #[inline]
    pub const fn with_red(self, red: (f32, f32)) -> Self {
        Self { red, ..self }
    }

    /// Returns a copy with the green primary replaced.
    #[inline]
    pub const fn with_green(self, green: (f32, f32)) -> Self {
        Self { green, ..self }
    }

    /// Returns a copy with the blue primary replaced.
    #[inline]
    pub const fn with_blue(self, blue: (f32, f32)) -> Self {
        Self { blue, ..self }
    }

    /// Returns a copy with the white point replaced.
    #[inline]
    pub const fn with_white(self, white: (f32, f32)) -> Self {
        Self { white, ..self }
    }

    /// Exact comparison of all four primaries.
    ///
    /// Values written by this library survive an EXR round trip bit for
    /// bit, so no tolerance is applied.
    #[inline]
    pub fn matches(&self, other: &Chromaticities) -> bool {
        self == other
    }

    /// The four pairs in `[red, green, blue, white]` order.
    #[inline]
    pub const fn to_array(&self) -> [(f32, f32); 4] {
        [self.red, self.green, self.blue, self.white]
    }
}

// ============================================================================
// Standard White Points
// ============================================================================

/// D65 white point chromaticity (daylight, ~6500K).
pub const D65_XY: (f32, f32) = (0.3127, 0.3290);

/// ACES white point chromaticity (~D60).
pub const D60_XY: (f32, f32) = (0.32168, 0.33767);

// ============================================================================
// Standard Primary Sets
// ============================================================================

/// ACES AP0 primaries (ACES2065-1).
pub const AP0: Chromaticities = Chromaticities {
    red: (0.7347, 0.2653),
    green: (0.0, 1.0),
    blue: (0.0001, -0.077),
    white: D60_XY,
};

/// ACES AP1 primaries (ACEScg, ACEScct, ACEScc).
pub const AP1: Chromaticities = Chromaticities {
    red: (0.713, 0.293),
    green: (0.165, 0.830),
    blue: (0.128, 0.044),
    white: D60_XY,
};

/// sRGB / Rec.709 primaries, D65 white.
pub const SRGB: Chromaticities = Chromaticities {
    red: (0.64, 0.33),
    green: (0.30, 0.60),
    blue: (0.15, 0.06),
    white: D65_XY,
};

/// Rec.709 primaries (identical to sRGB).
pub const REC709: Chromaticities = SRGB;

/// Named entry of the primaries table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimarySet {
    /// ACES AP0
    Ap0,
    /// ACES AP1
    Ap1,
    /// sRGB / Rec.709
    Srgb,
}

impl PrimarySet {
    /// Every table entry, in lookup order.
    pub const ALL: [PrimarySet; 3] = [PrimarySet::Ap0, PrimarySet::Ap1, PrimarySet::Srgb];

    /// Canonical name of the set.
    pub const fn name(self) -> &'static str {
        match self {
            PrimarySet::Ap0 => "AP0",
            PrimarySet::Ap1 => "AP1",
            PrimarySet::Srgb => "sRGB",
        }
    }

    /// The published chromaticities of the set.
    pub const fn chromaticities(self) -> Chromaticities {
        match self {
            PrimarySet::Ap0 => AP0,
            PrimarySet::Ap1 => AP1,
            PrimarySet::Srgb => SRGB,
        }
    }

    /// Finds the table entry whose primaries equal `chromaticities` exactly.
    pub fn identify(chromaticities: &Chromaticities) -> Option<PrimarySet> {
        Self::ALL
            .into_iter()
            .find(|set| set.chromaticities().matches(chromaticities))
    }
}

impl fmt::Display for PrimarySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a primary set name is not in the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown primary set: {0}")]
pub struct UnknownPrimarySet(pub String);

impl FromStr for PrimarySet {
    type Err = UnknownPrimarySet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "ap0" | "aces ap0" | "aces_ap0" => Ok(PrimarySet::Ap0),
            "ap1" | "aces ap1" | "aces_ap1" => Ok(PrimarySet::Ap1),
            "srgb" | "rec709" | "rec.709" | "bt709" => Ok(PrimarySet::Srgb),
            _ => Err(UnknownPrimarySet(s.to_string())),
        }
    }
}

/// Looks up a primary set by name.
///
/// Returns `None` for names outside the table.
///
/// # Example
///
/// ```rust
/// use exrio_primaries::{lookup, AP0};
///
/// assert_eq!(lookup("aces ap0"), Some(AP0));
/// assert_eq!(lookup("P3"), None);
/// ```
pub fn lookup(primary_set_name: &str) -> Option<Chromaticities> {
    primary_set_name
        .parse::<PrimarySet>()
        .ok()
        .map(PrimarySet::chromaticities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lookup_known_sets() {
        assert_eq!(lookup("AP0"), Some(AP0));
        assert_eq!(lookup("AP1"), Some(AP1));
        assert_eq!(lookup("sRGB"), Some(SRGB));
        assert_eq!(lookup("Rec.709"), Some(SRGB));
        assert_eq!(lookup("DCI-P3"), None);
    }

    #[test]
    fn test_published_values() {
        assert_relative_eq!(AP0.red.0, 0.7347);
        assert_relative_eq!(AP0.blue.1, -0.077);
        assert_relative_eq!(AP1.green.1, 0.830);
        assert_relative_eq!(SRGB.white.0, 0.3127);
        assert_eq!(AP0.white, AP1.white);
    }

    #[test]
    fn test_identify_is_exact() {
        assert_eq!(PrimarySet::identify(&AP0), Some(PrimarySet::Ap0));
        assert_eq!(PrimarySet::identify(&AP1), Some(PrimarySet::Ap1));
        assert_eq!(PrimarySet::identify(&SRGB), Some(PrimarySet::Srgb));

        let nudged = AP1.with_red((0.7131, 0.293));
        assert_eq!(PrimarySet::identify(&nudged), None);
    }

    #[test]
    fn test_override_leaves_table_untouched() {
        let custom = SRGB.with_green((0.21, 0.71));
        assert_eq!(custom.red, SRGB.red);
        assert_eq!(custom.green, (0.21, 0.71));
        assert_eq!(SRGB.green, (0.30, 0.60));
    }

    #[test]
    fn test_names_roundtrip() {
        for set in PrimarySet::ALL {
            assert_eq!(set.name().parse::<PrimarySet>(), Ok(set));
        }
        assert!("bogus".parse::<PrimarySet>().is_err());
    }
}
