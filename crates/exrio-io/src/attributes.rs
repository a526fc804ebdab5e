//! Mapping between string attributes and EXR header attributes.
//!
//! Layer attributes become custom text attributes of the layer header,
//! except for keys that name a standard EXR attribute. Those are routed to
//! the typed header field of the same name: text fields (`owner`,
//! `renderingTransform`, `view`, ...) take the string as is, numeric fields
//! (`whiteLuminance`, `expTime`, ...) parse it. Standard names without a
//! string form (`dataWindow`, `channels`, ...) are rejected.
//!
//! Image attributes are kept as key/value pairs in one reserved text vector
//! so they survive independently of any layer. The keys `pixel_aspect` and
//! `timecode.*` are the exception: they map to the typed image header
//! fields, so other EXR tools see them too.
//!
//! Text is stored as UTF-8. Text written by other tools that is not valid
//! UTF-8 is read as Latin-1. Attributes of other types found in foreign
//! files are stringified on decode. Reserved bookkeeping keys never reach
//! the decoded mappings.

use crate::{IoError, IoResult};
use exr::meta::attribute::{AttributeValue, Text, TimeCode};
use exr::meta::header::{standard_names, ImageAttributes, LayerAttributes};
use exrio_core::Attributes;
use std::collections::HashMap;

/// Per-layer record of the caller's channel order.
pub const CHANNEL_ORDER_KEY: &str = "exrio:channelOrder";

/// Image attributes, stored as alternating keys and values.
pub const IMAGE_ATTRIBUTES_KEY: &str = "exrio:imageAttributes";

/// Image attribute holding the pixel aspect ratio.
pub const PIXEL_ASPECT_KEY: &str = "pixel_aspect";

/// Image attributes holding the SMPTE time code fields.
pub const TIMECODE_HOURS_KEY: &str = "timecode.hours";
/// See [`TIMECODE_HOURS_KEY`].
pub const TIMECODE_MINUTES_KEY: &str = "timecode.minutes";
/// See [`TIMECODE_HOURS_KEY`].
pub const TIMECODE_SECONDS_KEY: &str = "timecode.seconds";
/// See [`TIMECODE_HOURS_KEY`].
pub const TIMECODE_FRAME_KEY: &str = "timecode.frame";
/// See [`TIMECODE_HOURS_KEY`]. Only present when set.
pub const TIMECODE_DROP_FRAME_KEY: &str = "timecode.drop_frame";

const OWNER: &str = "owner";
const COMMENTS: &str = "comments";
const CAPTURE_DATE: &str = "capDate";
const SOFTWARE: &str = "software";
const RENDERING_TRANSFORM: &str = "renderingTransform";
const LOOK_MOD_TRANSFORM: &str = "lookModTransform";
const WRAP_MODES: &str = "wrapmodes";
const VIEW: &str = "view";

const WHITE_LUMINANCE: &str = "whiteLuminance";
const X_DENSITY: &str = "xDensity";
const UTC_OFFSET: &str = "utcOffset";
const LONGITUDE: &str = "longitude";
const LATITUDE: &str = "latitude";
const ALTITUDE: &str = "altitude";
const FOCUS: &str = "focus";
const EXPOSURE: &str = "expTime";
const APERTURE: &str = "aperture";
const ISO_SPEED: &str = "isoSpeed";

/// Returns `true` for keys used internally for bookkeeping.
pub fn is_reserved(key: &str) -> bool {
    key == CHANNEL_ORDER_KEY || key == IMAGE_ATTRIBUTES_KEY
}

/// Returns `true` if `key` names an attribute defined by the EXR format.
pub fn is_standard(key: &str) -> bool {
    key == SOFTWARE || standard_names::ALL.iter().any(|name| *name == key.as_bytes())
}

/// Converts a string into EXR text, stored as UTF-8.
pub(crate) fn text(key: &str, value: &str) -> IoResult<Text> {
    if value.contains('\0') {
        return Err(IoError::InvalidAttribute(format!(
            "`{key}`: value contains a NUL character"
        )));
    }
    Ok(Text::from_slice_unchecked(value.as_bytes()))
}

/// Converts EXR text into a string: UTF-8 when valid, Latin-1 otherwise.
pub(crate) fn string(text: &Text) -> String {
    let bytes = text.as_slice();
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn attribute_name(key: &str) -> IoResult<Text> {
    if key.is_empty() {
        return Err(IoError::InvalidAttribute("empty attribute name".into()));
    }
    text(key, key)
}

fn invalid(key: &str, value: &str, expected: &str) -> IoError {
    IoError::InvalidAttribute(format!("`{key}`: `{value}` is not {expected}"))
}

/// Renders any attribute value as a string.
///
/// Numbers use their `Display` form, integer bounds become `"x-y-w-h"`,
/// text vectors are joined with `", "`. Everything else falls back to the
/// `Debug` form.
pub fn stringify(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Text(text) => string(text),
        AttributeValue::TextVector(texts) => {
            texts.iter().map(string).collect::<Vec<_>>().join(", ")
        }
        AttributeValue::F32(v) => v.to_string(),
        AttributeValue::F64(v) => v.to_string(),
        AttributeValue::I32(v) => v.to_string(),
        AttributeValue::IntegerBounds(bounds) => format!(
            "{}-{}-{}-{}",
            bounds.position.0, bounds.position.1, bounds.size.0, bounds.size.1
        ),
        other => format!("{other:?}"),
    }
}

// ============================================================================
// Typed layer fields
// ============================================================================

fn text_fields(attributes: &LayerAttributes) -> [(&'static str, &Option<Text>); 8] {
    [
        (OWNER, &attributes.owner),
        (COMMENTS, &attributes.comments),
        (CAPTURE_DATE, &attributes.capture_date),
        (SOFTWARE, &attributes.software_name),
        (RENDERING_TRANSFORM, &attributes.rendering_transform_name),
        (LOOK_MOD_TRANSFORM, &attributes.look_modification_transform_name),
        (WRAP_MODES, &attributes.wrap_mode_name),
        (VIEW, &attributes.view_name),
    ]
}

fn text_field_mut<'a>(
    attributes: &'a mut LayerAttributes,
    key: &str,
) -> Option<&'a mut Option<Text>> {
    let field = match key {
        OWNER => &mut attributes.owner,
        COMMENTS => &mut attributes.comments,
        CAPTURE_DATE => &mut attributes.capture_date,
        SOFTWARE => &mut attributes.software_name,
        RENDERING_TRANSFORM => &mut attributes.rendering_transform_name,
        LOOK_MOD_TRANSFORM => &mut attributes.look_modification_transform_name,
        WRAP_MODES => &mut attributes.wrap_mode_name,
        VIEW => &mut attributes.view_name,
        _ => return None,
    };
    Some(field)
}

fn float_fields(attributes: &LayerAttributes) -> [(&'static str, Option<f32>); 10] {
    [
        (WHITE_LUMINANCE, attributes.white_luminance),
        (X_DENSITY, attributes.horizontal_density),
        (UTC_OFFSET, attributes.utc_offset),
        (LONGITUDE, attributes.longitude),
        (LATITUDE, attributes.latitude),
        (ALTITUDE, attributes.altitude),
        (FOCUS, attributes.focus),
        (EXPOSURE, attributes.exposure),
        (APERTURE, attributes.aperture),
        (ISO_SPEED, attributes.iso_speed),
    ]
}

fn float_field_mut<'a>(
    attributes: &'a mut LayerAttributes,
    key: &str,
) -> Option<&'a mut Option<f32>> {
    let field = match key {
        WHITE_LUMINANCE => &mut attributes.white_luminance,
        X_DENSITY => &mut attributes.horizontal_density,
        UTC_OFFSET => &mut attributes.utc_offset,
        LONGITUDE => &mut attributes.longitude,
        LATITUDE => &mut attributes.latitude,
        ALTITUDE => &mut attributes.altitude,
        FOCUS => &mut attributes.focus,
        EXPOSURE => &mut attributes.exposure,
        APERTURE => &mut attributes.aperture,
        ISO_SPEED => &mut attributes.iso_speed,
        _ => return None,
    };
    Some(field)
}

/// Builds the codec's layer attributes.
///
/// `channel_order` is the caller's channel order, recorded so decode can
/// restore it after the codec sorts channels for storage.
pub(crate) fn encode_layer(
    name: Option<&str>,
    attributes: &Attributes,
    channel_order: &[&str],
) -> IoResult<LayerAttributes> {
    let mut out = LayerAttributes::default();
    out.layer_name = name.map(|n| text("name", n)).transpose()?;

    for (key, value) in attributes {
        let key = key.as_str();
        if is_reserved(key) {
            tracing::warn!(key, "ignoring reserved attribute on layer");
        } else if let Some(field) = text_field_mut(&mut out, key) {
            *field = Some(text(key, value)?);
        } else if let Some(field) = float_field_mut(&mut out, key) {
            let parsed = value
                .trim()
                .parse::<f32>()
                .map_err(|_| invalid(key, value, "a number"))?;
            *field = Some(parsed);
        } else if is_standard(key) {
            return Err(IoError::InvalidAttribute(format!(
                "`{key}` is a standard EXR header attribute without a string form"
            )));
        } else {
            out.other
                .insert(attribute_name(key)?, AttributeValue::Text(text(key, value)?));
        }
    }

    let order = channel_order
        .iter()
        .map(|name| text(CHANNEL_ORDER_KEY, name))
        .collect::<IoResult<Vec<_>>>()?;
    out.other
        .insert(attribute_name(CHANNEL_ORDER_KEY)?, AttributeValue::TextVector(order));

    Ok(out)
}

/// Splits decoded layer attributes into caller-visible attributes and the
/// recorded channel order, if any.
pub(crate) fn decode_layer(attributes: &LayerAttributes) -> (Attributes, Option<Vec<String>>) {
    let mut out = Attributes::new();
    for (key, value) in text_fields(attributes) {
        if let Some(value) = value {
            out.insert(key.to_string(), string(value));
        }
    }
    for (key, value) in float_fields(attributes) {
        if let Some(value) = value {
            out.insert(key.to_string(), value.to_string());
        }
    }

    let mut channel_order = None;
    for (key, value) in &attributes.other {
        let key = string(key);
        if key == CHANNEL_ORDER_KEY {
            channel_order = text_vector(value);
        } else if !is_reserved(&key) {
            out.insert(key, stringify(value));
        }
    }
    (out, channel_order)
}

// ============================================================================
// Image attributes
// ============================================================================

fn is_image_field(key: &str) -> bool {
    matches!(
        key,
        PIXEL_ASPECT_KEY
            | TIMECODE_HOURS_KEY
            | TIMECODE_MINUTES_KEY
            | TIMECODE_SECONDS_KEY
            | TIMECODE_FRAME_KEY
            | TIMECODE_DROP_FRAME_KEY
    )
}

fn timecode_field(attributes: &Attributes, key: &str, limit: u8) -> IoResult<u8> {
    let Some(value) = attributes.get(key) else {
        return Ok(0);
    };
    match value.trim().parse::<u8>() {
        Ok(v) if v < limit => Ok(v),
        _ => Err(invalid(key, value, &format!("an integer below {limit}"))),
    }
}

fn encode_timecode(attributes: &Attributes) -> IoResult<Option<TimeCode>> {
    let present = [
        TIMECODE_HOURS_KEY,
        TIMECODE_MINUTES_KEY,
        TIMECODE_SECONDS_KEY,
        TIMECODE_FRAME_KEY,
        TIMECODE_DROP_FRAME_KEY,
    ]
    .iter()
    .any(|key| attributes.contains_key(*key));
    if !present {
        return Ok(None);
    }

    let drop_frame = match attributes.get(TIMECODE_DROP_FRAME_KEY) {
        None => false,
        Some(value) => value
            .trim()
            .parse::<bool>()
            .map_err(|_| invalid(TIMECODE_DROP_FRAME_KEY, value, "`true` or `false`"))?,
    };

    Ok(Some(TimeCode {
        hours: timecode_field(attributes, TIMECODE_HOURS_KEY, 24)?,
        minutes: timecode_field(attributes, TIMECODE_MINUTES_KEY, 60)?,
        seconds: timecode_field(attributes, TIMECODE_SECONDS_KEY, 60)?,
        frame: timecode_field(attributes, TIMECODE_FRAME_KEY, 30)?,
        drop_frame,
        color_frame: false,
        field_phase: false,
        binary_group_flags: [false; 3],
        binary_groups: [0; 8],
    }))
}

/// Writes image attributes into the shared header.
///
/// `pixel_aspect` and `timecode.*` set the typed header fields. Everything
/// else is packed into the reserved text vector, which is omitted when
/// nothing is left to store.
pub(crate) fn encode_image(attributes: &Attributes, shared: &mut ImageAttributes) -> IoResult<()> {
    if let Some(value) = attributes.get(PIXEL_ASPECT_KEY) {
        shared.pixel_aspect = match value.trim().parse::<f32>() {
            Ok(v) if v.is_finite() && v > 0.0 => v,
            _ => return Err(invalid(PIXEL_ASPECT_KEY, value, "a positive number")),
        };
    }
    if let Some(time_code) = encode_timecode(attributes)? {
        shared.time_code = Some(time_code);
    }

    let mut pairs = Vec::with_capacity(attributes.len() * 2);
    for (key, value) in attributes.iter().filter(|(key, _)| !is_image_field(key)) {
        if key.is_empty() {
            return Err(IoError::InvalidAttribute("empty attribute name".into()));
        }
        pairs.push(text(key, key)?);
        pairs.push(text(key, value)?);
    }
    if !pairs.is_empty() {
        shared.other.insert(
            attribute_name(IMAGE_ATTRIBUTES_KEY)?,
            AttributeValue::TextVector(pairs),
        );
    }
    Ok(())
}

/// Recovers image attributes.
///
/// The record may come back in the shared image attributes or in a layer
/// header, depending on how the file was written. Foreign files have no
/// record; their shared custom attributes are stringified instead. A pixel
/// aspect of exactly 1 is the EXR default and is not reported.
pub(crate) fn decode_image(
    image: &ImageAttributes,
    first_layer: Option<&LayerAttributes>,
) -> Attributes {
    let mut out = Attributes::new();
    for (key, value) in &image.other {
        let key = string(key);
        if !is_reserved(&key) {
            out.insert(key, stringify(value));
        }
    }
    if image.pixel_aspect != 1.0 {
        out.insert(PIXEL_ASPECT_KEY.to_string(), image.pixel_aspect.to_string());
    }
    if let Some(time_code) = &image.time_code {
        for (key, value) in [
            (TIMECODE_HOURS_KEY, time_code.hours),
            (TIMECODE_MINUTES_KEY, time_code.minutes),
            (TIMECODE_SECONDS_KEY, time_code.seconds),
            (TIMECODE_FRAME_KEY, time_code.frame),
        ] {
            out.insert(key.to_string(), value.to_string());
        }
        if time_code.drop_frame {
            out.insert(TIMECODE_DROP_FRAME_KEY.to_string(), "true".to_string());
        }
    }

    let record = find_record(&image.other)
        .or_else(|| first_layer.and_then(|layer| find_record(&layer.other)));
    if let Some(pairs) = record {
        if pairs.len() % 2 != 0 {
            tracing::warn!(
                entries = pairs.len(),
                "image attribute record has a dangling key, dropping it"
            );
        }
        for pair in pairs.chunks_exact(2) {
            out.insert(pair[0].clone(), pair[1].clone());
        }
    }
    out
}

fn find_record(other: &HashMap<Text, AttributeValue>) -> Option<Vec<String>> {
    other
        .iter()
        .find(|(key, _)| string(key) == IMAGE_ATTRIBUTES_KEY)
        .and_then(|(_, value)| text_vector(value))
}

fn text_vector(value: &AttributeValue) -> Option<Vec<String>> {
    match value {
        AttributeValue::TextVector(texts) => Some(texts.iter().map(string).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exr::meta::attribute::IntegerBounds;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn shared() -> ImageAttributes {
        ImageAttributes::new(IntegerBounds::from_dimensions((1, 1)))
    }

    #[test]
    fn test_stringify_numbers() {
        assert_eq!(stringify(&AttributeValue::F32(1.5)), "1.5");
        assert_eq!(stringify(&AttributeValue::I32(-3)), "-3");
        assert_eq!(stringify(&AttributeValue::F64(0.25)), "0.25");
    }

    #[test]
    fn test_layer_roundtrip() {
        let input = attrs(&[("artist", "jane"), ("owner", "studio"), ("shot", "010")]);
        let encoded = encode_layer(Some("beauty"), &input, &["R", "G", "B"]).unwrap();

        assert_eq!(encoded.owner.as_ref().map(string), Some("studio".into()));
        assert_eq!(encoded.layer_name.as_ref().map(string), Some("beauty".into()));

        let (decoded, order) = decode_layer(&encoded);
        assert_eq!(decoded, input);
        assert_eq!(order, Some(vec!["R".into(), "G".into(), "B".into()]));
    }

    #[test]
    fn test_standard_text_fields_are_typed() {
        let input = attrs(&[
            ("renderingTransform", "aces_rrt"),
            ("lookModTransform", "show_lmt"),
            ("wrapmodes", "clamp"),
            ("view", "left"),
            ("artist", "jane"),
        ]);
        let encoded = encode_layer(None, &input, &[]).unwrap();

        assert_eq!(
            encoded.rendering_transform_name.as_ref().map(string),
            Some("aces_rrt".into())
        );
        assert_eq!(encoded.view_name.as_ref().map(string), Some("left".into()));
        assert_eq!(encoded.other.len(), 2, "only `artist` and the channel order are custom");

        let (decoded, _) = decode_layer(&encoded);
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_standard_numeric_fields_are_typed() {
        let input = attrs(&[("whiteLuminance", "100"), ("expTime", "0.02"), ("xDensity", "72")]);
        let encoded = encode_layer(None, &input, &[]).unwrap();
        assert_eq!(encoded.white_luminance, Some(100.0));
        assert_eq!(encoded.exposure, Some(0.02));

        let (decoded, _) = decode_layer(&encoded);
        assert_eq!(decoded, input);

        let bad = attrs(&[("whiteLuminance", "bright")]);
        assert!(matches!(
            encode_layer(None, &bad, &[]),
            Err(IoError::InvalidAttribute(_))
        ));
    }

    #[test]
    fn test_foreign_typed_fields_are_reported() {
        let mut foreign = LayerAttributes::default();
        foreign.utc_offset = Some(-3600.0);
        foreign.aperture = Some(2.8);
        foreign.look_modification_transform_name = Some(text("lmt", "grade").unwrap());

        let (decoded, order) = decode_layer(&foreign);
        assert_eq!(
            decoded,
            attrs(&[("utcOffset", "-3600"), ("aperture", "2.8"), ("lookModTransform", "grade")])
        );
        assert!(order.is_none());
    }

    #[test]
    fn test_structural_names_rejected() {
        for key in ["dataWindow", "chromaticities", "framesPerSecond", "multiView"] {
            let input = attrs(&[(key, "x")]);
            assert!(
                matches!(encode_layer(None, &input, &[]), Err(IoError::InvalidAttribute(_))),
                "{key}"
            );
        }
    }

    #[test]
    fn test_unicode_text() {
        let input = attrs(&[("artist", "Zoë 🎨"), ("city", "東京"), ("comments", "naïve")]);
        let encoded = encode_layer(Some("ビューティー"), &input, &["R"]).unwrap();
        assert_eq!(encoded.layer_name.as_ref().map(string), Some("ビューティー".into()));

        let (decoded, _) = decode_layer(&encoded);
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_latin1_fallback() {
        let latin1 = Text::from_slice_unchecked(&[b'c', 0xE9]);
        assert_eq!(string(&latin1), "cé");
        assert!(matches!(text("k", "a\0b"), Err(IoError::InvalidAttribute(_))));
    }

    #[test]
    fn test_reserved_keys_hidden() {
        let input = attrs(&[(CHANNEL_ORDER_KEY, "nope"), ("a", "b")]);
        let encoded = encode_layer(None, &input, &["Z"]).unwrap();
        let (decoded, order) = decode_layer(&encoded);
        assert_eq!(decoded, attrs(&[("a", "b")]));
        assert_eq!(order, Some(vec!["Z".to_string()]));
    }

    #[test]
    fn test_image_record() {
        let input = attrs(&[("artist", "jane"), ("oiio:ColorSpace", "ACEScg")]);
        let mut header = shared();
        encode_image(&input, &mut header).unwrap();

        let (key, value) = header.other.drain().next().unwrap();
        assert_eq!(string(&key), IMAGE_ATTRIBUTES_KEY);

        let mut layer = LayerAttributes::default();
        layer.other.insert(key, value);
        assert_eq!(decode_image(&shared(), Some(&layer)), input);

        let mut empty = shared();
        encode_image(&Attributes::new(), &mut empty).unwrap();
        assert!(empty.other.is_empty());
    }

    #[test]
    fn test_pixel_aspect_and_timecode_are_typed() {
        let input = attrs(&[
            ("pixel_aspect", "2"),
            ("timecode.hours", "1"),
            ("timecode.minutes", "2"),
            ("timecode.seconds", "3"),
            ("timecode.frame", "4"),
        ]);
        let mut header = shared();
        encode_image(&input, &mut header).unwrap();

        assert_eq!(header.pixel_aspect, 2.0);
        let time_code = header.time_code.as_ref().expect("time code");
        assert_eq!(
            (time_code.hours, time_code.minutes, time_code.seconds, time_code.frame),
            (1, 2, 3, 4)
        );
        assert!(header.other.is_empty(), "typed keys stay out of the record");

        assert_eq!(decode_image(&header, None), input);
    }

    #[test]
    fn test_partial_timecode_fills_zeroes() {
        let mut header = shared();
        let input = attrs(&[("timecode.frame", "12"), ("timecode.drop_frame", "true")]);
        encode_image(&input, &mut header).unwrap();
        let decoded = decode_image(&header, None);
        assert_eq!(decoded.get("timecode.hours").map(String::as_str), Some("0"));
        assert_eq!(decoded.get("timecode.frame").map(String::as_str), Some("12"));
        assert_eq!(decoded.get("timecode.drop_frame").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_bad_image_fields_rejected() {
        for (key, value) in [
            ("pixel_aspect", "0"),
            ("pixel_aspect", "wide"),
            ("timecode.hours", "24"),
            ("timecode.frame", "-1"),
            ("timecode.drop_frame", "yes"),
        ] {
            let result = encode_image(&attrs(&[(key, value)]), &mut shared());
            assert!(matches!(result, Err(IoError::InvalidAttribute(_))), "{key}={value}");
        }
    }
}
