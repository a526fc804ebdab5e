use approx::assert_relative_eq;
use exr::image::write::WritableImage;
use exr::image::{AnyChannel, AnyChannels, Encoding, FlatSamples};
use exr::meta::attribute::{AttributeValue, IntegerBounds, Text, TimeCode};
use exr::meta::header::{ImageAttributes, LayerAttributes};
use exrio_core::{Attributes, Colorspace, Image, Layer, SampleType, COLORSPACE_ATTRIBUTE};
use exrio_io::{
    decode, encode, read, write, Compression, ExrReader, ExrWriter, ImageReader, ImageWriter,
};
use exrio_tensor::{
    from_pixels, from_pixels_default, from_pixels_in, to_pixels, PixelOptions, Tensor,
};
use half::f16;
use ndarray::{Array, Array3, Array4};
use std::io::Cursor;

fn roundtrip(image: &Image) -> Image {
    let bytes = encode(image).expect("encode");
    decode(&bytes).expect("decode")
}

#[test]
fn beauty_layer_scenario() {
    let layer = Layer::new(Some("beauty"), 2, 2)
        .with_channel("R", vec![0.0f32; 4])
        .and_then(|l| l.with_channel("G", vec![0.0f32; 4]))
        .and_then(|l| l.with_channel("B", vec![0.0f32; 4]))
        .expect("layer");
    let image = Image::from_layer(layer).with_attribute("artist", "jane");

    let decoded = roundtrip(&image);
    let layer = decoded.single_layer().expect("single layer");

    assert_eq!(layer.name(), Some("beauty"));
    assert_eq!(layer.channel_names(), vec!["R", "G", "B"]);
    assert_eq!(decoded.attributes().get("artist").map(String::as_str), Some("jane"));
    assert_eq!(decoded.colorspace(), Colorspace::Unknown);
}

#[test]
fn channel_order_is_not_sorted() {
    for names in [["R", "G", "B"], ["B", "G", "R"], ["G", "B", "R"]] {
        let mut layer = Layer::new(None, 1, 1);
        for (i, name) in names.iter().enumerate() {
            layer = layer.with_channel(*name, vec![i as f32]).expect("channel");
        }
        let decoded = roundtrip(&Image::from_layer(layer));
        assert_eq!(decoded.layers()[0].channel_names(), names.to_vec());
    }
}

#[test]
fn tensor_roundtrip_through_codec() {
    let tensor = Tensor::from(Array::from_shape_fn((5, 7, 4), |(y, x, c)| {
        f16::from_f32((y * 7 + x) as f32 / 35.0 + c as f32)
    }));
    let image = from_pixels_default(tensor.clone()).expect("from_pixels");
    assert_eq!(to_pixels(&roundtrip(&image)).expect("to_pixels"), tensor);

    let stacked = Tensor::from(Array4::from_shape_fn((3, 4, 4, 3), |(n, y, x, c)| {
        (n * 64 + y * 16 + x * 4 + c) as u32
    }));
    let opts = PixelOptions::new().with_layer_names(["left", "right", "center"]);
    let decoded = roundtrip(&from_pixels(stacked.clone(), &opts).expect("from_pixels"));

    let names: Vec<_> = decoded.layers().iter().map(Layer::name).collect();
    assert_eq!(names, vec![Some("left"), Some("right"), Some("center")]);
    assert_eq!(to_pixels(&decoded).expect("to_pixels"), stacked);
}

#[test]
fn colorspace_tags_survive_codec() {
    for colorspace in Colorspace::KNOWN {
        let image = from_pixels_in(Array3::<f32>::zeros((2, 2, 3)), colorspace).expect("from_pixels");
        let decoded = roundtrip(&image);
        assert_eq!(decoded.colorspace(), colorspace, "{colorspace}");
    }

    let decoded = roundtrip(
        &from_pixels_in(Array3::<f32>::zeros((2, 2, 3)), Colorspace::Unknown).expect("from_pixels"),
    );
    assert_eq!(decoded.colorspace(), Colorspace::Unknown);
    assert!(decoded.attributes().get(COLORSPACE_ATTRIBUTE).is_none());
}

#[test]
fn chromaticities_are_exact() {
    let image = from_pixels_in(Array3::<f32>::zeros((1, 1, 3)), Colorspace::AcesCg).expect("from_pixels");
    let decoded = roundtrip(&image);
    let c = decoded.layers()[0].chromaticities().expect("chromaticities");

    assert_relative_eq!(c.red.0, 0.713);
    assert_relative_eq!(c.blue.1, 0.044);
    assert_relative_eq!(c.white.0, 0.32168);
}

#[test]
fn uint8_tensor_decodes_as_uint32() {
    let tensor = Array3::<u8>::from_shape_fn((64, 64, 4), |(y, x, c)| ((y + x + c) % 256) as u8);
    let decoded = roundtrip(&from_pixels_default(tensor.clone()).expect("from_pixels"));

    let layer = decoded.single_layer().expect("layer");
    assert!(layer.channels().iter().all(|c| c.sample_type() == SampleType::U32));

    let back = to_pixels(&decoded).expect("to_pixels");
    assert_eq!(back, Tensor::from(tensor.mapv(u32::from)));
}

#[test]
fn mask_and_depth_file() {
    let tensor = Array4::<f32>::from_shape_fn((2, 64, 64, 1), |(n, y, x, _)| {
        if n == 0 { ((x + y) % 2) as f32 } else { 10.0 + x as f32 }
    });
    let image = from_pixels(tensor.clone(), &PixelOptions::new().with_layer_names(["mask", "depth"]))
        .expect("from_pixels");
    let bytes = ExrWriter::new()
        .with_compression(Compression::Piz)
        .write_to_memory(&image)
        .expect("encode");

    let depth = ExrReader::new()
        .with_layer("depth")
        .read_from_memory(&bytes)
        .expect("decode depth");
    assert_eq!(depth.single_layer().expect("layer").channel_names(), vec!["R"]);

    let all = decode(&bytes).expect("decode");
    assert_eq!(to_pixels(&all).expect("to_pixels"), Tensor::from(tensor));
}

#[test]
fn path_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("roundtrip.exr");

    let layer = Layer::new(Some("aovs"), 3, 2)
        .with_channel("Z", vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])
        .and_then(|l| l.with_channel("id", vec![7u32, 8, 9, 10, 11, 12]))
        .expect("layer")
        .with_attribute("pass", "utility")
        .with_attribute("owner", "lighting");
    let image = Image::from_layer(layer).with_attribute("shot", "sq010_sh020");

    write(&path, &image).expect("write");
    let decoded = read(&path).expect("read");

    assert_eq!(decoded.attributes(), image.attributes());
    assert_eq!(decoded.layers()[0].attributes(), image.layers()[0].attributes());
    assert_eq!(decoded.layers()[0].channels(), image.layers()[0].channels());

    let reader = ExrReader::new().parallel(false).pedantic(true);
    assert_eq!(reader.read(&path).expect("pedantic read"), decoded);
}

#[test]
fn edits_before_reencode() {
    let mut image = from_pixels_in(Array3::<f32>::zeros((2, 2, 3)), Colorspace::AcesCg).expect("from_pixels");
    image.attributes_mut().remove(COLORSPACE_ATTRIBUTE);
    if let Some(layer) = image.layer_mut(0) {
        layer.set_chromaticities(Some(exrio_primaries::AP0));
        layer.attributes_mut().insert("note".into(), "converted".into());
    }

    let decoded = roundtrip(&image);
    assert_eq!(decoded.colorspace(), Colorspace::Aces2065_1);
    assert_eq!(
        decoded.layers()[0].attributes().get("note").map(String::as_str),
        Some("converted")
    );
}

/// A file written by another tool: sorted channels, typed and custom
/// attributes, none of the records this crate writes.
fn foreign_file() -> Vec<u8> {
    let channels = ["A", "B", "G", "R", "Z"]
        .iter()
        .enumerate()
        .map(|(i, name)| AnyChannel::new(Text::from(*name), FlatSamples::F32(vec![i as f32; 2])))
        .collect::<Vec<_>>();

    let mut layer_attributes = LayerAttributes::default();
    layer_attributes.layer_name = Some(Text::from("beauty"));
    layer_attributes.owner = Some(Text::from("studio"));
    layer_attributes.look_modification_transform_name = Some(Text::from("grade"));
    layer_attributes.exposure = Some(0.5);
    layer_attributes
        .other
        .insert(Text::from("gain"), AttributeValue::F32(1.5));
    layer_attributes
        .other
        .insert(Text::from("frame"), AttributeValue::I32(12));

    let mut shared = ImageAttributes::new(IntegerBounds::from_dimensions((2, 1)));
    shared.pixel_aspect = 2.0;
    shared.time_code = Some(TimeCode {
        hours: 10,
        minutes: 20,
        seconds: 30,
        frame: 12,
        drop_frame: false,
        color_frame: false,
        field_phase: false,
        binary_group_flags: [false; 3],
        binary_groups: [0; 8],
    });

    let layer = exr::image::Layer::new(
        (2, 1),
        layer_attributes,
        Encoding::UNCOMPRESSED,
        AnyChannels::sort(channels.into()),
    );
    let mut bytes = Vec::new();
    exr::image::Image::from_layers(shared, vec![layer])
        .write()
        .to_buffered(Cursor::new(&mut bytes))
        .expect("write foreign file");
    bytes
}

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn foreign_file_is_normalized() {
    let decoded = decode(&foreign_file()).expect("decode");
    let layer = decoded.single_layer().expect("layer");

    assert_eq!(layer.name(), Some("beauty"));
    assert_eq!(layer.channel_names(), vec!["R", "G", "B", "A", "Z"]);
    assert_eq!(layer.channel("R").and_then(|c| c.pixels().as_f32()), Some(&[3.0f32, 3.0][..]));
    assert_eq!(
        layer.attributes(),
        &attrs(&[
            ("owner", "studio"),
            ("lookModTransform", "grade"),
            ("expTime", "0.5"),
            ("gain", "1.5"),
            ("frame", "12"),
        ])
    );
    assert_eq!(
        decoded.attributes(),
        &attrs(&[
            ("pixel_aspect", "2"),
            ("timecode.hours", "10"),
            ("timecode.minutes", "20"),
            ("timecode.seconds", "30"),
            ("timecode.frame", "12"),
        ])
    );

    let again = roundtrip(&decoded);
    assert_eq!(again.layers()[0].channel_names(), vec!["R", "G", "B", "A", "Z"]);
    assert_eq!(again.attributes(), decoded.attributes());
    assert_eq!(again.layers()[0].attributes(), layer.attributes());
}

#[test]
fn standard_and_unicode_attributes_survive() {
    let layer = Layer::new(Some("ビューティー"), 1, 1)
        .with_channel("R", vec![1.0f32])
        .expect("layer")
        .with_attribute("renderingTransform", "aces_rrt")
        .with_attribute("view", "left")
        .with_attribute("whiteLuminance", "100")
        .with_attribute("artist", "Zoë 🎨");
    let image = Image::from_layer(layer)
        .with_attribute("city", "東京")
        .with_attribute("pixel_aspect", "1.5")
        .with_attribute("timecode.hours", "1")
        .with_attribute("timecode.minutes", "0")
        .with_attribute("timecode.seconds", "0")
        .with_attribute("timecode.frame", "7");

    let decoded = roundtrip(&image);
    assert_eq!(decoded.layers()[0].name(), Some("ビューティー"));
    assert_eq!(decoded.attributes(), image.attributes());
    assert_eq!(decoded.layers()[0].attributes(), image.layers()[0].attributes());

    let rejected = Image::from_layer(
        Layer::new(None, 1, 1)
            .with_channel("R", vec![0.0f32])
            .expect("layer")
            .with_attribute("framesPerSecond", "24"),
    );
    assert!(matches!(encode(&rejected), Err(exrio_io::IoError::InvalidAttribute(_))));
}
