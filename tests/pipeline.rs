//! Compression against the real encoders.
//!
//! The output format depends on whether this build carries the WebP encoder,
//! so expectations are phrased in terms of whatever the probe resolves to.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use paintpile::imaging::{
    self, Compression, ImageFile, OutputFormat, PrepOptions, Processor, Quality, RasterBackend,
    RustBackend,
};
use std::io::Cursor;
use tempfile::TempDir;

/// A gradient, so encoders have something to chew on.
fn photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn processor() -> Processor<RustBackend> {
    Processor::new(RustBackend::new())
}

#[test]
fn large_jpeg_scenario() {
    let processor = processor();
    let format = processor.resolve_output_format().unwrap();
    let input = ImageFile::new(
        "IMG_0042.jpg",
        "image/jpeg",
        encode(&photo(3000, 2000), ImageFormat::Jpeg),
    );

    let out = processor.compress(input.clone(), &PrepOptions::default());

    assert_eq!(out.name, format!("IMG_0042{}", format.extension()));
    assert_eq!(out.mime, format.mime());
    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (1600, 1067));
    assert!(out.size() < input.size());
}

#[test]
fn small_png_is_converted_without_resizing() {
    let processor = processor();
    let format = processor.resolve_output_format().unwrap();
    let input = ImageFile::new("photo.png", "image/png", encode(&photo(320, 240), ImageFormat::Png));

    let out = processor.compress(input, &PrepOptions::default());

    assert_eq!(out.name, format!("photo{}", format.extension()));
    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (320, 240));
}

#[test]
fn fitting_file_in_output_format_is_kept() {
    let processor = processor();
    let format = processor.resolve_output_format().unwrap();
    let blob = processor
        .backend()
        .encode(&photo(200, 100), format, Quality::default())
        .unwrap();
    let input = ImageFile::new(format!("ready{}", format.extension()), blob.mime, blob.bytes);

    let result = processor.try_compress(&input, &PrepOptions::default()).unwrap();
    assert!(matches!(result, Compression::Unchanged));

    let out = processor.compress(input.clone(), &PrepOptions::default());
    assert!(out.shares_payload(&input));
}

#[test]
fn never_upscales() {
    let processor = processor();
    let input = ImageFile::new("tiny.png", "image/png", encode(&photo(40, 30), ImageFormat::Png));
    let options = PrepOptions {
        max_dimension: 4000,
        quality: Quality::new(0.5),
    };

    let out = processor.compress(input, &options);
    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (40, 30));
}

#[test]
fn portrait_keeps_aspect_ratio() {
    let processor = processor();
    let input = ImageFile::new(
        "tall.png",
        "image/png",
        encode(&photo(900, 1600), ImageFormat::Png),
    );
    let options = PrepOptions {
        max_dimension: 500,
        ..PrepOptions::default()
    };

    let decoded = image::load_from_memory(&processor.compress(input, &options).bytes).unwrap();
    assert_eq!(decoded.dimensions(), (281, 500));
}

#[test]
fn transparent_png_to_jpeg_is_flattened() {
    // Forced JPEG path, regardless of this build's WebP support.
    let blob = RustBackend::new()
        .encode(
            &DynamicImage::new_rgba8(8, 8),
            OutputFormat::Jpeg,
            Quality::default(),
        )
        .unwrap();
    let decoded = image::load_from_memory(&blob.bytes).unwrap().to_rgb8();
    assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c < 8)));
}

#[test]
fn corrupt_file_comes_back_untouched() {
    let processor = processor();
    let input = ImageFile::new("broken.jpg", "image/jpeg", b"\xFF\xD8\xFF\xE0garbage".to_vec());

    assert!(processor.try_compress(&input, &PrepOptions::default()).is_err());
    let out = processor.compress(input.clone(), &PrepOptions::default());
    assert!(out.shares_payload(&input));
    assert_eq!(out.name, "broken.jpg");
}

#[test]
fn batch_preserves_order_with_real_encoders() {
    let processor = processor();
    let format = processor.resolve_output_format().unwrap();
    let files: Vec<ImageFile> = (0..6)
        .map(|i| {
            ImageFile::new(
                format!("step-{i}.png"),
                "image/png",
                encode(&photo(120 + i * 10, 80), ImageFormat::Png),
            )
        })
        .collect();
    let options = PrepOptions {
        max_dimension: 100,
        ..PrepOptions::default()
    };

    let out = processor.compress_batch(files, &options);

    for (i, file) in out.iter().enumerate() {
        assert_eq!(file.name, format!("step-{i}{}", format.extension()));
        let (w, _) = image::load_from_memory(&file.bytes).unwrap().dimensions();
        assert_eq!(w, 100);
    }
}

#[test]
fn reads_file_from_disk() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("base-coat.JPG");
    std::fs::write(&path, encode(&photo(64, 64), ImageFormat::Jpeg)).unwrap();

    let file = ImageFile::read(&path).unwrap();
    assert_eq!(file.name, "base-coat.JPG");
    assert_eq!(file.mime, "image/jpeg");

    let loaded = imaging::load_image(&file).unwrap();
    assert_eq!((loaded.width, loaded.height), (64, 64));
}

#[test]
fn probe_matches_build_features() {
    let expected = if cfg!(feature = "webp") {
        OutputFormat::WebP
    } else {
        OutputFormat::Jpeg
    };
    assert_eq!(imaging::resolve_output_format().unwrap(), expected);
}
