//! High-level image operations.
//!
//! These combine the pure calculations, the raster transforms and a backend.
//! A [`Processor`] owns the per-process state the operations share: the
//! backend, the memoized output format and the object URL registry.
//!
//! Two error policies live side by side:
//!
//! - Compression degrades. [`Processor::compress`] never fails; any problem
//!   is logged and the original file comes back. [`Processor::try_compress`]
//!   is the same pipeline with the error surfaced.
//! - Cropping is explicit. [`Processor::crop_image`] returns every failure,
//!   since the user asked for that exact output.
//!
//! The free functions at the bottom run against a process-wide
//! [`RustBackend`] processor.

use super::backend::{Dimensions, ImageError, RasterBackend};
use super::calculations::{fit_dimensions, fit_scale, scaled_dimensions};
use super::file::{Blob, ImageFile, to_file};
use super::format::{FormatDetector, OutputFormat};
use super::loader::{DecodePath, LoadedImage, load_element};
use super::params::{CropRect, PrepOptions};
use super::rust_backend::RustBackend;
use super::source::{ObjectUrl, ObjectUrlStore};
use super::transform::{draw_region, draw_scaled, rotate_onto_canvas};
use image::DynamicImage;
use rayon::prelude::*;
use std::sync::LazyLock;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// File name stem used for every crop output.
const CROPPED_STEM: &str = "cropped";

/// Outcome of a compression attempt.
#[derive(Debug, Clone)]
pub enum Compression {
    /// Already within bounds and in the output format; nothing was encoded.
    Unchanged,
    Reencoded {
        file: ImageFile,
        source: Dimensions,
        output: Dimensions,
    },
}

/// Backend plus the state shared by every operation run against it.
pub struct Processor<B: RasterBackend> {
    backend: B,
    formats: FormatDetector,
    objects: ObjectUrlStore,
}

impl<B: RasterBackend> Processor<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            formats: FormatDetector::new(),
            objects: ObjectUrlStore::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn objects(&self) -> &ObjectUrlStore {
        &self.objects
    }

    /// Register `file` under a display URL that [`crop_image`](Self::crop_image)
    /// can load. The URL stays live until the guard is dropped.
    pub fn create_object_url(&self, file: &ImageFile) -> ObjectUrl<'_> {
        self.objects.create(file)
    }

    /// The output format, probed on first use and cached after.
    pub fn resolve_output_format(&self) -> Result<OutputFormat> {
        self.formats.resolve(&self.backend)
    }

    /// Decode `file` through whichever path the backend supports.
    pub fn load_image(&self, file: &ImageFile) -> Result<LoadedImage> {
        let path = DecodePath::select(&self.backend);
        log::debug!("Loading {} via {:?} path", file.name, path);
        path.load(file, &self.objects)
    }

    /// Resize and re-encode `file`, reporting any failure.
    pub fn try_compress(&self, file: &ImageFile, options: &PrepOptions) -> Result<Compression> {
        let loaded = self.load_image(file)?;
        let format = self.resolve_output_format()?;

        let scale = fit_scale(loaded.width, loaded.height, options.max_dimension);
        if scale == 1.0 && file.mime == format.mime() {
            log::debug!("{} already fits as {format}, keeping it", file.name);
            return Ok(Compression::Unchanged);
        }

        let (width, height) = scaled_dimensions(loaded.width, loaded.height, scale);
        let drawn = draw_scaled(&loaded.source, width, height);
        let blob = self.encode(&drawn, format, options)?;
        let name = format!("{}{}", file.stem(), format.extension());

        Ok(Compression::Reencoded {
            file: to_file(blob, name, None),
            source: Dimensions::new(loaded.width, loaded.height),
            output: Dimensions::new(width, height),
        })
    }

    /// Resize and re-encode `file`. Never fails: on any error the original
    /// file is returned as is.
    pub fn compress(&self, file: ImageFile, options: &PrepOptions) -> ImageFile {
        match self.try_compress(&file, options) {
            Ok(Compression::Reencoded { file: compressed, source, output }) => {
                log::debug!(
                    "Compressed {} ({source}, {} bytes) -> {} ({output}, {} bytes)",
                    file.name,
                    file.size(),
                    compressed.name,
                    compressed.size()
                );
                compressed
            }
            Ok(Compression::Unchanged) => file,
            Err(e) => {
                log::warn!("Compression failed for {}, using original: {e}", file.name);
                file
            }
        }
    }

    /// Compress every file independently on the rayon pool.
    ///
    /// Results come back in input order.
    pub fn compress_batch(&self, files: Vec<ImageFile>, options: &PrepOptions) -> Vec<ImageFile> {
        files
            .into_par_iter()
            .map(|file| self.compress(file, options))
            .collect()
    }

    /// Rotate the image behind `image_src` by `rotation` degrees, cut out
    /// `crop` (in rotated-canvas coordinates) and encode the result.
    ///
    /// The source is loaded without orientation correction. The canvas is
    /// built from the natural (EXIF-ignored) dimensions and rotated first;
    /// `crop` addresses pixels of that rotated canvas, not of the source.
    pub fn crop_image(
        &self,
        image_src: &str,
        crop: CropRect,
        rotation: f64,
        options: &PrepOptions,
    ) -> Result<ImageFile> {
        let format = self.resolve_output_format()?;
        let source = load_element(image_src, &self.objects)?;

        let canvas = rotate_onto_canvas(&source, rotation);
        let (width, height) = fit_dimensions(crop.width, crop.height, options.max_dimension);
        log::debug!(
            "Cropping {}x{} at ({}, {}) from a {}x{} canvas rotated {rotation}°, output {width}x{height}",
            crop.width,
            crop.height,
            crop.x,
            crop.y,
            canvas.width(),
            canvas.height()
        );
        let region = DynamicImage::ImageRgba8(draw_region(&canvas, crop, width, height));
        let blob = self.encode(&region, format, options)?;

        Ok(to_file(
            blob,
            format!("{CROPPED_STEM}{}", format.extension()),
            None,
        ))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        options: &PrepOptions,
    ) -> Result<Blob> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ImageError::Encode(format!(
                "nothing to encode: {}x{} raster",
                image.width(),
                image.height()
            )));
        }
        self.backend.encode(image, format, options.quality)
    }
}

impl Default for Processor<RustBackend> {
    fn default() -> Self {
        Self::new(RustBackend::new())
    }
}

static DEFAULT_PROCESSOR: LazyLock<Processor<RustBackend>> = LazyLock::new(Processor::default);

/// The process-wide processor behind the free functions.
pub fn default_processor() -> &'static Processor<RustBackend> {
    &DEFAULT_PROCESSOR
}

/// [`Processor::resolve_output_format`] on the default processor.
pub fn resolve_output_format() -> Result<OutputFormat> {
    DEFAULT_PROCESSOR.resolve_output_format()
}

/// [`Processor::load_image`] on the default processor.
pub fn load_image(file: &ImageFile) -> Result<LoadedImage> {
    DEFAULT_PROCESSOR.load_image(file)
}

/// [`Processor::try_compress`] on the default processor.
pub fn try_compress(file: &ImageFile, options: &PrepOptions) -> Result<Compression> {
    DEFAULT_PROCESSOR.try_compress(file, options)
}

/// [`Processor::compress`] on the default processor.
pub fn compress(file: ImageFile, options: &PrepOptions) -> ImageFile {
    DEFAULT_PROCESSOR.compress(file, options)
}

/// [`Processor::compress_batch`] on the default processor.
pub fn compress_batch(files: Vec<ImageFile>, options: &PrepOptions) -> Vec<ImageFile> {
    DEFAULT_PROCESSOR.compress_batch(files, options)
}

/// [`Processor::crop_image`] on the default processor.
pub fn crop_image(
    image_src: &str,
    crop: CropRect,
    rotation: f64,
    options: &PrepOptions,
) -> Result<ImageFile> {
    DEFAULT_PROCESSOR.crop_image(image_src, crop, rotation, options)
}

/// [`Processor::create_object_url`] on the default processor.
pub fn create_object_url(file: &ImageFile) -> ObjectUrl<'static> {
    default_processor().create_object_url(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp, oriented_jpeg};
    use crate::imaging::params::Quality;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([80, 60, 40])));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn jpeg(name: &str, width: u32, height: u32) -> ImageFile {
        ImageFile::new(name, "image/jpeg", encoded(width, height, ImageFormat::Jpeg))
    }

    fn png(name: &str, width: u32, height: u32) -> ImageFile {
        ImageFile::new(name, "image/png", encoded(width, height, ImageFormat::Png))
    }

    fn reencoded(result: Compression) -> (ImageFile, Dimensions, Dimensions) {
        match result {
            Compression::Reencoded { file, source, output } => (file, source, output),
            Compression::Unchanged => panic!("expected a re-encode"),
        }
    }

    #[test]
    fn large_jpeg_is_downscaled_to_webp() {
        let processor = Processor::new(MockBackend::new());
        let result = processor
            .try_compress(&jpeg("IMG_0042.jpg", 3000, 2000), &PrepOptions::default())
            .unwrap();

        let (file, source, output) = reencoded(result);
        assert_eq!(file.name, "IMG_0042.webp");
        assert_eq!(file.mime, "image/webp");
        assert_eq!(source, Dimensions::new(3000, 2000));
        assert_eq!(output, Dimensions::new(1600, 1067));
        assert_eq!(
            processor.backend().encodes(),
            vec![RecordedOp::Encode {
                format: OutputFormat::WebP,
                width: 1600,
                height: 1067,
                quality: 80,
            }]
        );
    }

    #[test]
    fn small_file_in_output_format_is_returned_untouched() {
        let processor = Processor::new(MockBackend::without_webp());
        let original = jpeg("small.jpg", 800, 600);

        let out = processor.compress(original.clone(), &PrepOptions::default());

        assert!(out.shares_payload(&original));
        assert_eq!(out.name, "small.jpg");
        assert!(processor.backend().encodes().is_empty());
    }

    #[test]
    fn small_file_in_other_format_is_converted_without_resizing() {
        let processor = Processor::new(MockBackend::new());
        let out = processor.compress(png("photo.png", 640, 480), &PrepOptions::default());

        assert_eq!(out.name, "photo.webp");
        assert_eq!(out.bytes.as_ref(), b"image/webp:640x480");
    }

    #[test]
    fn jpeg_fallback_names_with_jpg() {
        let processor = Processor::new(MockBackend::without_webp());
        let out = processor.compress(png("base.coat.png", 2400, 1200), &PrepOptions::default());

        assert_eq!(out.name, "base.coat.jpg");
        assert_eq!(out.mime, "image/jpeg");
        assert_eq!(out.bytes.as_ref(), b"image/jpeg:1600x800");
    }

    #[test]
    fn custom_options_are_honoured() {
        let processor = Processor::new(MockBackend::new());
        let options = PrepOptions {
            max_dimension: 500,
            quality: Quality::new(0.6),
        };
        processor.compress(jpeg("a.jpg", 1000, 2000), &options);

        assert_eq!(
            processor.backend().encodes(),
            vec![RecordedOp::Encode {
                format: OutputFormat::WebP,
                width: 250,
                height: 500,
                quality: 60,
            }]
        );
    }

    #[test]
    fn bitmap_path_resizes_by_the_upright_long_edge() {
        let processor = Processor::new(MockBackend::new());
        let file = ImageFile::new("side.jpg", "image/jpeg", oriented_jpeg(40, 20, 6));
        let options = PrepOptions {
            max_dimension: 20,
            ..PrepOptions::default()
        };

        let (out, source, output) = reencoded(processor.try_compress(&file, &options).unwrap());
        assert_eq!(source, Dimensions::new(20, 40));
        assert_eq!(output, Dimensions::new(10, 20));
        assert_eq!(out.bytes.as_ref(), b"image/webp:10x20");
    }

    #[test]
    fn element_path_resizes_by_the_natural_long_edge() {
        let processor = Processor::new(MockBackend::without_bitmap_decode());
        let file = ImageFile::new("side.jpg", "image/jpeg", oriented_jpeg(40, 20, 6));
        let options = PrepOptions {
            max_dimension: 20,
            ..PrepOptions::default()
        };

        let out = processor.compress(file, &options);
        assert_eq!(out.bytes.as_ref(), b"image/webp:20x10");
    }

    #[test]
    fn encode_failure_returns_original() {
        let processor = Processor::new(MockBackend::failing_encode());
        let original = jpeg("huge.jpg", 3000, 2000);

        let out = processor.compress(original.clone(), &PrepOptions::default());

        assert!(out.shares_payload(&original));
        assert_eq!(out, original);
    }

    #[test]
    fn decode_failure_returns_original() {
        let processor = Processor::new(MockBackend::new());
        let original = ImageFile::new("broken.jpg", "image/jpeg", b"not an image".to_vec());

        assert!(processor.try_compress(&original, &PrepOptions::default()).is_err());
        let out = processor.compress(original.clone(), &PrepOptions::default());
        assert!(out.shares_payload(&original));
    }

    #[test]
    fn element_fallback_compresses_and_releases_urls() {
        let processor = Processor::new(MockBackend::without_bitmap_decode());
        let out = processor.compress(jpeg("a.jpg", 2000, 1000), &PrepOptions::default());

        assert_eq!(out.bytes.as_ref(), b"image/webp:1600x800");
        assert!(processor.objects().is_empty());
    }

    #[test]
    fn element_fallback_failure_releases_urls() {
        let processor = Processor::new(MockBackend::without_bitmap_decode());
        let original = ImageFile::new("broken.png", "image/png", b"junk".to_vec());

        let out = processor.compress(original.clone(), &PrepOptions::default());

        assert!(out.shares_payload(&original));
        assert!(processor.objects().is_empty());
    }

    #[test]
    fn format_is_probed_once_across_operations() {
        let processor = Processor::new(MockBackend::new());
        let options = PrepOptions::default();
        processor.compress(jpeg("a.jpg", 2000, 100), &options);
        processor.compress(jpeg("b.jpg", 100, 2000), &options);
        processor.resolve_output_format().unwrap();

        assert_eq!(processor.backend().probe_count(), 1);
    }

    #[test]
    fn batch_keeps_input_order() {
        let processor = Processor::new(MockBackend::new());
        let options = PrepOptions {
            max_dimension: 64,
            ..PrepOptions::default()
        };
        let files: Vec<ImageFile> = (0..8)
            .map(|i| jpeg(&format!("mini-{i}.jpg"), 70 + i * 10, 40))
            .collect();

        let out = processor.compress_batch(files, &options);

        let names: Vec<&str> = out.iter().map(|f| f.name.as_str()).collect();
        let expected: Vec<String> = (0..8).map(|i| format!("mini-{i}.webp")).collect();
        assert_eq!(names, expected);
        assert_eq!(processor.backend().probe_count(), 1);
    }

    #[test]
    fn crop_without_rotation() {
        let processor = Processor::new(MockBackend::new());
        let file = png("mini.png", 800, 600);
        let url = processor.create_object_url(&file);

        let out = processor
            .crop_image(
                url.as_str(),
                CropRect::new(100, 100, 400, 300),
                0.0,
                &PrepOptions::default(),
            )
            .unwrap();

        assert_eq!(out.name, "cropped.webp");
        assert_eq!(out.mime, "image/webp");
        assert_eq!(out.bytes.as_ref(), b"image/webp:400x300");
    }

    #[test]
    fn crop_after_quarter_turn_swaps_dimensions() {
        let processor = Processor::new(MockBackend::without_webp());
        let file = png("mini.png", 800, 600);
        let url = processor.create_object_url(&file);

        let out = processor
            .crop_image(
                url.as_str(),
                CropRect::new(0, 0, 600, 800),
                90.0,
                &PrepOptions::default(),
            )
            .unwrap();

        assert_eq!(out.name, "cropped.jpg");
        assert_eq!(out.bytes.as_ref(), b"image/jpeg:600x800");
    }

    #[test]
    fn crop_output_is_bounded() {
        let processor = Processor::new(MockBackend::new());
        let file = png("big.png", 2000, 1000);
        let url = processor.create_object_url(&file);

        let out = processor
            .crop_image(
                url.as_str(),
                CropRect::new(0, 0, 2000, 1000),
                0.0,
                &PrepOptions::default(),
            )
            .unwrap();

        assert_eq!(out.bytes.as_ref(), b"image/webp:1600x800");
    }

    #[test]
    fn crop_of_revoked_url_fails() {
        let processor = Processor::new(MockBackend::new());
        let url = processor
            .create_object_url(&png("gone.png", 10, 10))
            .as_str()
            .to_string();

        let result = processor.crop_image(&url, CropRect::new(0, 0, 5, 5), 0.0, &PrepOptions::default());
        assert!(matches!(result, Err(ImageError::Load(_))));
    }

    #[test]
    fn crop_encode_failure_propagates() {
        let processor = Processor::new(MockBackend::failing_encode());
        let file = png("mini.png", 20, 20);
        let url = processor.create_object_url(&file);

        let result = processor.crop_image(
            url.as_str(),
            CropRect::new(0, 0, 10, 10),
            0.0,
            &PrepOptions::default(),
        );
        assert!(matches!(result, Err(ImageError::Encode(_))));
    }

    #[test]
    fn empty_crop_is_an_error() {
        let processor = Processor::new(MockBackend::new());
        let file = png("mini.png", 20, 20);
        let url = processor.create_object_url(&file);

        let result = processor.crop_image(
            url.as_str(),
            CropRect::new(0, 0, 0, 10),
            0.0,
            &PrepOptions::default(),
        );
        assert!(matches!(result, Err(ImageError::Encode(_))));
        assert!(processor.backend().encodes().is_empty());
    }
}
