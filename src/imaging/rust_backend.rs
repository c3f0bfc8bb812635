//! Pure Rust raster backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) + EXIF orientation | `image` crate decoders |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha flattened onto black) |
//! | Encode → WebP (lossy) | `webp` crate (libwebp), behind the `webp` feature |
//! | Data URL / PNG fallback | `image` PNG encoder + `base64` |

use super::backend::{ImageError, RasterBackend};
use super::file::Blob;
use super::format::OutputFormat;
use super::params::Quality;
use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Production backend built on the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }

    /// Whether an encoder for `format` is compiled in.
    pub fn can_encode(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Jpeg => true,
            OutputFormat::WebP => cfg!(feature = "webp"),
        }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend for RustBackend {
    fn supports_bitmap_decode(&self) -> bool {
        true
    }

    fn to_data_url(&self, image: &DynamicImage, mime: &str) -> Result<String, ImageError> {
        let blob = match OutputFormat::from_mime(mime).filter(|f| Self::can_encode(*f)) {
            Some(format) => self.encode(image, format, Quality::default())?,
            None => encode_png(image)?,
        };
        Ok(format!(
            "data:{};base64,{}",
            blob.mime,
            general_purpose::STANDARD.encode(&blob.bytes)
        ))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Blob, ImageError> {
        match format {
            OutputFormat::Jpeg => encode_jpeg(image, quality),
            OutputFormat::WebP => encode_webp(image, quality),
        }
    }
}

/// Composite onto black and drop alpha. JPEG has no alpha channel.
fn flatten_onto_black(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        Rgb([scale(r), scale(g), scale(b)])
    })
}

fn encode_jpeg(image: &DynamicImage, quality: Quality) -> Result<Blob, ImageError> {
    let flat = DynamicImage::ImageRgb8(flatten_onto_black(image));
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.percent());
    flat.write_with_encoder(encoder)
        .map_err(|e| ImageError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(Blob::new(bytes, OutputFormat::Jpeg.mime()))
}

#[cfg(feature = "webp")]
fn encode_webp(image: &DynamicImage, quality: Quality) -> Result<Blob, ImageError> {
    let rgba = image.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let memory = encoder
        .encode_simple(false, quality.value() * 100.0)
        .map_err(|e| ImageError::Encode(format!("WebP encode failed: {e:?}")))?;
    Ok(Blob::new(memory.to_vec(), OutputFormat::WebP.mime()))
}

#[cfg(not(feature = "webp"))]
fn encode_webp(_image: &DynamicImage, _quality: Quality) -> Result<Blob, ImageError> {
    Err(ImageError::EncoderUnavailable(OutputFormat::WebP.mime()))
}

fn encode_png(image: &DynamicImage) -> Result<Blob, ImageError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ImageError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(Blob::new(bytes, "image/png"))
}
