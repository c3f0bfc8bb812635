//! Decoding input files into rasters.
//!
//! Two decode paths, chosen per call from what the backend offers:
//!
//! - [`DecodePath::Bitmap`]: the fast path. Reads the EXIF orientation and
//!   applies it, so `width`/`height` describe the upright image.
//! - [`DecodePath::Element`]: the fallback. Registers a temporary object URL,
//!   loads through it and reports the *natural* dimensions, with no
//!   orientation correction. The URL is revoked whether or not the load
//!   succeeds.
//!
//! The two paths disagree on photos whose EXIF data says "rotated". That gap
//! is kept as is: reconciling it would change crop output for such photos.

use super::backend::{ImageError, RasterBackend};
use super::file::ImageFile;
use super::source::{ImageSource, ObjectUrlStore};
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use std::io::Cursor;

/// How a raster was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    Bitmap,
    Element,
}

impl DecodePath {
    /// The fast path when the backend has it, the element fallback otherwise.
    pub fn select(backend: &impl RasterBackend) -> Self {
        if backend.supports_bitmap_decode() {
            DecodePath::Bitmap
        } else {
            DecodePath::Element
        }
    }

    pub fn load(self, file: &ImageFile, objects: &ObjectUrlStore) -> Result<LoadedImage, ImageError> {
        let source = match self {
            DecodePath::Bitmap => decode_bitmap(&file.bytes)?,
            DecodePath::Element => {
                let url = objects.create(file);
                load_element(url.as_str(), objects)?
            }
        };
        Ok(LoadedImage::new(source, self))
    }
}

/// A decoded raster and the dimensions the decode path reported.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub source: DynamicImage,
    pub width: u32,
    pub height: u32,
    pub path: DecodePath,
}

impl LoadedImage {
    fn new(source: DynamicImage, path: DecodePath) -> Self {
        let (width, height) = source.dimensions();
        Self {
            source,
            width,
            height,
            path,
        }
    }
}

/// Decode and apply the EXIF orientation, if any.
pub fn decode_bitmap(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    let mut image =
        DynamicImage::from_decoder(decoder).map_err(|e| ImageError::Decode(e.to_string()))?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Load a source string the way an image element would: natural
/// dimensions, orientation metadata ignored.
pub fn load_element(src: &str, objects: &ObjectUrlStore) -> Result<DynamicImage, ImageError> {
    let bytes = ImageSource::parse(src)?.fetch(objects)?;
    image::load_from_memory(&bytes).map_err(|e| ImageError::Load(e.to_string()))
}
