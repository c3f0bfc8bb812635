//! Raster backend trait and shared error type.
//!
//! The [`RasterBackend`] trait is the drawing environment the pipeline runs
//! against: whether a fast, orientation-aware bitmap decoder is present, how
//! a raster serializes to a data URL, and how it encodes to a lossy format.
//! Geometry and resampling stay out of the trait; they are plain functions
//! in [`transform`](super::transform) so they behave the same on every
//! backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the recording
//! `MockBackend` below to count probes and force failures.

use super::file::Blob;
use super::format::OutputFormat;
use super::params::Quality;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Image load failed: {0}")]
    Load(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),
    #[error("No encoder available for {0}")]
    EncoderUnavailable(&'static str),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The environment rasters are decoded, drawn and serialized in.
pub trait RasterBackend: Sync {
    /// Whether the fast bitmap decoder (which applies EXIF orientation) is
    /// available. When it is not, loading goes through an object URL.
    fn supports_bitmap_decode(&self) -> bool;

    /// Serialize to a `data:` URL of the requested type.
    ///
    /// Unknown or unsupported types fall back to PNG, so the URL's scheme
    /// prefix tells the caller which encoder actually ran.
    fn to_data_url(&self, image: &DynamicImage, mime: &str) -> Result<String, ImageError>;

    /// Encode to `format` at `quality`.
    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Blob, ImageError>;
}
