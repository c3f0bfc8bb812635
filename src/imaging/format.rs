//! Output format preference and its one-time capability probe.
//!
//! Every prepared photo is encoded to one format for the whole process:
//! WebP when the backend can encode it, JPEG otherwise. The probe serializes
//! a 1×1 raster asking for WebP and checks which type actually came back.
//! The answer cannot change mid-process, so it is resolved once and cached.

use super::backend::{ImageError, RasterBackend};
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use std::sync::OnceLock;

/// Lossy format every prepared photo is encoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutputFormat {
    /// Modern lossy format, preferred when the backend can encode it.
    #[serde(rename = "image/webp")]
    WebP,
    /// Universal fallback.
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl OutputFormat {
    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// Canonical extension, dot included.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => ".webp",
            OutputFormat::Jpeg => ".jpg",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/webp" => Some(OutputFormat::WebP),
            "image/jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// Memoized result of the WebP capability probe.
///
/// Written at most once; every later call returns the cached format without
/// touching the backend.
#[derive(Debug, Default)]
pub struct FormatDetector {
    resolved: OnceLock<OutputFormat>,
}

impl FormatDetector {
    pub const fn new() -> Self {
        Self {
            resolved: OnceLock::new(),
        }
    }

    /// Resolve the output format, probing `backend` on first use only.
    ///
    /// A probe error means the backend cannot serialize anything at all; it
    /// propagates and nothing is cached.
    pub fn resolve(&self, backend: &impl RasterBackend) -> Result<OutputFormat, ImageError> {
        if let Some(format) = self.resolved.get() {
            return Ok(*format);
        }
        let probed = probe(backend)?;
        // Concurrent first calls may both probe; the first stored answer wins.
        Ok(*self.resolved.get_or_init(|| probed))
    }

    /// The cached format, if a probe has completed.
    pub fn cached(&self) -> Option<OutputFormat> {
        self.resolved.get().copied()
    }

    /// Forget the cached answer so the next call probes again.
    pub fn reset(&mut self) {
        self.resolved.take();
    }
}

fn probe(backend: &impl RasterBackend) -> Result<OutputFormat, ImageError> {
    let pixel = DynamicImage::new_rgba8(1, 1);
    let url = backend.to_data_url(&pixel, OutputFormat::WebP.mime())?;
    let format = if url.starts_with("data:image/webp") {
        OutputFormat::WebP
    } else {
        OutputFormat::Jpeg
    };
    log::debug!("Output format resolved to {format}");
    Ok(format)
}
