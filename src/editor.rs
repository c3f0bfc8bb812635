//! State behind the crop/rotate/zoom editor.
//!
//! The session records what the user has dialled in: quarter-turn rotation,
//! zoom, aspect preset, the crop offset the drag handles report and the last
//! crop area in rotated-canvas pixels. [`EditorSession::apply`] hands the
//! area and rotation to the crop transform and names the result after the
//! file being edited.

use crate::imaging::file::strip_extension;
use crate::imaging::{CropRect, ImageError, ImageFile, PrepOptions, Processor, RasterBackend};

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;
/// Zoom slider increment.
pub const ZOOM_STEP: f64 = 0.1;

/// Extension used when a crop result carries none.
const FALLBACK_EXTENSION: &str = ".jpg";

/// Aspect ratios offered in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectPreset {
    /// The image's own ratio.
    #[default]
    Original,
    Square,
    Landscape4x3,
    Portrait3x4,
    Wide16x9,
    Tall9x16,
}

impl AspectPreset {
    pub const ALL: [AspectPreset; 6] = [
        AspectPreset::Original,
        AspectPreset::Square,
        AspectPreset::Landscape4x3,
        AspectPreset::Portrait3x4,
        AspectPreset::Wide16x9,
        AspectPreset::Tall9x16,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AspectPreset::Original => "Original",
            AspectPreset::Square => "1:1",
            AspectPreset::Landscape4x3 => "4:3",
            AspectPreset::Portrait3x4 => "3:4",
            AspectPreset::Wide16x9 => "16:9",
            AspectPreset::Tall9x16 => "9:16",
        }
    }

    /// Fixed width/height ratio, `None` for [`AspectPreset::Original`].
    pub fn ratio(self) -> Option<f64> {
        match self {
            AspectPreset::Original => None,
            AspectPreset::Square => Some(1.0),
            AspectPreset::Landscape4x3 => Some(4.0 / 3.0),
            AspectPreset::Portrait3x4 => Some(3.0 / 4.0),
            AspectPreset::Wide16x9 => Some(16.0 / 9.0),
            AspectPreset::Tall9x16 => Some(9.0 / 16.0),
        }
    }
}

impl std::str::FromStr for AspectPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectPreset::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown aspect preset {s:?}"))
    }
}

/// Crop handle offset, in display units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// One editing session over one image.
#[derive(Debug, Clone)]
pub struct EditorSession {
    file_name: String,
    rotation: u16,
    zoom: f64,
    aspect: AspectPreset,
    offset: Offset,
    crop_area: Option<CropRect>,
}

impl EditorSession {
    /// Start editing the file called `file_name`.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            rotation: 0,
            zoom: MIN_ZOOM,
            aspect: AspectPreset::Original,
            offset: Offset::default(),
            crop_area: None,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Rotation in degrees: 0, 90, 180 or 270.
    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    /// Turn a further 90° clockwise.
    pub fn rotate(&mut self) {
        self.rotation = (self.rotation + 90) % 360;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom, snapped to the slider step and clamped to its range.
    /// Non-finite input is ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            let snapped = (zoom / ZOOM_STEP).round() * ZOOM_STEP;
            self.zoom = snapped.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn aspect(&self) -> AspectPreset {
        self.aspect
    }

    /// Switch preset. The crop offset goes back to the centre.
    pub fn set_aspect(&mut self, aspect: AspectPreset) {
        self.aspect = aspect;
        self.offset = Offset::default();
    }

    /// Ratio the crop frame should use for an image of the given natural size.
    pub fn resolved_aspect(&self, natural_width: u32, natural_height: u32) -> f64 {
        self.aspect.ratio().unwrap_or_else(|| {
            if natural_height == 0 {
                1.0
            } else {
                natural_width as f64 / natural_height as f64
            }
        })
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Offset) {
        self.offset = offset;
    }

    /// Last crop area reported by the frame, in rotated-canvas pixels.
    pub fn crop_area(&self) -> Option<CropRect> {
        self.crop_area
    }

    pub fn set_crop_area(&mut self, area: CropRect) {
        self.crop_area = Some(area);
    }

    /// Back to the state of a fresh session on the same file.
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.file_name));
    }

    /// Crop the image behind `image_src` with the current settings.
    ///
    /// Returns `Ok(None)` when no crop area has been reported yet. The result
    /// keeps the edited file's name with the output format's extension.
    pub fn apply<B: RasterBackend>(
        &self,
        processor: &Processor<B>,
        image_src: &str,
        options: &PrepOptions,
    ) -> Result<Option<ImageFile>, ImageError> {
        let Some(area) = self.crop_area else {
            return Ok(None);
        };
        let cropped =
            processor.crop_image(image_src, area, f64::from(self.rotation), options)?;
        let extension = match cropped.name.rfind('.') {
            Some(dot) if dot + 1 < cropped.name.len() => &cropped.name[dot..],
            _ => FALLBACK_EXTENSION,
        };
        let name = format!("{}{extension}", strip_extension(&self.file_name));
        Ok(Some(ImageFile { name, ..cropped }))
    }
}
