//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! They take and return plain numbers so the compression and crop paths can
//! be reasoned about without a raster in hand.

/// Scale factor that brings the longer edge down to `max_dimension`.
///
/// Never above `1.0`: images already within the bound are not enlarged.
///
/// # Examples
/// ```
/// # use paintpile::imaging::fit_scale;
/// assert_eq!(fit_scale(3000, 2000, 1600), 1600.0 / 3000.0);
/// assert_eq!(fit_scale(800, 600, 1600), 1.0);
/// ```
pub fn fit_scale(width: u32, height: u32, max_dimension: u32) -> f64 {
    let longer_edge = width.max(height);
    if longer_edge > max_dimension {
        max_dimension as f64 / longer_edge as f64
    } else {
        1.0
    }
}

/// Apply a scale factor and round each edge to the nearest whole pixel.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    (
        (width as f64 * scale).round() as u32,
        (height as f64 * scale).round() as u32,
    )
}

/// Output dimensions for a `width`×`height` raster bounded by `max_dimension`.
///
/// # Examples
/// ```
/// # use paintpile::imaging::fit_dimensions;
/// // 3000x2000 landscape capped at 1600 on the long edge
/// assert_eq!(fit_dimensions(3000, 2000, 1600), (1600, 1067));
/// ```
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    scaled_dimensions(width, height, fit_scale(width, height, max_dimension))
}

/// Number of clockwise quarter turns when `degrees` is a multiple of 90.
pub fn quarter_turns(degrees: f64) -> Option<u8> {
    let turned = degrees.rem_euclid(360.0);
    if turned % 90.0 == 0.0 {
        Some((turned / 90.0) as u8 % 4)
    } else {
        None
    }
}

/// `(|sin θ|, |cos θ|)` for an angle in degrees.
///
/// Quarter turns return exact zeros and ones rather than the `6e-17`
/// residue of `cos(π/2)`.
fn abs_sin_cos(degrees: f64) -> (f64, f64) {
    match quarter_turns(degrees) {
        Some(0 | 2) => (0.0, 1.0),
        Some(_) => (1.0, 0.0),
        None => {
            let radians = degrees.to_radians();
            (radians.sin().abs(), radians.cos().abs())
        }
    }
}

/// Axis-aligned bounding box of a `width`×`height` rectangle rotated by
/// `degrees` about its centre.
///
/// ```text
/// rotated_w = w·|cos θ| + h·|sin θ|
/// rotated_h = w·|sin θ| + h·|cos θ|
/// ```
///
/// # Examples
/// ```
/// # use paintpile::imaging::rotated_bounds;
/// assert_eq!(rotated_bounds(800, 600, 90.0), (600.0, 800.0));
/// ```
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (f64, f64) {
    let (sin, cos) = abs_sin_cos(degrees);
    let (w, h) = (width as f64, height as f64);
    (w * cos + h * sin, w * sin + h * cos)
}

/// Whole-pixel extent of a raster sized from a fractional length.
///
/// Truncates, the way assigning a fractional width to a drawing surface
/// does. Negative and NaN lengths give an empty extent.
pub fn canvas_extent(length: f64) -> u32 {
    if length.is_nan() || length <= 0.0 {
        0
    } else {
        length.trunc() as u32
    }
}
