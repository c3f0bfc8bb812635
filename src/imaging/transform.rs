//! Raster drawing: resample, rotate onto a padded canvas, cut out a region.
//!
//! These are the pixel-level counterparts of [`calculations`](super::calculations).
//! Sizes are decided there; here they are only carried out.

use super::calculations::{canvas_extent, quarter_turns, rotated_bounds};
use super::params::CropRect;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Draw `source` onto a fresh `width`×`height` raster.
pub fn draw_scaled(source: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if source.dimensions() == (width, height) {
        return source.clone();
    }
    source.resize_exact(width, height, FilterType::Lanczos3)
}

/// Rotate `source` clockwise by `degrees` about its centre onto a canvas
/// sized to the rotated bounding box.
///
/// Quarter turns are exact pixel permutations. Other angles are resampled
/// bilinearly; corners outside the rotated image are transparent.
pub fn rotate_onto_canvas(source: &DynamicImage, degrees: f64) -> RgbaImage {
    let rgba = source.to_rgba8();
    match quarter_turns(degrees) {
        Some(0) => rgba,
        Some(1) => imageops::rotate90(&rgba),
        Some(2) => imageops::rotate180(&rgba),
        Some(_) => imageops::rotate270(&rgba),
        None => {
            let (width, height) = rgba.dimensions();
            let (bound_w, bound_h) = rotated_bounds(width, height, degrees);
            let mut canvas = RgbaImage::new(canvas_extent(bound_w), canvas_extent(bound_h));
            // Origin to the canvas centre, rotate, then draw the source centred on it.
            let projection = Projection::translate(bound_w as f32 / 2.0, bound_h as f32 / 2.0)
                * Projection::rotate(degrees.to_radians() as f32)
                * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);
            warp_into(
                &rgba,
                &projection,
                Interpolation::Bilinear,
                TRANSPARENT,
                &mut canvas,
            );
            canvas
        }
    }
}

/// Copy `rect` out of `canvas` and draw it into a `width`×`height` raster.
///
/// Parts of `rect` outside the canvas come out transparent.
pub fn draw_region(canvas: &RgbaImage, rect: CropRect, width: u32, height: u32) -> RgbaImage {
    let region = if rect.fits_within(canvas.width(), canvas.height()) {
        imageops::crop_imm(canvas, rect.x, rect.y, rect.width, rect.height).to_image()
    } else {
        let mut region = RgbaImage::from_pixel(rect.width, rect.height, TRANSPARENT);
        imageops::replace(&mut region, canvas, -(rect.x as i64), -(rect.y as i64));
        region
    };
    if region.dimensions() == (width, height) {
        region
    } else {
        imageops::resize(&region, width, height, FilterType::Lanczos3)
    }
}
