//! Pixel operations applied between decode and encode.
//!
//! These functions combine the pure calculations with the `image` crate's
//! resampling and geometry primitives. None of them can fail.

use super::backend::RasterImage;
use super::calculations::calculate_target_dimensions;
use image::DynamicImage;
use image::imageops::FilterType;

/// Resampling filter used for every downscale.
///
/// Lanczos3 is deterministic: identical input and target always produce
/// identical pixels.
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Downscale so the image *displays* `target_width` wide, keeping the aspect
/// ratio.
///
/// The width is measured after orientation: a stored 400x200 frame tagged
/// orientation 6 displays 200x400, so a target of 100 resizes the stored
/// pixels to 200x100. Passes the image through untouched when no width is
/// given or the image already displays at most that wide.
pub fn resize(image: RasterImage, target_width: Option<u32>) -> RasterImage {
    let shown = image.display_dimensions();
    let Some((shown_w, shown_h)) =
        calculate_target_dimensions((shown.width, shown.height), target_width)
    else {
        return image;
    };
    let (width, height) = if image.is_transposed() {
        (shown_h, shown_w)
    } else {
        (shown_w, shown_h)
    };

    RasterImage {
        pixels: image.pixels.resize_exact(width, height, RESIZE_FILTER),
        ..image
    }
}

/// Rotate/flip pixels so that they display upright without an EXIF
/// orientation tag.
///
/// Values follow the EXIF Orientation tag (1 = as stored … 8 = 90° CCW).
/// Unknown values leave the pixels as they are.
pub fn apply_orientation(pixels: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => pixels.fliph(),
        3 => pixels.rotate180(),
        4 => pixels.flipv(),
        5 => pixels.rotate90().fliph(),
        6 => pixels.rotate90(),
        7 => pixels.rotate270().fliph(),
        8 => pixels.rotate270(),
        _ => pixels,
    }
}
