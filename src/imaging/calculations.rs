//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output size for a width-constrained downscale.
///
/// Returns `None` when no resize should happen: no target was given, or the
/// target is not smaller than the current width (images are never upscaled).
/// Otherwise the height follows the original aspect ratio, rounded to the
/// nearest pixel and never below 1.
///
/// # Examples
/// ```
/// # use imgbatch::imaging::calculate_target_dimensions;
/// // 4000x3000 down to 800 wide → 800x600
/// assert_eq!(calculate_target_dimensions((4000, 3000), Some(800)), Some((800, 600)));
///
/// // Asking for a wider image is a no-op
/// assert_eq!(calculate_target_dimensions((640, 480), Some(1024)), None);
/// ```
pub fn calculate_target_dimensions(
    original: (u32, u32),
    target_width: Option<u32>,
) -> Option<(u32, u32)> {
    let (orig_w, orig_h) = original;
    let target = target_width.filter(|&w| w > 0 && w < orig_w)?;

    let height = (orig_h as f64 * target as f64 / orig_w as f64).round() as u32;
    Some((target, height.max(1)))
}
