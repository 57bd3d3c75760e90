//! Metadata policy applied between decode and resize.
//!
//! Two modes, chosen per batch:
//!
//! - **keep_all**: the raster goes through untouched. The codec re-embeds the
//!   carried EXIF block and ICC profile byte-for-byte when the output container
//!   can hold them (JPEG, PNG, WebP).
//!
//! - **strip_all**: the EXIF block is dropped entirely. That removes GPS
//!   position, camera make/model/serial, capture timestamps, thumbnails and
//!   every other IFD in one go. Before dropping it the orientation is baked into
//!   the pixels, so the photo still displays upright and the output carries
//!   orientation 1.
//!
//! The ICC profile survives both modes: it describes colour, not the
//! photographer, and dropping it visibly shifts colours in wide-gamut images.
//! IPTC and XMP never make it past decode in either mode.

use crate::imaging::{MetadataBlock, RasterImage, apply_orientation};
use crate::types::PrivacyMode;

/// Apply the privacy policy to a decoded raster.
///
/// Idempotent: applying the same mode twice yields the same raster.
pub fn apply(image: RasterImage, mode: PrivacyMode) -> RasterImage {
    match mode {
        PrivacyMode::KeepAll => image,
        PrivacyMode::StripAll => strip(image),
    }
}

fn strip(image: RasterImage) -> RasterImage {
    let pixels = apply_orientation(image.pixels, image.orientation);
    let metadata = image
        .metadata
        .and_then(|m| m.icc_profile)
        .map(|icc| MetadataBlock {
            exif: None,
            icc_profile: Some(icc),
        });

    RasterImage {
        pixels,
        source_format: image.source_format,
        metadata,
        orientation: 1,
    }
}
