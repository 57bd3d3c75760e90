//! Shared test utilities for the imgbatch test suite.
//!
//! Synthetic images are generated in memory with the `image` encoders, so no
//! binary fixtures need to live in the repository.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let exif = exif_block(Some(6), true);
//! let bytes = jpeg_with_exif(40, 20, &exif);
//! let raster = RustCodec::new().decode(&bytes).unwrap();
//! assert_eq!(raster.orientation, 6);
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use img_parts::ImageEXIF;
use img_parts::jpeg::Jpeg;

// =========================================================================
// EXIF blocks
// =========================================================================

/// Little-endian TIFF block with only the requested IFD0 entries.
///
/// - `orientation`: Orientation tag (SHORT), written as given, even out of range
/// - `gps`: GPS IFD pointer (LONG) to an empty GPS IFD
pub fn exif_block(orientation: Option<u16>, gps: bool) -> Vec<u8> {
    let count = orientation.is_some() as u16 + gps as u16;
    let gps_ifd_offset = 8 + 2 + 12 * count as u32 + 4;

    let mut block = Vec::new();
    block.extend_from_slice(b"II");
    block.extend_from_slice(&42u16.to_le_bytes());
    block.extend_from_slice(&8u32.to_le_bytes());
    block.extend_from_slice(&count.to_le_bytes());

    if let Some(value) = orientation {
        block.extend_from_slice(&0x0112u16.to_le_bytes());
        block.extend_from_slice(&3u16.to_le_bytes());
        block.extend_from_slice(&1u32.to_le_bytes());
        block.extend_from_slice(&value.to_le_bytes());
        block.extend_from_slice(&[0, 0]);
    }
    if gps {
        block.extend_from_slice(&0x8825u16.to_le_bytes());
        block.extend_from_slice(&4u16.to_le_bytes());
        block.extend_from_slice(&1u32.to_le_bytes());
        block.extend_from_slice(&gps_ifd_offset.to_le_bytes());
    }
    // Next IFD: none
    block.extend_from_slice(&0u32.to_le_bytes());

    if gps {
        block.extend_from_slice(&0u16.to_le_bytes());
        block.extend_from_slice(&0u32.to_le_bytes());
    }
    block
}

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// A gradient JPEG (quality 90) of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A gradient PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A gradient JPEG carrying `exif` in its APP1 segment.
pub fn jpeg_with_exif(width: u32, height: u32, exif: &[u8]) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(jpeg_bytes(width, height).into()).unwrap();
    jpeg.set_exif(Some(exif.to_vec().into()));
    let mut buf = Vec::new();
    jpeg.encoder().write_to(&mut buf).unwrap();
    buf
}

#[test]
fn exif_block_layout() {
    let block = exif_block(Some(6), true);
    // header 8 + count 2 + 2 entries + next IFD 4 + empty GPS IFD 6
    assert_eq!(block.len(), 8 + 2 + 24 + 4 + 6);
    assert_eq!(&block[..4], b"II\x2a\x00");
}

#[test]
fn jpeg_with_exif_round_trips_block() {
    let exif = exif_block(Some(3), false);
    let bytes = jpeg_with_exif(8, 8, &exif);
    let jpeg = Jpeg::from_bytes(bytes.into()).unwrap();
    assert_eq!(jpeg.exif().unwrap().as_ref(), exif.as_slice());
}
