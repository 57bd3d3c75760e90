//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait defines the two operations the pipeline needs:
//! decode bytes into a [`RasterImage`] and encode a [`RasterImage`] back into
//! bytes of a target format. Both are pure transforms over memory; reading
//! and writing files is the worker's job.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), built on the `image` crate.

use crate::types::{OutputFormat, QualityTier};
use image::{ColorType, DynamicImage, ImageFormat};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("File is empty")]
    Empty,
    #[error("Unsupported image format: {0}")]
    Unsupported(String),
    #[error("Corrupt or truncated image data: {0}")]
    Corrupt(String),
    #[error("Image exceeds decode limits: {0}")]
    LimitExceeded(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Unsupported output format: {0}")]
    Unsupported(String),
    #[error("Encoding failed: {0}")]
    Failed(String),
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Embedded blocks carried alongside the pixels.
///
/// Both are kept byte-for-byte as found in the source container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataBlock {
    /// Raw EXIF (TIFF) block.
    pub exif: Option<Vec<u8>>,
    /// ICC colour profile.
    pub icc_profile: Option<Vec<u8>>,
}

impl MetadataBlock {
    pub fn is_empty(&self) -> bool {
        self.exif.is_none() && self.icc_profile.is_none()
    }
}

/// A decoded image moving through the pipeline.
///
/// Owned by exactly one worker; stages take it by value and hand it on.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub pixels: DynamicImage,
    /// Format sniffed from the source bytes.
    pub source_format: ImageFormat,
    pub metadata: Option<MetadataBlock>,
    /// EXIF orientation (1–8) of the stored pixels. 1 means "as stored".
    pub orientation: u16,
}

impl RasterImage {
    pub fn new(pixels: DynamicImage, source_format: ImageFormat) -> Self {
        Self {
            pixels,
            source_format,
            metadata: None,
            orientation: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Whether the orientation swaps width and height on display (EXIF 5–8).
    pub fn is_transposed(&self) -> bool {
        matches!(self.orientation, 5..=8)
    }

    /// Size as a viewer shows it, after applying the orientation.
    pub fn display_dimensions(&self) -> Dimensions {
        let Dimensions { width, height } = self.dimensions();
        if self.is_transposed() {
            Dimensions {
                width: height,
                height: width,
            }
        } else {
            Dimensions { width, height }
        }
    }

    pub fn color(&self) -> ColorType {
        self.pixels.color()
    }

    pub fn exif(&self) -> Option<&[u8]> {
        self.metadata.as_ref().and_then(|m| m.exif.as_deref())
    }
}

/// Encoded bytes plus the dimensions actually written.
///
/// The dimensions can differ from the raster's when the encoder had to bake
/// orientation into pixels for a container that cannot carry EXIF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
}

/// Trait for image codecs.
///
/// `Sync` so a single codec can be shared across the worker pool.
pub trait ImageCodec: Sync {
    /// Decode image bytes, detecting the format from content.
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError>;

    /// Encode to `format` at the given tier, re-embedding carried metadata
    /// where the container supports it.
    fn encode(
        &self,
        image: &RasterImage,
        format: OutputFormat,
        quality: QualityTier,
    ) -> Result<EncodedImage, EncodeError>;
}
