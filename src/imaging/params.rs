//! Parameter types for encoding.
//!
//! These structs describe *what* to encode, not *how*. [`plan_encode`] turns
//! the caller's format + quality tier into concrete encoder settings, and the
//! [`backend`](super::backend) executes them. Keeping the mapping here makes
//! it testable without touching pixels.
//!
//! ## Tier mapping
//!
//! | Format | `high` | `medium` | `low` | Meaning |
//! |---|---|---|---|---|
//! | JPEG | 90 | 75 | 60 | encoder quality (configurable) |
//! | PNG | fast | default | best | zlib effort; lossless, pixels identical |
//! | GIF | 1 | 10 | 30 | quantizer speed (1 = most accurate palette) |
//! | WebP | — | — | — | lossless encoder, tier is a no-op |
//! | BMP | — | — | — | uncompressed, tier is a no-op |

use crate::types::{OutputFormat, QualityTier};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// JPEG quality per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegPresets {
    pub high: Quality,
    pub medium: Quality,
    pub low: Quality,
}

impl JpegPresets {
    pub fn for_tier(&self, tier: QualityTier) -> Quality {
        match tier {
            QualityTier::High => self.high,
            QualityTier::Medium => self.medium,
            QualityTier::Low => self.low,
        }
    }
}

impl Default for JpegPresets {
    fn default() -> Self {
        Self {
            high: Quality(90),
            medium: Quality(75),
            low: Quality(60),
        }
    }
}

/// How hard the PNG encoder works on compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngEffort {
    Fast,
    Default,
    Best,
}

/// Fully resolved encoder settings for one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeParams {
    Jpeg { quality: Quality },
    Png { effort: PngEffort },
    Gif { speed: i32 },
    WebP,
    Bmp,
}

/// Resolve the encoder settings for a format and tier.
pub fn plan_encode(format: OutputFormat, tier: QualityTier, jpeg: &JpegPresets) -> EncodeParams {
    match format {
        OutputFormat::Jpeg => EncodeParams::Jpeg {
            quality: jpeg.for_tier(tier),
        },
        OutputFormat::Png => EncodeParams::Png {
            effort: match tier {
                QualityTier::High => PngEffort::Fast,
                QualityTier::Medium => PngEffort::Default,
                QualityTier::Low => PngEffort::Best,
            },
        },
        OutputFormat::Gif => EncodeParams::Gif {
            speed: match tier {
                QualityTier::High => 1,
                QualityTier::Medium => 10,
                QualityTier::Low => 30,
            },
        },
        OutputFormat::Webp => EncodeParams::WebP,
        OutputFormat::Bmp => EncodeParams::Bmp,
    }
}
