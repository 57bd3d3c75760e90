//! Production codec built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format sniffing | `image::ImageReader::with_guessed_format` (magic bytes, never the extension) |
//! | Decode (JPEG, PNG, GIF, WebP, BMP) | `image` crate (pure Rust decoders) |
//! | EXIF / ICC extraction and re-embedding | `img-parts` (JPEG APP1/APP2, PNG eXIf/iCCP, WebP chunks) |
//! | Orientation | `kamadak-exif` (`Reader::read_raw`, primary IFD) |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG | `PngEncoder::new_with_quality`, adaptive filtering |
//! | Encode → GIF | `GifEncoder::new_with_speed` (NeuQuant palette) |
//! | Encode → WebP | `WebPEncoder::new_lossless` |
//! | Encode → BMP | `BmpEncoder` |
//!
//! GIF and BMP cannot hold EXIF, so when the raster still carries a non-upright
//! orientation the encoder bakes it into a copy of the pixels first.

use super::backend::{
    DecodeError, Dimensions, EncodeError, EncodedImage, ImageCodec, MetadataBlock, RasterImage,
};
use super::operations::apply_orientation;
use super::params::{EncodeParams, JpegPresets, PngEffort, plan_encode};
use crate::types::{OutputFormat, QualityTier};
use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, ExtendedColorType, ImageError, ImageFormat, ImageReader};
use img_parts::{DynImage, ImageEXIF, ImageICC};
use std::borrow::Cow;
use std::io::Cursor;

/// Formats whose decoders are compiled in (see the `image` features in Cargo.toml).
const DECODABLE: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// File extensions worth handing to the decoder when expanding a directory.
///
/// Only used for directory walks. Explicitly listed files are always tried,
/// since the format is detected from content.
pub fn supported_input_extensions() -> &'static [&'static str] {
    SUPPORTED_EXTENSIONS
}

/// Upper bounds enforced while decoding.
///
/// A header claiming larger dimensions (or a decode that would allocate more)
/// fails with [`DecodeError::LimitExceeded`] before pixels are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub max_alloc_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_width: 16_384,
            max_height: 16_384,
            max_alloc_bytes: 512 * 1024 * 1024,
        }
    }
}

impl DecodeLimits {
    fn to_image_limits(self) -> image::Limits {
        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.max_width);
        limits.max_image_height = Some(self.max_height);
        limits.max_alloc = Some(self.max_alloc_bytes);
        limits
    }
}

/// Pure Rust codec using the `image` crate ecosystem.
///
/// Stateless apart from its settings, so one instance is shared by every
/// worker in the pool.
#[derive(Debug, Clone, Default)]
pub struct RustCodec {
    limits: DecodeLimits,
    jpeg: JpegPresets,
}

impl RustCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(limits: DecodeLimits, jpeg: JpegPresets) -> Self {
        Self { limits, jpeg }
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    pub fn jpeg_presets(&self) -> JpegPresets {
        self.jpeg
    }
}

fn decode_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Limits(e) => DecodeError::LimitExceeded(e.to_string()),
        ImageError::Unsupported(e) => DecodeError::Unsupported(e.to_string()),
        other => DecodeError::Corrupt(other.to_string()),
    }
}

fn encode_error(err: ImageError) -> EncodeError {
    match err {
        ImageError::Unsupported(e) => EncodeError::Unsupported(e.to_string()),
        other => EncodeError::Failed(other.to_string()),
    }
}

/// Pull EXIF and ICC blocks out of a JPEG, PNG or WebP container.
///
/// Other containers (and unparseable ones) simply carry no metadata.
fn read_metadata_block(bytes: &[u8]) -> Option<MetadataBlock> {
    let container = DynImage::from_bytes(bytes.to_vec().into()).ok().flatten()?;
    let block = MetadataBlock {
        exif: container.exif().map(|b| b.to_vec()),
        icc_profile: container.icc_profile().map(|b| b.to_vec()),
    };
    (!block.is_empty()).then_some(block)
}

/// Write carried metadata into freshly encoded bytes.
fn embed_metadata(encoded: Vec<u8>, metadata: &MetadataBlock) -> Result<Vec<u8>, EncodeError> {
    if metadata.is_empty() {
        return Ok(encoded);
    }
    let Some(mut container) = DynImage::from_bytes(encoded.clone().into())
        .map_err(|e| EncodeError::Failed(format!("re-reading encoded container: {e}")))?
    else {
        return Ok(encoded);
    };

    container.set_exif(metadata.exif.clone().map(Into::into));
    container.set_icc_profile(metadata.icc_profile.clone().map(Into::into));

    let mut out = Vec::with_capacity(encoded.len());
    container
        .encoder()
        .write_to(&mut out)
        .map_err(|e| EncodeError::Failed(format!("embedding metadata: {e}")))?;
    Ok(out)
}

/// 8-bit RGB(A), the common denominator of the WebP and BMP encoders.
fn eight_bit(pixels: &DynamicImage) -> Cow<'_, DynamicImage> {
    match pixels.color() {
        ColorType::Rgb8 | ColorType::Rgba8 => Cow::Borrowed(pixels),
        c if c.has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(pixels.to_rgba8())),
        _ => Cow::Owned(DynamicImage::ImageRgb8(pixels.to_rgb8())),
    }
}

/// PNG has no float samples; everything else it stores natively.
fn png_layout(pixels: &DynamicImage) -> Cow<'_, DynamicImage> {
    match pixels.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            Cow::Owned(DynamicImage::ImageRgba16(pixels.to_rgba16()))
        }
        _ => Cow::Borrowed(pixels),
    }
}

fn encode_pixels(pixels: &DynamicImage, params: EncodeParams) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (pixels.width(), pixels.height());
    let mut out = Vec::new();

    match params {
        EncodeParams::Jpeg { quality } => {
            // JPEG has no alpha channel; it is dropped, not composited.
            let rgb = pixels.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.value());
            encoder
                .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(encode_error)?;
        }
        EncodeParams::Png { effort } => {
            let compression = match effort {
                PngEffort::Fast => CompressionType::Fast,
                PngEffort::Default => CompressionType::Default,
                PngEffort::Best => CompressionType::Best,
            };
            let encoder = PngEncoder::new_with_quality(&mut out, compression, PngFilter::Adaptive);
            png_layout(pixels)
                .write_with_encoder(encoder)
                .map_err(encode_error)?;
        }
        EncodeParams::Gif { speed } => {
            let rgba = pixels.to_rgba8();
            let mut encoder = GifEncoder::new_with_speed(&mut out, speed);
            encoder
                .encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(encode_error)?;
        }
        EncodeParams::WebP => {
            eight_bit(pixels)
                .write_with_encoder(WebPEncoder::new_lossless(&mut out))
                .map_err(encode_error)?;
        }
        EncodeParams::Bmp => {
            eight_bit(pixels)
                .write_with_encoder(BmpEncoder::new(&mut out))
                .map_err(encode_error)?;
        }
    }

    Ok(out)
}

/// APP1 prefix some writers leave in front of the TIFF header.
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// EXIF orientation of a raw block, 1 when missing, out of range or unparsable.
fn orientation_from_exif(block: &[u8]) -> u16 {
    let tiff = block.strip_prefix(EXIF_PREFIX).unwrap_or(block);
    let Ok(parsed) = exif::Reader::new().read_raw(tiff.to_vec()) else {
        return 1;
    };
    parsed
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .and_then(|v| u16::try_from(v).ok())
        .filter(|v| (1..=8).contains(v))
        .unwrap_or(1)
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;
        let source_format = match reader.format() {
            Some(format) if DECODABLE.contains(&format) => format,
            Some(format) => return Err(DecodeError::Unsupported(format!("{format:?}"))),
            None => return Err(DecodeError::Unsupported("unrecognized content".into())),
        };
        reader.limits(self.limits.to_image_limits());

        let pixels = reader.decode().map_err(decode_error)?;
        let metadata = read_metadata_block(bytes);
        let orientation = metadata
            .as_ref()
            .and_then(|m| m.exif.as_deref())
            .map_or(1, orientation_from_exif);

        Ok(RasterImage {
            pixels,
            source_format,
            metadata,
            orientation,
        })
    }

    fn encode(
        &self,
        image: &RasterImage,
        format: OutputFormat,
        quality: QualityTier,
    ) -> Result<EncodedImage, EncodeError> {
        let params = plan_encode(format, quality, &self.jpeg);

        let baked;
        let pixels = if !format.carries_metadata() && image.orientation != 1 {
            baked = apply_orientation(image.pixels.clone(), image.orientation);
            &baked
        } else {
            &image.pixels
        };

        let mut bytes = encode_pixels(pixels, params)?;
        if format.carries_metadata() {
            if let Some(metadata) = &image.metadata {
                bytes = embed_metadata(bytes, metadata)?;
            }
        }

        Ok(EncodedImage {
            bytes,
            dimensions: Dimensions {
                width: pixels.width(),
                height: pixels.height(),
            },
        })
    }
}
