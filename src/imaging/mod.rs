//! Image processing: pure Rust, in memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with content sniffing and decode limits |
//! | **Metadata** | `img-parts` containers, `kamadak-exif` orientation |
//! | **Resize** | Lanczos3, width-constrained, never upscales |
//! | **Encode** | JPEG / PNG / GIF / WebP / BMP encoders from `image` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Format + tier → concrete encoder settings
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: Pixel transforms between decode and encode

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{
    DecodeError, Dimensions, EncodeError, EncodedImage, ImageCodec, MetadataBlock, RasterImage,
};
pub use calculations::calculate_target_dimensions;
pub use operations::{apply_orientation, resize};
pub use params::{EncodeParams, JpegPresets, PngEffort, Quality, plan_encode};
pub use rust_backend::{DecodeLimits, RustCodec, supported_input_extensions};
