//! # imgbatch
//!
//! Batch image conversion: take a list of image files, decode each one,
//! optionally shrink it to a maximum width, apply a metadata privacy policy,
//! re-encode it to a single target format, and write it to an output
//! directory.
//!
//! # Architecture: Per-Item Pipeline, Bounded Pool
//!
//! ```text
//! BatchRequest ─▶ process::run ─▶ rayon pool ─▶ worker::process_item × N ─▶ BatchResult
//!                                                 │
//!                     read → decode → metadata → resize → encode → write
//! ```
//!
//! Each input is handled on its own: an unreadable, corrupt or oversized file
//! becomes a failed [`ItemOutcome`](result::ItemOutcome) and the rest of the
//! batch carries on. Only a structurally broken request (no inputs, unusable
//! output directory, zero width) is rejected up front, before any file is
//! touched.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`request`] | `RawRequest` (string-typed boundary form) → validated `BatchRequest` |
//! | [`types`] | `QualityTier`, `OutputFormat`, `PrivacyMode` with their accepted spellings |
//! | [`process`] | Batch orchestrator: validation, name planning, worker pool, events, cancellation |
//! | [`worker`] | One item through the pipeline, every fault mapped to a `FailureKind` |
//! | [`imaging`] | Codec trait, `image`-crate codec, resize and orientation, EXIF reader |
//! | [`metadata`] | `keep_all` / `strip_all` privacy policy |
//! | [`naming`] | Collision-free output file names |
//! | [`result`] | `ItemOutcome`, `BatchResult`, `BatchSummary` |
//! | [`config`] | Optional `imgbatch.toml`: workers, timeout, decode limits, JPEG presets |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Content Sniffing
//!
//! Input formats are detected from the bytes, never from the file extension.
//! A PNG saved as `photo.jpg` decodes as a PNG.
//!
//! ## Deterministic Output
//!
//! Output names are planned in input order before any worker starts, and the
//! encoders are deterministic. The same request on the same inputs always
//! produces the same files under the same names, whatever the worker count.
//!
//! ## Pure-Rust Imaging
//!
//! All codecs come from the `image` crate; metadata containers are handled by
//! `img-parts`. No system libraries are needed.

pub mod config;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod request;
pub mod result;
pub mod types;
pub mod worker;

pub use process::{BatchEvent, CancelToken, run};
pub use request::{BatchRequest, RawRequest, RequestError};
pub use result::{BatchResult, BatchSummary, FailureKind, ItemOutcome, ItemStatus};
pub use types::{OutputFormat, PrivacyMode, QualityTier};

#[cfg(test)]
pub(crate) mod test_helpers;
