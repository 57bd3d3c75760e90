//! Per-item pipeline.
//!
//! ```text
//! read → decode → metadata policy → resize → encode → claim name → write
//! ```
//!
//! [`process_item`] never returns an error: every fault becomes an
//! [`ItemOutcome`] with the [`FailureKind`] of the stage that failed. Each
//! worker owns its raster from decode to encode, so nothing here is shared
//! between items except the codec (which is `Sync`).
//!
//! The per-item deadline is checked between stages and right before the
//! output file is claimed. A stage that is already running (a slow decode,
//! say) is never interrupted, but an expired item never leaves a file behind.

use crate::imaging::{self, EncodedImage, ImageCodec};
use crate::metadata;
use crate::naming::{self, OutputName};
use crate::request::BatchRequest;
use crate::result::{FailureKind, ItemOutcome};
use crate::types::{OutputFormat, PrivacyMode, QualityTier};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Settings shared by every item in a batch.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub format: OutputFormat,
    pub quality: QualityTier,
    pub width: Option<u32>,
    pub privacy: PrivacyMode,
    pub output_dir: PathBuf,
    /// Per-item time budget. `None` disables the check.
    pub timeout: Option<Duration>,
}

impl JobOptions {
    pub fn from_request(request: &BatchRequest, timeout: Option<Duration>) -> Self {
        Self {
            format: request.format,
            quality: request.quality,
            width: request.width,
            privacy: request.privacy,
            output_dir: request.output_dir.clone(),
            timeout,
        }
    }
}

/// One input and the output name planned for it.
#[derive(Debug, Clone)]
pub struct ItemJob<'a> {
    pub input: &'a Path,
    pub name: &'a OutputName,
}

struct StageError {
    kind: FailureKind,
    cause: String,
}

impl StageError {
    fn new(kind: FailureKind, cause: impl ToString) -> Self {
        Self {
            kind,
            cause: cause.to_string(),
        }
    }
}

struct Deadline {
    at: Option<Instant>,
    budget: Option<Duration>,
}

impl Deadline {
    fn start(budget: Option<Duration>) -> Self {
        Self {
            at: budget.map(|b| Instant::now() + b),
            budget,
        }
    }

    fn check(&self, stage: &str) -> Result<(), StageError> {
        match (self.at, self.budget) {
            (Some(at), Some(budget)) if Instant::now() >= at => Err(StageError::new(
                FailureKind::Timeout,
                format!("exceeded {}s before {stage}", budget.as_secs_f32()),
            )),
            _ => Ok(()),
        }
    }
}

struct Written {
    path: PathBuf,
    width: u32,
    height: u32,
    bytes: u64,
}

/// Run one input through the whole pipeline.
pub fn process_item(codec: &impl ImageCodec, job: &ItemJob, options: &JobOptions) -> ItemOutcome {
    match run_stages(codec, job, options) {
        Ok(written) => {
            debug!(
                input = %job.input.display(),
                output = %written.path.display(),
                bytes = written.bytes,
                "converted"
            );
            ItemOutcome::succeeded(
                job.input,
                written.path,
                written.width,
                written.height,
                written.bytes,
            )
        }
        Err(err) => {
            warn!(input = %job.input.display(), kind = %err.kind, "{}", err.cause);
            ItemOutcome::failed(job.input, err.kind, err.cause)
        }
    }
}

fn run_stages(
    codec: &impl ImageCodec,
    job: &ItemJob,
    options: &JobOptions,
) -> Result<Written, StageError> {
    let deadline = Deadline::start(options.timeout);

    deadline.check("read")?;
    let bytes = std::fs::read(job.input).map_err(|e| StageError::new(FailureKind::Read, e))?;
    debug!(input = %job.input.display(), len = bytes.len(), "read");

    deadline.check("decode")?;
    let raster = codec
        .decode(&bytes)
        .map_err(|e| StageError::new(FailureKind::Decode, e))?;
    drop(bytes);
    debug!(
        input = %job.input.display(),
        width = raster.width(),
        height = raster.height(),
        format = ?raster.source_format,
        "decoded"
    );

    deadline.check("resize")?;
    let raster = metadata::apply(raster, options.privacy);
    let raster = imaging::resize(raster, options.width);

    deadline.check("encode")?;
    let encoded = codec
        .encode(&raster, options.format, options.quality)
        .map_err(|e| StageError::new(FailureKind::Encode, e))?;
    drop(raster);

    deadline.check("write")?;
    write_output(&options.output_dir, job.name, encoded)
}

fn write_output(
    output_dir: &Path,
    name: &OutputName,
    encoded: EncodedImage,
) -> Result<Written, StageError> {
    let (path, mut file) =
        naming::claim(output_dir, name).map_err(|e| StageError::new(FailureKind::Write, e))?;

    if let Err(e) = file.write_all(&encoded.bytes).and_then(|()| file.flush()) {
        drop(file);
        if let Err(cleanup) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), "could not remove partial output: {cleanup}");
        }
        return Err(StageError::new(
            FailureKind::Write,
            format!("{}: {e}", path.display()),
        ));
    }

    Ok(Written {
        path,
        width: encoded.dimensions.width,
        height: encoded.dimensions.height,
        bytes: encoded.bytes.len() as u64,
    })
}
