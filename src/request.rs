//! Batch requests and the only errors that can reject a whole batch.
//!
//! A [`RawRequest`] is the string-typed shape the desktop front-end sends.
//! Converting it into a [`BatchRequest`] parses the enumerated options; calling
//! [`BatchRequest::validate`] then checks the structural invariants and makes
//! sure the output directory is usable. Nothing about individual input files
//! is checked here: a missing or corrupt image is a per-item failure, not a
//! request error.

use crate::types::{OutputFormat, PrivacyMode, QualityTier};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the throwaway file used to prove the output directory is writable.
const WRITE_PROBE: &str = ".imgbatch-write-probe";

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("No input files were given")]
    NoInputs,
    #[error("No output directory was given")]
    MissingOutputDir,
    #[error("Cannot create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Output path is not a directory: {}", .0.display())]
    OutputNotDirectory(PathBuf),
    #[error("Output directory is not writable {}: {source}", .path.display())]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Target width must be a positive integer")]
    InvalidWidth,
    #[error("Invalid {field}: {value:?}")]
    InvalidOption { field: &'static str, value: String },
}

/// The request exactly as a UI layer hands it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRequest {
    pub paths: Vec<String>,
    pub quality: String,
    pub format: String,
    pub privacy: String,
    #[serde(default)]
    pub width: Option<u32>,
    pub output_dir: String,
}

/// A fully typed batch request. Consumed read-only by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Input files, in the order results are reported.
    pub paths: Vec<PathBuf>,
    pub quality: QualityTier,
    pub format: OutputFormat,
    pub privacy: PrivacyMode,
    /// Maximum output width; `None` keeps the original dimensions.
    pub width: Option<u32>,
    pub output_dir: PathBuf,
}

impl TryFrom<RawRequest> for BatchRequest {
    type Error = RequestError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        if raw.output_dir.trim().is_empty() {
            return Err(RequestError::MissingOutputDir);
        }
        Ok(Self {
            paths: raw.paths.into_iter().map(PathBuf::from).collect(),
            quality: raw.quality.parse()?,
            format: raw.format.parse()?,
            privacy: raw.privacy.parse()?,
            width: raw.width,
            output_dir: PathBuf::from(raw.output_dir),
        })
    }
}

impl BatchRequest {
    /// Check everything that must hold before any item is touched.
    ///
    /// Creates the output directory if it does not exist yet. On success the
    /// directory exists, is a directory, and accepts new files.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.paths.is_empty() {
            return Err(RequestError::NoInputs);
        }
        if self.width == Some(0) {
            return Err(RequestError::InvalidWidth);
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(RequestError::MissingOutputDir);
        }
        ensure_writable_dir(&self.output_dir)
    }
}

fn ensure_writable_dir(dir: &Path) -> Result<(), RequestError> {
    if dir.exists() && !dir.is_dir() {
        return Err(RequestError::OutputNotDirectory(dir.to_path_buf()));
    }
    fs::create_dir_all(dir).map_err(|source| RequestError::CreateOutputDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let probe = dir.join(format!("{}-{}", WRITE_PROBE, std::process::id()));
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe)
        .map_err(|source| RequestError::OutputNotWritable {
            path: dir.to_path_buf(),
            source,
        })?;
    // Best-effort cleanup
    let _ = fs::remove_file(&probe);
    Ok(())
}
