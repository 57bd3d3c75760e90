//! Output file naming.
//!
//! Every output is named after its input's file stem with the target format's
//! extension: `beach.PNG` converted to JPEG becomes `beach.jpg`. When that
//! name is taken, a numeric suffix is appended: `beach-1.jpg`, `beach-2.jpg`…
//!
//! Naming happens in two steps:
//!
//! 1. [`plan_output_names`] runs once per batch, in input order, before any
//!    worker starts. It hands out distinct names (compared case-insensitively,
//!    so `A.jpg` and `a.jpg` never collide on case-folding filesystems) and
//!    skips names that already exist in the output directory. Planning in
//!    input order makes names deterministic regardless of which worker
//!    finishes first.
//! 2. [`claim`] runs in the worker right before writing. It creates the file
//!    with `create_new`, so a file that appeared after planning is never
//!    overwritten; the worker simply moves on to the next free suffix.

use crate::types::OutputFormat;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Stem used when an input path has no usable file name.
const FALLBACK_STEM: &str = "image";

/// Gives up claiming after this many taken suffixes.
const MAX_CLAIM_ATTEMPTS: u32 = 10_000;

/// Output stem for an input path.
///
/// - `photos/beach.png` → `beach`
/// - `photos/archive.tar.png` → `archive.tar`
/// - `photos/.png` → `.png` (dotfiles keep their whole name)
pub fn output_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string())
}

/// A candidate output file name: `stem[-suffix].extension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputName {
    pub stem: String,
    pub extension: &'static str,
    /// 0 means no suffix.
    pub suffix: u32,
}

impl OutputName {
    pub fn new(stem: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            stem: stem.into(),
            extension: format.extension(),
            suffix: 0,
        }
    }

    pub fn file_name(&self) -> String {
        if self.suffix == 0 {
            format!("{}.{}", self.stem, self.extension)
        } else {
            format!("{}-{}.{}", self.stem, self.suffix, self.extension)
        }
    }

    /// The same name with the next suffix.
    pub fn bump(&self) -> Self {
        Self {
            suffix: self.suffix + 1,
            ..self.clone()
        }
    }

    fn key(&self) -> String {
        self.file_name().to_lowercase()
    }
}

/// Assign a distinct output name to every input, in input order.
pub fn plan_output_names(
    inputs: &[PathBuf],
    output_dir: &Path,
    format: OutputFormat,
) -> Vec<OutputName> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let mut name = OutputName::new(output_stem(input), format);
            while taken.contains(&name.key()) || output_dir.join(name.file_name()).exists() {
                name = name.bump();
            }
            taken.insert(name.key());
            name
        })
        .collect()
}

/// Create the output file for `name` without overwriting anything.
///
/// Returns the path actually created (which may carry a higher suffix than
/// planned) and the open file.
pub fn claim(output_dir: &Path, name: &OutputName) -> io::Result<(PathBuf, File)> {
    let mut candidate = name.clone();
    for _ in 0..MAX_CLAIM_ATTEMPTS {
        let path = output_dir.join(candidate.file_name());
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => candidate = candidate.bump(),
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free output name for {}", name.file_name()),
    ))
}
