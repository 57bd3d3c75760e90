//! Per-item outcomes and the batch summary returned to the caller.
//!
//! Every input path produces exactly one [`ItemOutcome`]. A [`BatchResult`] is
//! built from the full list in one go, so its counters always agree with its
//! contents: `succeeded + failed == total == outcomes.len()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which pipeline step an item failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Read,
    Decode,
    Encode,
    Write,
    Timeout,
    /// The batch was cancelled before this item started.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read error",
            Self::Decode => "decode error",
            Self::Encode => "encode error",
            Self::Write => "write error",
            Self::Timeout => "timed out",
            Self::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Succeeded {
        output: PathBuf,
        width: u32,
        height: u32,
        /// Encoded size on disk.
        bytes: u64,
    },
    Failed {
        kind: FailureKind,
        cause: String,
    },
}

/// The result of processing one input path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub input: PathBuf,
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn succeeded(input: &Path, output: PathBuf, width: u32, height: u32, bytes: u64) -> Self {
        Self {
            input: input.to_path_buf(),
            status: ItemStatus::Succeeded {
                output,
                width,
                height,
                bytes,
            },
        }
    }

    pub fn failed(input: &Path, kind: FailureKind, cause: impl Into<String>) -> Self {
        Self {
            input: input.to_path_buf(),
            status: ItemStatus::Failed {
                kind,
                cause: cause.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ItemStatus::Succeeded { .. })
    }

    /// Output path, if the item succeeded.
    pub fn output(&self) -> Option<&Path> {
        match &self.status {
            ItemStatus::Succeeded { output, .. } => Some(output),
            ItemStatus::Failed { .. } => None,
        }
    }

    /// Failure kind, if the item failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.status {
            ItemStatus::Succeeded { .. } => None,
            ItemStatus::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Aggregate result of a batch, in input order.
///
/// Deserializing rebuilds the counters from `outcomes`; counters present in
/// the input are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SerializedOutcomes")]
pub struct BatchResult {
    total: usize,
    succeeded: usize,
    failed: usize,
    outcomes: Vec<ItemOutcome>,
}

#[derive(Deserialize)]
struct SerializedOutcomes {
    outcomes: Vec<ItemOutcome>,
}

impl From<SerializedOutcomes> for BatchResult {
    fn from(raw: SerializedOutcomes) -> Self {
        Self::from_outcomes(raw.outcomes)
    }
}

impl BatchResult {
    /// Build the result from outcomes already sorted in input order.
    pub fn from_outcomes(outcomes: Vec<ItemOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<ItemOutcome> {
        self.outcomes
    }

    /// The three counters the desktop front-end displays.
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total_images: self.total,
            successful: self.succeeded,
            failed: self.failed,
        }
    }
}

/// Counters-only view of a [`BatchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_images: usize,
    pub successful: usize,
    pub failed: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "{} of {} images converted, {} failed",
                self.successful, self.total_images, self.failed
            )
        } else {
            write!(f, "{} images converted", self.successful)
        }
    }
}
