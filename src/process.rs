//! Batch orchestration.
//!
//! Takes a [`BatchRequest`], validates it, and fans the items out to a bounded
//! worker pool. Every item ends up as exactly one [`ItemOutcome`], reported in
//! input order no matter which worker finished first.
//!
//! ## Flow
//!
//! ```text
//! validate request ──✗──▶ RequestError (nothing touched)
//!        │
//! plan output names (input order)
//!        │
//! rayon pool (N workers) ──▶ worker::process_item × paths.len()
//!        │                          │
//!        │                          └──▶ BatchEvent::ItemFinished (optional channel)
//!        ▼
//! BatchResult { total, succeeded, failed, outcomes }
//! ```
//!
//! ## Parallel Processing
//!
//! Items run on a dedicated [rayon](https://docs.rs/rayon) pool sized by
//! [`config::effective_workers`]: 4 by default, never more than the machine
//! has cores. `par_iter().collect()` keeps input order in the output vector.
//!
//! ## Cancellation
//!
//! A [`CancelToken`] stops new items from starting. Items already running
//! finish normally; the rest are reported as `Failed(Cancelled)` so the
//! counts always add up to the number of inputs.

use crate::config::{self, BatchConfig};
use crate::imaging::{ImageCodec, RustCodec};
use crate::naming::{self, OutputName};
use crate::request::{BatchRequest, RequestError};
use crate::result::{BatchResult, FailureKind, ItemOutcome};
use crate::worker::{self, ItemJob, JobOptions};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        total: usize,
        workers: usize,
    },
    ItemFinished {
        /// Position of the item in the request.
        index: usize,
        total: usize,
        outcome: ItemOutcome,
    },
}

/// Shared flag that stops a running batch from starting new items.
///
/// Cheap to clone; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run a batch with the production codec.
pub fn run(
    request: &BatchRequest,
    config: &BatchConfig,
    cancel: Option<&CancelToken>,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchResult, RequestError> {
    let codec = RustCodec::with_settings(config.decode_limits(), config.jpeg_presets());
    run_with_codec(&codec, request, config, cancel, events)
}

/// Run a batch using a specific codec (allows testing with mock).
pub fn run_with_codec(
    codec: &impl ImageCodec,
    request: &BatchRequest,
    config: &BatchConfig,
    cancel: Option<&CancelToken>,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchResult, RequestError> {
    request.validate()?;

    let options = JobOptions::from_request(request, config.item_timeout());
    let workers = config::effective_workers(&config.processing);
    Ok(run_jobs(codec, &request.paths, &options, workers, cancel, events))
}

/// Process already-validated inputs.
pub(crate) fn run_jobs(
    codec: &impl ImageCodec,
    paths: &[PathBuf],
    options: &JobOptions,
    workers: usize,
    cancel: Option<&CancelToken>,
    events: Option<Sender<BatchEvent>>,
) -> BatchResult {
    let total = paths.len();
    let names = naming::plan_output_names(paths, &options.output_dir, options.format);

    info!(total, workers, format = %options.format, "starting batch");
    if let Some(tx) = &events {
        // A closed receiver only means nobody is listening
        let _ = tx.send(BatchEvent::Started { total, workers });
    }

    let process_one = |(index, (input, name)): (usize, (&PathBuf, &OutputName))| {
        let outcome = if cancel.is_some_and(CancelToken::is_cancelled) {
            debug!(input = %input.display(), "skipped, batch cancelled");
            ItemOutcome::failed(input, FailureKind::Cancelled, "batch cancelled before start")
        } else {
            worker::process_item(codec, &ItemJob { input, name }, options)
        };
        if let Some(tx) = &events {
            let _ = tx.send(BatchEvent::ItemFinished {
                index,
                total,
                outcome: outcome.clone(),
            });
        }
        outcome
    };

    let outcomes: Vec<ItemOutcome> = match rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("imgbatch-worker-{i}"))
        .build()
    {
        Ok(pool) => pool.install(|| {
            paths
                .par_iter()
                .zip(names.par_iter())
                .enumerate()
                .map(process_one)
                .collect()
        }),
        Err(e) => {
            warn!("could not build worker pool ({e}), using the global pool");
            paths
                .par_iter()
                .zip(names.par_iter())
                .enumerate()
                .map(process_one)
                .collect()
        }
    };

    let result = BatchResult::from_outcomes(outcomes);
    info!(
        total = result.total(),
        succeeded = result.succeeded(),
        failed = result.failed(),
        "batch finished"
    );
    result
}
