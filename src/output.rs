//! CLI output formatting.
//!
//! Pure functions turning batch events and results into display lines. The
//! binary prints them; tests assert on them directly.
//!
//! # Output Format
//!
//! ```text
//! Converting 3 images with 4 workers
//! 001 beach.png → beach.jpg
//!     1600x1200, 412.7 KB
//! 002 notes.txt
//!     Failed (decode error): Unsupported image format: unrecognized content
//! 003 dusk.bmp → dusk.jpg
//!     800x600, 96.0 KB
//!
//! 2 of 3 images converted, 1 failed
//! ```
//!
//! Items are printed as they finish, so their order can differ from the
//! request; the positional index identifies each one.

use crate::process::BatchEvent;
use crate::result::{BatchResult, ItemOutcome, ItemStatus};
use std::path::Path;

/// Indentation for context lines.
const INDENT: &str = "    ";

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte size: `512 B`, `1.5 KB`, `2.3 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Header + context lines for one finished item. `index` is 0-based.
pub fn format_outcome(index: usize, outcome: &ItemOutcome) -> Vec<String> {
    let position = format!("{:03}", index + 1);
    let input = file_name(&outcome.input);
    match &outcome.status {
        ItemStatus::Succeeded {
            output,
            width,
            height,
            bytes,
        } => vec![
            format!("{position} {input} \u{2192} {}", file_name(output)),
            format!("{INDENT}{width}x{height}, {}", format_bytes(*bytes)),
        ],
        ItemStatus::Failed { kind, cause } => vec![
            format!("{position} {input}"),
            format!("{INDENT}Failed ({kind}): {cause}"),
        ],
    }
}

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total, workers } => {
            let noun = if *total == 1 { "image" } else { "images" };
            let worker_noun = if *workers == 1 { "worker" } else { "workers" };
            vec![format!("Converting {total} {noun} with {workers} {worker_noun}")]
        }
        BatchEvent::ItemFinished { index, outcome, .. } => format_outcome(*index, outcome),
    }
}

/// Closing lines: the summary sentence, then the failed inputs in request order.
pub fn format_summary(result: &BatchResult) -> Vec<String> {
    let mut lines = vec![String::new(), result.summary().to_string()];
    for (index, outcome) in result.outcomes().iter().enumerate() {
        if let ItemStatus::Failed { kind, .. } = &outcome.status {
            lines.push(format!(
                "{INDENT}{:03} {} ({kind})",
                index + 1,
                outcome.input.display()
            ));
        }
    }
    lines
}

pub fn print_batch_event(event: &BatchEvent) {
    for line in format_batch_event(event) {
        println!("{}", line);
    }
}

pub fn print_summary(result: &BatchResult) {
    for line in format_summary(result) {
        println!("{}", line);
    }
}
