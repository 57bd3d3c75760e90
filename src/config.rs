//! Batch configuration module.
//!
//! Handles loading, validating, and merging `imgbatch.toml`. The file is
//! optional: without it every batch runs on the stock defaults. With it, only
//! the keys present override the defaults.
//!
//! ## Config File Location
//!
//! `imgbatch.toml` in the working directory, or any file passed with
//! `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [processing]
//! max_workers = 4          # Parallel workers (clamped to CPU cores)
//! item_timeout_secs = 120  # Per-image budget; 0 disables it
//!
//! [limits]
//! max_width = 16384        # Largest decodable width in pixels
//! max_height = 16384       # Largest decodable height in pixels
//! max_alloc_mb = 512       # Largest decoder allocation
//!
//! [jpeg]
//! high = 90                # Encoder quality per tier (1-100)
//! medium = 75
//! low = 60
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only make "low" smaller
//! [jpeg]
//! low = 45
//! ```
//!
//! Unknown keys are rejected, so a typo fails loudly instead of being ignored.

use crate::imaging::{DecodeLimits, JpegPresets, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "imgbatch.toml";

/// Worker count used when `max_workers` is not set.
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Batch configuration loaded from `imgbatch.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker pool and per-item budget.
    pub processing: ProcessingConfig,
    /// Decoder safety limits.
    pub limits: LimitsConfig,
    /// JPEG quality per tier.
    pub jpeg: JpegConfig,
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_workers must be at least 1".into(),
            ));
        }
        if self.limits.max_width == 0 || self.limits.max_height == 0 {
            return Err(ConfigError::Validation(
                "limits.max_width and limits.max_height must be non-zero".into(),
            ));
        }
        if self.limits.max_alloc_mb == 0 {
            return Err(ConfigError::Validation(
                "limits.max_alloc_mb must be non-zero".into(),
            ));
        }
        for (tier, value) in [
            ("high", self.jpeg.high),
            ("medium", self.jpeg.medium),
            ("low", self.jpeg.low),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "jpeg.{tier} must be 1-100, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Per-item timeout, `None` when disabled.
    pub fn item_timeout(&self) -> Option<Duration> {
        match self.processing.item_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_width: self.limits.max_width,
            max_height: self.limits.max_height,
            max_alloc_bytes: self.limits.max_alloc_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn jpeg_presets(&self) -> JpegPresets {
        JpegPresets {
            high: Quality::new(self.jpeg.high),
            medium: Quality::new(self.jpeg.medium),
            low: Quality::new(self.jpeg.low),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to [`DEFAULT_WORKERS`].
    /// Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
    /// Seconds one image may take before it is reported as timed out.
    pub item_timeout_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            item_timeout_secs: 120,
        }
    }
}

/// Resolve the effective worker count from config.
///
/// - `None` → `min(DEFAULT_WORKERS, cores)`
/// - `Some(n)` → `min(n, cores)` (user can constrain down, not up)
///
/// Never returns 0.
pub fn effective_workers(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_workers
        .unwrap_or(DEFAULT_WORKERS)
        .min(cores)
        .max(1)
}

/// Decoder limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub max_alloc_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = DecodeLimits::default();
        Self {
            max_width: limits.max_width,
            max_height: limits.max_height,
            max_alloc_mb: limits.max_alloc_bytes / (1024 * 1024),
        }
    }
}

/// JPEG encoder quality per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    pub high: u8,
    pub medium: u8,
    pub low: u8,
}

impl Default for JpegConfig {
    fn default() -> Self {
        let presets = JpegPresets::default();
        Self {
            high: presets.high.value(),
            medium: presets.medium.value(),
            low: presets.low.value(),
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BatchConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but is
/// unreadable or not valid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BatchConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `imgbatch.toml` from `dir`, falling back to defaults when absent.
pub fn load_config(dir: &Path) -> Result<BatchConfig, ConfigError> {
    let overlay = load_raw_config(&dir.join(CONFIG_FILE_NAME))?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Load an explicitly named config file. Unlike [`load_config`], a missing
/// file is an error.
pub fn load_config_file(path: &Path) -> Result<BatchConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `imgbatch.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgbatch Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Looked up as ./imgbatch.toml, or pass a path with --config.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Never exceeds the number of CPU cores.
# Omit or comment out for the default of 4.
# max_workers = 4

# Seconds a single image may take before it is reported as timed out.
# Set to 0 to disable.
item_timeout_secs = 120

# ---------------------------------------------------------------------------
# Decoder limits
# ---------------------------------------------------------------------------
[limits]
# Images whose header claims larger dimensions are rejected before decoding.
max_width = 16384
max_height = 16384

# Largest single allocation the decoder may make, in MiB.
max_alloc_mb = 512

# ---------------------------------------------------------------------------
# JPEG quality per tier (1 = worst, 100 = best)
# ---------------------------------------------------------------------------
[jpeg]
high = 90
medium = 75
low = 60
"##
}
