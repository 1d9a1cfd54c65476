use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod orchestrator;
pub mod validator;

pub use backend::{BackendError, Bookmark, DocumentHandle, DocumentOpener, Span};
pub use orchestrator::{run_batch, DocumentProcessor};
pub use validator::{validate, ValidationLimits};

// ── Domain records ──────────────────────────────────────────────

/// Heading depth of an outline entry, `h1` (top level) through `h6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    /// Maps a 1-based nesting depth to a level, clamping anything
    /// deeper than six to `h6`. Depth zero is treated as top level.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 | 1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            4 => HeadingLevel::H4,
            5 => HeadingLevel::H5,
            _ => HeadingLevel::H6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
            HeadingLevel::H5 => "h5",
            HeadingLevel::H6 => "h6",
        }
    }
}

impl std::fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One heading in a document outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    /// 1-based page number the heading appears on.
    pub page: u32,
}

/// Extracted document structure. An empty title or an empty outline is a
/// valid result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

/// A schema-conforming result plus the corrections applied to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub result: ExtractionResult,
    /// Human-readable descriptions of every correction, in the order applied.
    pub sanitizations: Vec<String>,
}

// ── Run accounting ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Error,
    Timeout,
}

/// Per-document outcome for the run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub filename: String,
    pub status: RecordStatus,
    pub elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Aggregate accounting for one batch run, written alongside the
/// per-document records once every task has settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_elapsed_seconds: f64,
    pub average_seconds_per_file: f64,
    pub records: Vec<ProcessingRecord>,
}

impl RunSummary {
    /// Builds the summary from settled records. Records are re-sorted by
    /// filename so the summary is stable regardless of completion order.
    pub fn from_records(mut records: Vec<ProcessingRecord>, elapsed: Duration) -> Self {
        records.sort_by(|a, b| a.filename.cmp(&b.filename));
        let total = records.len();
        let succeeded = records
            .iter()
            .filter(|r| r.status == RecordStatus::Success)
            .count();
        let failed = total - succeeded;
        let total_elapsed_seconds = round2(elapsed.as_secs_f64());
        let average_seconds_per_file = if total > 0 {
            round2(total_elapsed_seconds / total as f64)
        } else {
            0.0
        };
        RunSummary {
            total,
            succeeded,
            failed,
            total_elapsed_seconds,
            average_seconds_per_file,
            records,
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Progress reporting ──────────────────────────────────────────

/// Events emitted by the orchestrator as documents move through the pool.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A worker picked up a document.
    Started {
        index: usize,
        total: usize,
        filename: String,
    },
    /// A document settled, one way or another.
    Finished {
        index: usize,
        total: usize,
        filename: String,
        status: RecordStatus,
        elapsed: Duration,
    },
}

// ── Configuration ───────────────────────────────────────────────

/// Runtime configuration for a batch run.
///
/// `max_memory_mb` is an operational ceiling for deployment sizing and is
/// validated but not enforced in-process.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_workers: usize,
    pub max_memory_mb: u64,
    pub timeout: Duration,
    pub log_level: String,
    /// Log file path. `None` disables file logging.
    pub log_file: Option<PathBuf>,
    /// Write a `<name>.sanitizations.json` sibling for documents whose
    /// output needed corrections.
    pub save_sanitization_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_dir: PathBuf::from("./input"),
            output_dir: PathBuf::from("./output"),
            max_workers: 8,
            max_memory_mb: 200,
            timeout: Duration::from_secs(10),
            log_level: "info".to_string(),
            log_file: Some(PathBuf::from("pdf_processing.log")),
            save_sanitization_logs: false,
        }
    }
}

impl Config {
    /// Rejects values that would make a run meaningless rather than
    /// silently clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.max_memory_mb < 50 {
            return Err(ConfigError::MemoryTooLow {
                min: 50,
                got: self.max_memory_mb,
            });
        }
        if self.timeout < Duration::from_secs(1) {
            return Err(ConfigError::TimeoutTooShort);
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("max_workers must be at least 1")]
    ZeroWorkers,
    #[error("max_memory_mb must be at least {min} (got {got})")]
    MemoryTooLow { min: u64, got: u64 },
    #[error("timeout_seconds must be at least 1")]
    TimeoutTooShort,
}

// ── Errors ──────────────────────────────────────────────────────

/// Failure of a single document's pipeline. One document failing never
/// affects any other document in the batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Open(#[from] BackendError),
    #[error("processing timed out after {0}s")]
    Timeout(f64),
    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),
    #[error("extraction panicked: {0}")]
    Panicked(String),
}
