//! Bounded worker pool for batch document processing.
//!
//! Jobs flow through an unbounded channel to a fixed number of workers.
//! Each document runs on a blocking thread under a wall-clock budget;
//! a document that exceeds the budget is abandoned and recorded as a
//! timeout without disturbing the rest of the batch. Workers never retry.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::{
    Config, PipelineError, ProcessingRecord, ProgressEvent, RecordStatus, RunSummary,
    ValidationOutcome, round2,
};

/// Per-document extraction, called by the pool on a blocking thread.
///
/// Implementations own the whole open-extract-validate pipeline for one
/// document and must not touch any state shared with other documents.
pub trait DocumentProcessor: Send + Sync {
    fn process(&self, path: &Path) -> Result<ValidationOutcome, PipelineError>;
}

struct Job {
    path: PathBuf,
    index: usize,
    total: usize,
}

/// Processes `files` under `config.max_workers` concurrent workers and
/// returns the settled run summary.
///
/// Every file produces exactly one record. Output records are written as
/// `<stem>.json` into `config.output_dir`, which must already exist.
pub async fn run_batch(
    files: Vec<PathBuf>,
    config: Arc<Config>,
    processor: Arc<dyn DocumentProcessor>,
    progress: impl Fn(ProgressEvent) + Send + Sync + 'static,
) -> RunSummary {
    let started = Instant::now();
    if files.is_empty() {
        return RunSummary::from_records(Vec::new(), started.elapsed());
    }

    let progress: Arc<dyn Fn(ProgressEvent) + Send + Sync> = Arc::new(progress);
    let total = files.len();
    let num_workers = config.max_workers.max(1).min(total);
    tracing::debug!(workers = num_workers, documents = total, "starting batch");

    let (job_tx, job_rx) = async_channel::unbounded::<Job>();
    let (record_tx, mut record_rx) = tokio::sync::mpsc::unbounded_channel::<ProcessingRecord>();

    let mut workers = Vec::with_capacity(num_workers);
    for _ in 0..num_workers {
        let job_rx = job_rx.clone();
        let record_tx = record_tx.clone();
        let config = config.clone();
        let processor = processor.clone();
        let progress = progress.clone();
        workers.push(tokio::spawn(async move {
            while let Ok(job) = job_rx.recv().await {
                let record = run_job(&job, &config, &processor, &progress).await;
                if record_tx.send(record).is_err() {
                    break;
                }
            }
        }));
    }
    drop(job_rx);
    drop(record_tx);

    for (index, path) in files.into_iter().enumerate() {
        if job_tx
            .send(Job { path, index, total })
            .await
            .is_err()
        {
            break;
        }
    }
    job_tx.close();

    // The record channel closes once every worker has exited.
    let mut records = Vec::with_capacity(total);
    while let Some(record) = record_rx.recv().await {
        records.push(record);
    }
    for worker in workers {
        let _ = worker.await;
    }

    RunSummary::from_records(records, started.elapsed())
}

async fn run_job(
    job: &Job,
    config: &Config,
    processor: &Arc<dyn DocumentProcessor>,
    progress: &Arc<dyn Fn(ProgressEvent) + Send + Sync>,
) -> ProcessingRecord {
    let filename = job
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| job.path.display().to_string());
    (progress)(ProgressEvent::Started {
        index: job.index,
        total: job.total,
        filename: filename.clone(),
    });
    let started = Instant::now();

    let abandoned = Arc::new(AtomicBool::new(false));
    let task = {
        let path = job.path.clone();
        let processor = processor.clone();
        let output_dir = config.output_dir.clone();
        let save_logs = config.save_sanitization_logs;
        let abandoned = abandoned.clone();
        tokio::task::spawn_blocking(move || -> Result<(), PipelineError> {
            let outcome = processor.process(&path)?;
            // The pool may have given up on this document while extraction
            // ran. A late result must not land in the output directory.
            // Best effort, a write already in flight is not interrupted.
            if abandoned.load(Ordering::Acquire) {
                return Ok(());
            }
            write_outcome(&output_dir, &path, &outcome, save_logs)
        })
    };

    let result = match tokio::time::timeout(config.timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(PipelineError::Panicked(join_error.to_string())),
        Err(_elapsed) => {
            abandoned.store(true, Ordering::Release);
            Err(PipelineError::Timeout(config.timeout.as_secs_f64()))
        }
    };

    let elapsed = started.elapsed();
    let (status, error_message) = match result {
        Ok(()) => (RecordStatus::Success, None),
        Err(error) => {
            let status = match error {
                PipelineError::Timeout(_) => RecordStatus::Timeout,
                _ => RecordStatus::Error,
            };
            (status, Some(error.to_string()))
        }
    };
    match status {
        RecordStatus::Success => {
            tracing::info!(
                file = %filename,
                elapsed_ms = elapsed.as_millis() as u64,
                "document processed"
            );
        }
        RecordStatus::Timeout => {
            tracing::warn!(
                file = %filename,
                budget_s = config.timeout.as_secs_f64(),
                "document abandoned after timeout"
            );
        }
        RecordStatus::Error => {
            let detail = error_message.as_deref().unwrap_or("unknown error");
            tracing::warn!(file = %filename, error = %detail, "document failed");
        }
    }
    (progress)(ProgressEvent::Finished {
        index: job.index,
        total: job.total,
        filename: filename.clone(),
        status,
        elapsed,
    });

    ProcessingRecord {
        filename,
        status,
        elapsed_seconds: round2(elapsed.as_secs_f64()),
        error_message,
    }
}

fn write_outcome(
    output_dir: &Path,
    input: &Path,
    outcome: &ValidationOutcome,
    save_sanitization_logs: bool,
) -> Result<(), PipelineError> {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let record_path = output_dir.join(format!("{stem}.json"));
    let json = serde_json::to_string_pretty(&outcome.result)
        .map_err(|e| PipelineError::Write(std::io::Error::other(e)))?;
    std::fs::write(&record_path, json)?;

    if save_sanitization_logs && !outcome.sanitizations.is_empty() {
        let log_path = output_dir.join(format!("{stem}.sanitizations.json"));
        let json = serde_json::to_string_pretty(&outcome.sanitizations)
            .map_err(|e| PipelineError::Write(std::io::Error::other(e)))?;
        std::fs::write(&log_path, json)?;
    }
    Ok(())
}
