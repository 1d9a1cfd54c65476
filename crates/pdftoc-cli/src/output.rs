use std::io::Write;

use owo_colors::OwoColorize;

use pdftoc_core::{RecordStatus, RunSummary};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Human label for a record status, used in progress lines and the
/// failure list.
pub fn status_label(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::Success => "ok",
        RecordStatus::Error => "failed",
        RecordStatus::Timeout => "timed out",
    }
}

/// Print the opening line before the batch starts.
pub fn print_batch_header(
    w: &mut dyn Write,
    input_dir: &std::path::Path,
    count: usize,
    workers: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let msg = format!(
        "Processing {} PDF file{} from {} ({} worker{})",
        count,
        if count == 1 { "" } else { "s" },
        input_dir.display(),
        workers,
        if workers == 1 { "" } else { "s" },
    );
    if color.enabled() {
        writeln!(w, "{}", msg.bold())?;
    } else {
        writeln!(w, "{}", msg)?;
    }
    Ok(())
}

/// Print the settled batch summary, including one line per failure.
pub fn print_run_summary(
    w: &mut dyn Write,
    summary: &RunSummary,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "Batch complete".bold())?;
    } else {
        writeln!(w, "Batch complete")?;
    }
    writeln!(
        w,
        "  {} file{} in {:.2}s ({:.2}s per file)",
        summary.total,
        if summary.total == 1 { "" } else { "s" },
        summary.total_elapsed_seconds,
        summary.average_seconds_per_file,
    )?;

    let succeeded_line = format!("  Succeeded: {}", summary.succeeded);
    let failed_line = format!("  Failed:    {}", summary.failed);
    if color.enabled() {
        writeln!(w, "{}", succeeded_line.green())?;
        if summary.failed > 0 {
            writeln!(w, "{}", failed_line.red())?;
        } else {
            writeln!(w, "{}", failed_line)?;
        }
    } else {
        writeln!(w, "{}", succeeded_line)?;
        writeln!(w, "{}", failed_line)?;
    }

    let failures: Vec<_> = summary
        .records
        .iter()
        .filter(|r| r.status != RecordStatus::Success)
        .collect();
    if !failures.is_empty() {
        writeln!(w)?;
        for record in failures {
            let label = status_label(record.status);
            let message = record.error_message.as_deref().unwrap_or("no detail");
            if color.enabled() {
                writeln!(
                    w,
                    "  {} {} ({:.2}s): {}",
                    label.red().bold(),
                    record.filename,
                    record.elapsed_seconds,
                    message,
                )?;
            } else {
                writeln!(
                    w,
                    "  {} {} ({:.2}s): {}",
                    label, record.filename, record.elapsed_seconds, message,
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdftoc_core::ProcessingRecord;
    use std::time::Duration;

    fn record(filename: &str, status: RecordStatus, message: Option<&str>) -> ProcessingRecord {
        ProcessingRecord {
            filename: filename.to_string(),
            status,
            elapsed_seconds: 0.5,
            error_message: message.map(String::from),
        }
    }

    #[test]
    fn summary_lists_each_failure_with_its_message() {
        let summary = RunSummary::from_records(
            vec![
                record("good.pdf", RecordStatus::Success, None),
                record("bad.pdf", RecordStatus::Error, Some("failed to open PDF: broken")),
                record("slow.pdf", RecordStatus::Timeout, Some("processing timed out after 10s")),
            ],
            Duration::from_secs(2),
        );

        let mut out = Vec::new();
        print_run_summary(&mut out, &summary, ColorMode(false)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Succeeded: 1"), "got: {text}");
        assert!(text.contains("Failed:    2"), "got: {text}");
        assert!(
            text.contains("failed bad.pdf (0.50s): failed to open PDF: broken"),
            "got: {text}",
        );
        assert!(
            text.contains("timed out slow.pdf (0.50s): processing timed out after 10s"),
            "got: {text}",
        );
    }

    #[test]
    fn clean_run_prints_no_failure_block() {
        let summary = RunSummary::from_records(
            vec![record("only.pdf", RecordStatus::Success, None)],
            Duration::from_secs(1),
        );

        let mut out = Vec::new();
        print_run_summary(&mut out, &summary, ColorMode(false)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("1 file in"), "got: {text}");
        assert!(!text.contains("timed out"), "got: {text}");
        assert!(!text.contains("no detail"), "got: {text}");
    }
}
