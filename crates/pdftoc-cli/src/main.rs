use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pdftoc_core::{run_batch, Config, ProgressEvent, RecordStatus};
use pdftoc_pdf::{ExtractionConfig, StructureExtractor};
use pdftoc_pdf_mupdf::MupdfOpener;

mod output;

use output::ColorMode;

/// Extract titles and section outlines from PDF files into JSON records
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory scanned (non-recursively) for PDF files
    input_dir: Option<PathBuf>,

    /// Directory the JSON records are written to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(long)]
    workers: Option<usize>,

    /// Per-file processing budget in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Pages examined per document during heading analysis
    #[arg(long)]
    max_pages: Option<usize>,

    /// Cap on outline entries per document
    #[arg(long)]
    max_outline_items: Option<usize>,

    /// Suppress the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Resolve configuration: CLI flags > env vars > defaults
    let defaults = Config::default();
    let log_level = if env_truthy("DEBUG") {
        "debug".to_string()
    } else {
        env_var("LOG_LEVEL").unwrap_or(defaults.log_level)
    };
    // An empty LOG_FILE disables the file layer entirely.
    let log_file = match std::env::var("LOG_FILE") {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(PathBuf::from(value)),
        Err(_) => defaults.log_file,
    };
    let config = Config {
        input_dir: cli
            .input_dir
            .or_else(|| env_var("INPUT_DIR").map(PathBuf::from))
            .unwrap_or(defaults.input_dir),
        output_dir: cli
            .output
            .or_else(|| env_var("OUTPUT_DIR").map(PathBuf::from))
            .unwrap_or(defaults.output_dir),
        max_workers: cli
            .workers
            .or_else(|| env_parse("MAX_WORKERS"))
            .unwrap_or(defaults.max_workers),
        max_memory_mb: env_parse("MAX_MEMORY_MB").unwrap_or(defaults.max_memory_mb),
        timeout: Duration::from_secs(
            cli.timeout
                .or_else(|| env_parse("TIMEOUT_SECONDS"))
                .unwrap_or(defaults.timeout.as_secs()),
        ),
        log_level,
        log_file,
        save_sanitization_logs: env_truthy("SAVE_INTERMEDIATE"),
    };
    config.validate()?;

    let log_guard = init_logging(&config);

    let extraction = ExtractionConfig::builder()
        .title_length(
            env_parse("TITLE_MIN_LENGTH").unwrap_or(3),
            env_parse("TITLE_MAX_LENGTH").unwrap_or(500),
        )
        .outline_text_length(
            env_parse("OUTLINE_TEXT_MIN_LENGTH").unwrap_or(2),
            env_parse("OUTLINE_TEXT_MAX_LENGTH").unwrap_or(1000),
        )
        .max_pages_for_analysis(
            cli.max_pages
                .or_else(|| env_parse("MAX_PAGES_FOR_ANALYSIS"))
                .unwrap_or(50),
        )
        .max_outline_items(
            cli.max_outline_items
                .or_else(|| env_parse("MAX_OUTLINE_ITEMS"))
                .unwrap_or(100),
        )
        .build()?;

    if !config.input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", config.input_dir.display());
    }
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let files = discover_pdfs(&config.input_dir)?;
    if files.is_empty() {
        println!("No PDF files found in {}", config.input_dir.display());
        return Ok(());
    }

    let color = ColorMode(!cli.no_color);
    let mut stdout = std::io::stdout();
    if !cli.quiet {
        output::print_batch_header(
            &mut stdout,
            &config.input_dir,
            files.len(),
            config.max_workers.min(files.len()),
            color,
        )?;
    }
    tracing::info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        documents = files.len(),
        workers = config.max_workers,
        "starting batch"
    );

    let progress_bar = if cli.quiet {
        None
    } else {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Some(bar)
    };

    let bar_for_events = progress_bar.clone();
    let progress = move |event: ProgressEvent| {
        let Some(bar) = &bar_for_events else { return };
        match event {
            ProgressEvent::Started { filename, .. } => {
                bar.set_message(filename);
            }
            ProgressEvent::Finished {
                filename,
                status,
                elapsed,
                ..
            } => {
                if status != RecordStatus::Success {
                    bar.println(format!(
                        "{} {} ({:.1}s)",
                        output::status_label(status),
                        filename,
                        elapsed.as_secs_f64(),
                    ));
                }
                bar.inc(1);
            }
        }
    };

    let opener = Arc::new(MupdfOpener::new());
    let processor = Arc::new(StructureExtractor::new(opener, extraction));
    let config = Arc::new(config);
    let summary = run_batch(files, Arc::clone(&config), processor, progress).await;

    if let Some(bar) = progress_bar {
        bar.finish_and_clear();
    }

    let summary_path = config.output_dir.join("processing_summary.json");
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    output::print_run_summary(&mut stdout, &summary, color)?;
    tracing::info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        elapsed_seconds = summary.total_elapsed_seconds,
        "batch complete"
    );

    if summary.failed > 0 {
        // The appender guard must flush before the early exit.
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}

/// Non-recursive scan for `*.pdf` (case-insensitive), sorted by filename
/// so batches are deterministic.
fn discover_pdfs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        let is_pdf = path.is_file()
            && path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
        if is_pdf {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Console logging on stderr, plus a non-blocking file layer when a log
/// file is configured. Returns the appender guard that flushes the file
/// on drop.
fn init_logging(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    match &config.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("pdf_processing.log"));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(
                    directory, file_name,
                ));
            let file = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            None
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.trim().parse().ok())
}

fn env_truthy(name: &str) -> bool {
    env_var(name).map(|v| is_truthy(&v)).unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
