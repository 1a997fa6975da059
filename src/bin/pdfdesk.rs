//! CLI binary for pdfdesk.
//!
//! A thin shim over the library crate: each subcommand binds one operation
//! descriptor to a workflow, wires the run callback to a progress bar, and
//! saves the artifact under its fixed download name.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfdesk::{
    format_size, ClientConfig, HttpTransformService, InputFile, OperationKind, RunCallback,
    SizeComparison, SizeDirection, SubmitOutcome, Workflow,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal callback: a single percentage bar plus a summary line at the end.
struct CliRunCallback {
    bar: ProgressBar,
}

impl CliRunCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl RunCallback for CliRunCallback {
    fn on_run_start(&self, operation: OperationKind, file_count: usize, input_bytes: u64) {
        self.bar.set_position(0);
        self.bar.set_prefix(operation.name());
        self.bar.println(format!(
            "{} {} file(s), {}",
            dim("→"),
            file_count,
            dim(&format_size(input_bytes))
        ));
    }

    fn on_progress(&self, percent: u8) {
        self.bar.set_position(percent as u64);
    }

    fn on_run_complete(&self, output_bytes: u64, comparison: SizeComparison) {
        self.bar.finish_and_clear();
        let summary = match comparison.direction {
            SizeDirection::Saved => green(&format!(
                "saved {} ({}%)",
                format_size(comparison.delta),
                comparison.delta_percent
            )),
            SizeDirection::Increased => red(&format!(
                "increased by {} ({}%)",
                format_size(comparison.delta),
                comparison.delta_percent
            )),
            SizeDirection::Unchanged => dim("size unchanged"),
        };
        eprintln!(
            "{} {} artifact, {}",
            green("✔"),
            bold(&format_size(output_bytes)),
            summary
        );
    }

    fn on_run_error(&self, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(message));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compress a PDF (medium quality)
  pdfdesk compress document.pdf

  # Compress harder, into a target directory
  pdfdesk compress document.pdf --quality low -o out/

  # Merge several PDFs
  pdfdesk merge a.pdf b.pdf c.pdf

  # Images to one PDF
  pdfdesk image-to-pdf scan1.png scan2.jpg --quality high

  # PDF pages to a ZIP of images
  pdfdesk pdf-to-image slides.pdf --format jpg

  # Extract text, with OCR for scans
  pdfdesk extract-text scan.pdf --ocr

ENVIRONMENT VARIABLES:
  PDFDESK_BASE_URL   Transformation service origin (default http://localhost:8000)
  PDFDESK_TIMEOUT    Request timeout in seconds (default 300)
"#;

/// Submit files to a remote PDF transformation service.
#[derive(Parser, Debug)]
#[command(
    name = "pdfdesk",
    version,
    about = "Compress, merge, convert, and extract text from PDFs via a remote service",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Transformation service origin.
    #[arg(long, global = true, env = "PDFDESK_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Directory the artifact is written to.
    #[arg(short, long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Request timeout in seconds (must cover remote processing time).
    #[arg(long, global = true, env = "PDFDESK_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Disable the progress bar.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reduce the size of a PDF.
    Compress {
        /// PDF file to compress.
        file: PathBuf,
        /// Compression quality.
        #[arg(long, default_value = "medium")]
        quality: String,
    },
    /// Concatenate two or more PDFs.
    Merge {
        /// PDF files, in output order.
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
    },
    /// Build a PDF from images.
    ImageToPdf {
        /// Image files (PNG/JPEG), in page order.
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        /// Output quality.
        #[arg(long, default_value = "medium")]
        quality: String,
    },
    /// Rasterise a PDF's pages into a ZIP of images.
    PdfToImage {
        /// PDF file to convert.
        file: PathBuf,
        /// Image format.
        #[arg(long, default_value = "png")]
        format: String,
    },
    /// Extract text from a PDF or image.
    ExtractText {
        /// PDF or image file.
        file: PathBuf,
        /// Run OCR (for scanned documents).
        #[arg(long)]
        ocr: bool,
    },
}

impl Command {
    fn kind(&self) -> OperationKind {
        match self {
            Command::Compress { .. } => OperationKind::Compress,
            Command::Merge { .. } => OperationKind::Merge,
            Command::ImageToPdf { .. } => OperationKind::ImageToPdf,
            Command::PdfToImage { .. } => OperationKind::PdfToImage,
            Command::ExtractText { .. } => OperationKind::ExtractText,
        }
    }

    fn paths(&self) -> Vec<PathBuf> {
        match self {
            Command::Compress { file, .. }
            | Command::PdfToImage { file, .. }
            | Command::ExtractText { file, .. } => vec![file.clone()],
            Command::Merge { files } | Command::ImageToPdf { files, .. } => files.clone(),
        }
    }

    /// `(name, value)` parameters to apply before submitting.
    fn parameters(&self) -> Vec<(&'static str, String)> {
        match self {
            Command::Compress { quality, .. } | Command::ImageToPdf { quality, .. } => {
                vec![("quality", quality.clone())]
            }
            Command::Merge { .. } => vec![],
            Command::PdfToImage { format, .. } => vec![("format", format.clone())],
            Command::ExtractText { ocr, .. } => vec![("use_ocr", ocr.to_string())],
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Quiet the library while the progress bar is live; it provides all the
    // feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Service and workflow ─────────────────────────────────────────────
    let config = ClientConfig::builder()
        .base_url(&cli.base_url)
        .request_timeout_secs(cli.timeout)
        .build()?;
    let service = Arc::new(HttpTransformService::new(config)?);

    let kind = cli.command.kind();
    let workflow = if show_progress {
        Workflow::with_callback(kind, service, CliRunCallback::new())
    } else {
        Workflow::new(kind, service)
    };

    // ── Load inputs ──────────────────────────────────────────────────────
    let mut files = Vec::new();
    for path in cli.command.paths() {
        files.push(
            InputFile::from_path(&path)
                .await
                .with_context(|| format!("loading '{}'", path.display()))?,
        );
    }
    workflow.select_files(files);

    for (name, value) in cli.command.parameters() {
        workflow.set_parameter(name, &value).await?;
    }

    // ── Run ──────────────────────────────────────────────────────────────
    match workflow.submit().await? {
        SubmitOutcome::Completed => {}
        SubmitOutcome::Failed => {
            bail!(workflow
                .last_error()
                .unwrap_or_else(|| "transformation failed".to_string()));
        }
        SubmitOutcome::AlreadyInFlight | SubmitOutcome::Superseded => {
            bail!("run did not complete");
        }
    }

    let path = workflow.save_artifact(&cli.output_dir).await?;
    if !cli.quiet {
        eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
    }
    Ok(())
}
