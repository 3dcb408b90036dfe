//! CLI binary for office2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`,
//! wires the Drive converter, and renders the batch report.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use office2pdf::{
    auth, BatchConfig, BatchDriver, BatchProgressCallback, DriveConverter, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a
/// character. Remote error bodies are quoted verbatim in failure messages
/// and may contain multibyte text, so a fixed byte slice is not safe.
fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-file log
/// lines. Works correctly when files complete out-of-order (concurrent mode).
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting batch of {total_files} files…"))
        ));
    }

    fn on_file_start(&self, file_name: &str, _total: usize) {
        self.bar.set_message(file_name.to_string());
    }

    fn on_file_done(&self, file_name: &str, _total: usize) {
        self.bar
            .println(format!("  {} {}", green("✓"), file_name));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, file_name: &str, _total: usize, reason: &str) {
        self.bar.println(format!(
            "  {} {}  {}",
            dim("○"),
            file_name,
            dim(&format!("({reason})"))
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, file_name: &str, _total: usize, error: String) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 100 {
            format!("{}\u{2026}", truncate_on_char_boundary(&error, 99))
        } else {
            error
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), file_name, red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} not converted)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                failed,
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert everything in ./input to ./output
  office2pdf -i input -o output

  # Explicit credential path and more workers
  office2pdf -i docs -o pdfs -s keys/converter.json --concurrency 8

  # Recursive, reconvert even up-to-date files, JSON report on stdout
  office2pdf -i docs -o pdfs --recursive --force --json

SUPPORTED INPUT FORMATS:
  .doc .docx      Word        → application/vnd.google-apps.document
  .ppt .pptx      PowerPoint  → application/vnd.google-apps.presentation
  .xls .xlsx      Excel       → application/vnd.google-apps.spreadsheet
  (extension match is case-insensitive; anything else is skipped, not failed)

EXIT CODES:
  0  every supported file converted (skips are fine)
  1  at least one file failed
  2  setup error (credential, directories, configuration)

CREDENTIAL:
  A Google service-account key file (JSON) with Drive access. The account
  only needs the drive.file scope: files are uploaded, exported as PDF,
  and deleted again within each task.
"#;

/// Convert a directory of Office documents to PDF via the Drive API.
#[derive(Parser, Debug)]
#[command(
    name = "office2pdf",
    version,
    about = "Batch-convert Office documents to PDF via the Google Drive import/export API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the source Office files.
    #[arg(short, long, env = "OFFICE2PDF_INPUT")]
    input: PathBuf,

    /// Directory the PDFs are written to (created if missing).
    #[arg(short, long, env = "OFFICE2PDF_OUTPUT")]
    output: PathBuf,

    /// Path to the Google service-account key file.
    #[arg(
        short = 's',
        long,
        env = "OFFICE2PDF_SERVICE_ACCOUNT",
        default_value = "service-account.json"
    )]
    service_account: PathBuf,

    /// Log level: error, warn, info, debug, trace.
    #[arg(short, long, env = "OFFICE2PDF_LOG", default_value = "info")]
    log: String,

    /// Number of files converted concurrently.
    #[arg(long, env = "OFFICE2PDF_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Descend into subdirectories of the input directory.
    #[arg(long, env = "OFFICE2PDF_RECURSIVE")]
    recursive: bool,

    /// Reconvert files whose output PDF is already up to date.
    #[arg(long, env = "OFFICE2PDF_FORCE")]
    force: bool,

    /// Attempts per file before a transient error becomes a failure.
    #[arg(long, env = "OFFICE2PDF_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    /// Per-HTTP-call timeout in seconds.
    #[arg(long, env = "OFFICE2PDF_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Print the report as JSON on stdout instead of text.
    #[arg(long, env = "OFFICE2PDF_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "OFFICE2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OFFICE2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", red("✗"), e);
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides all the per-file feedback that matters, so
    // library INFO logs are suppressed while it is active (unless the user
    // asked for something chattier than the default).
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.quiet {
        "error".to_string()
    } else if show_progress && cli.log == "info" {
        "error".to_string()
    } else {
        cli.log.clone()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Credential + converter setup (fatal before any task runs) ───────
    let key = auth::load_service_account(&cli.service_account)
        .context("Failed to load service-account credential")?;
    let tokens = Arc::new(
        auth::TokenProvider::new(key, reqwest::Client::new())
            .context("Failed to initialise token provider")?,
    );

    // Exchange once up front so a revoked credential is a setup error, not
    // a wall of identical per-file failures.
    tokens
        .probe()
        .await
        .context("Credential rejected by the token endpoint")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let mut builder = BatchConfig::builder()
        .concurrency(cli.concurrency)
        .max_attempts(cli.max_attempts)
        .recursive(cli.recursive)
        .force(cli.force)
        .api_timeout_secs(cli.api_timeout);
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let converter = Arc::new(
        DriveConverter::new(tokens, config.api_timeout_secs)
            .context("Failed to build Drive client")?,
    );

    // ── Run the batch ────────────────────────────────────────────────────
    let driver = BatchDriver::new(converter, config);
    let report = driver
        .run(&cli.input, &cli.output)
        .await
        .context("Batch setup failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print!("{}", report.render_text());
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
