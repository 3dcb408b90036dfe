//! # office2pdf
//!
//! Batch-convert Office documents (.doc/.docx/.ppt/.pptx/.xls/.xlsx) to PDF
//! by delegating the rendering to the Google Drive import/export API.
//!
//! ## Why this crate?
//!
//! Rendering Office formats faithfully requires an office suite. Instead of
//! bundling one, this crate uploads each document to Drive with a
//! Google-native import target (which converts it on ingestion), exports the
//! result as PDF, and deletes the remote copy — orchestrating the whole batch
//! with bounded concurrency, per-file failure isolation, and retry with
//! exponential backoff against the rate-limited API.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input dir
//!  │
//!  ├─ 1. Enumerate  list files (optionally recursive), sort by name
//!  ├─ 2. Classify   extension → supported format + MIME pair, or skip
//!  ├─ 3. Convert    N concurrent tasks: upload → convert → export → cleanup
//!  └─ 4. Report     per-file outcome (done / skipped / failed) + tally
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use office2pdf::{auth, BatchConfig, BatchDriver, DriveConverter};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = auth::load_service_account(Path::new("service-account.json"))?;
//!     let tokens = Arc::new(auth::TokenProvider::new(key, reqwest::Client::new())?);
//!     let config = BatchConfig::default();
//!     let converter = Arc::new(DriveConverter::new(tokens, config.api_timeout_secs)?);
//!
//!     let driver = BatchDriver::new(converter, config);
//!     let report = driver.run(Path::new("input"), Path::new("output")).await?;
//!     print!("{}", report.render_text());
//!     std::process::exit(if report.is_success() { 0 } else { 1 });
//! }
//! ```
//!
//! ## Failure model
//!
//! One bad file never aborts the batch: each task catches its own errors and
//! records them in the [`BatchReport`]. Only setup problems (credential,
//! directories, configuration) return `Err` from [`BatchDriver::run`].
//! Transient remote errors (timeouts, 429, 5xx) are retried with exponential
//! backoff and jitter; permanent ones are not.
//!
//! ## Known limitation
//!
//! Cleanup of remote copies is best-effort under cancellation: a process
//! interrupt in the middle of an upload can leak a file on the Drive side.
//! Within a normally-completing run every uploaded handle is deleted exactly
//! once, on both the success and the failure path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod auth;
pub mod batch;
pub mod config;
pub mod drive;
pub mod error;
pub mod format;
pub mod progress;
pub mod remote;
pub mod report;
pub mod task;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::BatchDriver;
pub use config::{BatchConfig, BatchConfigBuilder};
pub use drive::DriveConverter;
pub use error::{BatchError, FailureKind, TaskError};
pub use format::{classify, Classification};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use remote::{RemoteConverter, RemoteError, RemoteErrorKind, RemoteHandle};
pub use report::{BatchReport, FileOutcome, ReportEntry};
pub use task::{ConversionTask, InputFile, TaskState};
