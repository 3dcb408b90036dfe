//! The per-file conversion task: a state machine from `Pending` to `Done`
//! or `Failed`.
//!
//! ## States
//!
//! ```text
//! Pending → Uploading → Converting → Exporting → CleaningUp → Done
//!              │            │            │
//!              └────────────┴────────────┴──→ Retrying ──→ (back to Uploading)
//!              any non-terminal state ──────────────────→ Failed
//! ```
//!
//! Retry policy is data, not control flow: the attempt ceiling, backoff base,
//! and jitter bound all come from [`BatchConfig`]. Transient remote errors
//! send the task through `Retrying` with exponential backoff plus uniform
//! jitter; permanent and local-I/O errors go straight to `Failed`.
//!
//! ## Handle hygiene
//!
//! Once an upload succeeds the task owns a [`RemoteHandle`], and that handle
//! is deleted exactly once on every path out — the normal `CleaningUp` step,
//! the between-retries cleanup, or the failure path. A cleanup failure is
//! logged and ignored; it never changes the outcome the export step already
//! determined.

use crate::config::BatchConfig;
use crate::error::TaskError;
use crate::format;
use crate::remote::{RemoteConverter, RemoteError, RemoteHandle};
use crate::report::FileOutcome;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// One discovered input file. Immutable once enumerated.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

/// Where a task currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Uploading,
    Converting,
    Exporting,
    CleaningUp,
    /// Transient sub-state between failed remote attempts.
    Retrying,
    Done,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed)
    }
}

/// The state machine governing one file's conversion.
///
/// Owned exclusively by the worker executing it; no task state is ever
/// shared across workers.
pub struct ConversionTask {
    file: InputFile,
    source_mime: &'static str,
    import_mime: &'static str,
    output_path: PathBuf,
    state: TaskState,
    attempt: u32,
    handle: Option<RemoteHandle>,
}

impl ConversionTask {
    /// Admit a supported input file, targeting `<stem>.pdf` in `output_dir`.
    pub fn new(
        file: InputFile,
        source_mime: &'static str,
        import_mime: &'static str,
        output_dir: &Path,
    ) -> Self {
        let output_path = output_dir.join(format::pdf_output_name(&file.file_name));
        Self {
            file,
            source_mime,
            import_mime,
            output_path,
            state: TaskState::Pending,
            attempt: 0,
            handle: None,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Name of the underlying input file (for progress reporting).
    pub fn file_name(&self) -> &str {
        &self.file.file_name
    }

    fn set_state(&mut self, next: TaskState) {
        debug!(
            "{}: {:?} → {:?}",
            self.file.file_name, self.state, next
        );
        self.state = next;
    }

    /// Drive the task to a terminal state and report the outcome.
    ///
    /// Never returns an error: every failure is caught at this boundary and
    /// folded into [`FileOutcome::Failed`] so one bad file cannot abort its
    /// siblings.
    pub async fn run(
        mut self,
        converter: &dyn RemoteConverter,
        config: &BatchConfig,
    ) -> (InputFile, FileOutcome) {
        // Up-to-date short circuit: an output PDF at least as new as the
        // input means there is nothing to do unless the caller forces it.
        // The lifecycle never starts for a skip, so the state stays Pending
        // rather than claiming a terminal Done for work that did not happen.
        if !config.force && output_is_current(&self.file.path, &self.output_path) {
            info!("Skipping (up-to-date): {}", self.file.file_name);
            return (
                self.file,
                FileOutcome::Skipped {
                    reason: "up-to-date".into(),
                },
            );
        }

        let bytes = match tokio::fs::read(&self.file.path).await {
            Ok(b) => b,
            Err(e) => {
                self.set_state(TaskState::Failed);
                let err = TaskError::LocalIo {
                    path: self.file.path.clone(),
                    message: e.to_string(),
                };
                return self.failed(err);
            }
        };

        info!(
            "Converting {} ({}) -> {}",
            self.file.file_name,
            format_size(self.file.size),
            self.output_path.display()
        );

        let mut last_transient: Option<RemoteError> = None;

        while self.attempt < config.max_attempts {
            self.attempt += 1;

            if self.attempt > 1 {
                self.set_state(TaskState::Retrying);
                let delay = backoff_delay(config, self.attempt - 1);
                warn!(
                    "{}: retry {}/{} after {:?}",
                    self.file.file_name, self.attempt, config.max_attempts, delay
                );
                sleep(delay).await;
            }

            match self.attempt_once(converter, &bytes).await {
                Ok(()) => {
                    self.cleanup(converter).await;
                    self.set_state(TaskState::Done);
                    info!("Saved PDF: {}", self.output_path.display());
                    let attempts = self.attempt;
                    return (
                        self.file,
                        FileOutcome::Done {
                            output: self.output_path,
                            attempts,
                        },
                    );
                }
                Err(StepError::Remote(e)) if e.is_transient() => {
                    warn!(
                        "{}: attempt {} failed — {}",
                        self.file.file_name, self.attempt, e
                    );
                    // Drop the half-processed remote copy before retrying so
                    // a retried upload never orphans the previous one.
                    self.cleanup(converter).await;
                    last_transient = Some(e);
                }
                Err(StepError::Remote(e)) => {
                    self.cleanup(converter).await;
                    self.set_state(TaskState::Failed);
                    return self.failed(TaskError::Permanent { message: e.message });
                }
                Err(StepError::Local(err)) => {
                    self.cleanup(converter).await;
                    self.set_state(TaskState::Failed);
                    return self.failed(err);
                }
            }
        }

        // Retry budget exhausted.
        self.set_state(TaskState::Failed);
        let attempts = self.attempt;
        let message = last_transient
            .map(|e| e.message)
            .unwrap_or_else(|| "unknown transient error".into());
        self.failed(TaskError::Transient { message, attempts })
    }

    /// One full upload → convert → export → write pass.
    async fn attempt_once(
        &mut self,
        converter: &dyn RemoteConverter,
        bytes: &[u8],
    ) -> Result<(), StepError> {
        self.set_state(TaskState::Uploading);
        let handle = converter
            .upload(
                bytes.to_vec(),
                &self.file.file_name,
                self.source_mime,
                self.import_mime,
            )
            .await?;
        debug!("Uploaded {} (id={})", self.file.file_name, handle);
        self.handle = Some(handle.clone());

        self.set_state(TaskState::Converting);
        converter.convert(&handle).await?;

        self.set_state(TaskState::Exporting);
        let pdf = converter.export_pdf(&handle).await?;

        write_atomic(&self.output_path, &pdf)
            .await
            .map_err(|e| StepError::Local(TaskError::LocalIo {
                path: self.output_path.clone(),
                message: e.to_string(),
            }))?;

        Ok(())
    }

    /// Delete the remote handle if one exists. Unconditional and ignorable:
    /// a delete failure is logged at WARN but the task outcome stands.
    async fn cleanup(&mut self, converter: &dyn RemoteConverter) {
        if let Some(handle) = self.handle.take() {
            self.set_state(TaskState::CleaningUp);
            if let Err(e) = converter.delete(&handle).await {
                warn!(
                    "{}: failed to delete remote file {}: {}",
                    self.file.file_name, handle, e
                );
            }
        }
    }

    fn failed(self, err: TaskError) -> (InputFile, FileOutcome) {
        warn!("{}: failed — {}", self.file.file_name, err);
        let outcome = FileOutcome::Failed {
            kind: err.kind(),
            message: err.to_string(),
            attempts: self.attempt,
        };
        (self.file, outcome)
    }
}

enum StepError {
    Remote(RemoteError),
    Local(TaskError),
}

impl From<RemoteError> for StepError {
    fn from(e: RemoteError) -> Self {
        StepError::Remote(e)
    }
}

/// Exponential backoff with uniform jitter for the given failed attempt
/// (1-indexed): `retry_backoff_ms * 2^(failed-1) + U(0, retry_jitter_ms)`.
fn backoff_delay(config: &BatchConfig, failed_attempts: u32) -> Duration {
    use rand::Rng;
    let base = config
        .retry_backoff_ms
        .saturating_mul(1u64 << (failed_attempts.saturating_sub(1)).min(16));
    let jitter = rand::rng().random_range(0..=config.retry_jitter_ms);
    Duration::from_millis(base.saturating_add(jitter))
}

/// True when the output PDF exists and is at least as new as the input.
fn output_is_current(input: &Path, output: &Path) -> bool {
    let (Ok(in_meta), Ok(out_meta)) = (std::fs::metadata(input), std::fs::metadata(output)) else {
        return false;
    };
    match (in_meta.modified(), out_meta.modified()) {
        (Ok(in_mtime), Ok(out_mtime)) => out_mtime >= in_mtime,
        _ => false,
    }
}

/// Atomic write: temp file in the same directory, then rename.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Human-readable byte count for log lines.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    for (i, unit) in UNITS.iter().enumerate() {
        if size < 1024.0 || i == UNITS.len() - 1 {
            return if i == 0 {
                format!("{bytes} {unit}")
            } else {
                format!("{size:.1} {unit}")
            };
        }
        size /= 1024.0;
    }
    unreachable!()
}
