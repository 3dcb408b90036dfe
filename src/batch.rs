//! The batch driver: enumerate, classify, convert concurrently, aggregate.
//!
//! One driver call is one batch. The driver enumerates the input directory,
//! classifies each file through the format policy, admits each supported
//! file as a [`ConversionTask`], and fans the tasks out over a bounded pool
//! (`buffer_unordered`). All tasks run to completion: a file's failure is
//! recorded in the report and never cancels its siblings.
//!
//! The only cross-task state is the shared converter handle and the report
//! accumulator; the accumulator is filled from completed futures on the
//! driver's own task, so no locking is needed.

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::format::{self, Classification};
use crate::remote::RemoteConverter;
use crate::report::{BatchReport, FileOutcome, ReportEntry};
use crate::task::{ConversionTask, InputFile};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs batches of conversions against one remote converter.
pub struct BatchDriver {
    converter: Arc<dyn RemoteConverter>,
    config: BatchConfig,
}

impl BatchDriver {
    /// The converter is injected so tests (and alternative backends) can
    /// substitute the Drive binding without touching the driver.
    pub fn new(converter: Arc<dyn RemoteConverter>, config: BatchConfig) -> Self {
        Self { converter, config }
    }

    /// Convert every supported file under `input_dir` into `output_dir`.
    ///
    /// Fatal setup problems (missing input directory, unwritable output
    /// directory) return `Err` before any task starts; everything after that
    /// point is recorded per file in the [`BatchReport`].
    pub async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<BatchReport, BatchError> {
        let started = Instant::now();

        if !input_dir.is_dir() {
            return Err(BatchError::InputDirNotFound {
                path: input_dir.to_path_buf(),
            });
        }
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| BatchError::OutputDirUnwritable {
                path: output_dir.to_path_buf(),
                source: e,
            })?;

        let files = enumerate_files(input_dir, self.config.recursive)?;

        let mut report = BatchReport::default();
        let mut tasks = Vec::new();

        for file in files {
            match format::classify(&file.file_name) {
                Classification::Supported {
                    source_mime,
                    import_mime,
                } => {
                    tasks.push(ConversionTask::new(file, source_mime, import_mime, output_dir));
                }
                Classification::Unsupported => {
                    debug!("Skipping unsupported file: {}", file.path.display());
                    report.push(ReportEntry {
                        path: file.path,
                        file_name: file.file_name,
                        outcome: FileOutcome::Skipped {
                            reason: "unsupported".into(),
                        },
                    });
                }
            }
        }

        let total = tasks.len();
        if total == 0 {
            warn!(
                "Input directory has no supported files: {}",
                input_dir.display()
            );
            report.finalize(started.elapsed().as_millis() as u64);
            return Ok(report);
        }

        info!(
            "Starting batch: {} files ({} workers)",
            total, self.config.concurrency
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total);
        }

        let outcomes: Vec<(InputFile, FileOutcome)> = stream::iter(tasks.into_iter().map(|task| {
            let converter = Arc::clone(&self.converter);
            let config = self.config.clone();
            async move {
                let name = task.file_name().to_string();
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_start(&name, total);
                }
                let (file, outcome) = task.run(converter.as_ref(), &config).await;
                if let Some(ref cb) = config.progress_callback {
                    match &outcome {
                        FileOutcome::Done { .. } => cb.on_file_done(&name, total),
                        FileOutcome::Skipped { reason } => cb.on_file_skipped(&name, total, reason),
                        FileOutcome::Failed { message, .. } => {
                            cb.on_file_error(&name, total, message.clone())
                        }
                    }
                }
                (file, outcome)
            }
        }))
        .buffer_unordered(self.config.concurrency)
        .collect()
        .await;

        for (file, outcome) in outcomes {
            report.push(ReportEntry {
                path: file.path,
                file_name: file.file_name,
                outcome,
            });
        }

        report.finalize(started.elapsed().as_millis() as u64);
        warn_if_all_failures_are_auth(&report);

        info!(
            "Batch complete in {}ms | success={} skipped={} failed={}",
            report.elapsed_ms, report.succeeded, report.skipped, report.failed
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total, report.succeeded);
        }

        Ok(report)
    }
}

/// Enumerate regular files in `dir`, sorted by file name
/// (case-insensitively, so runs are deterministic across filesystems).
///
/// Entries that cannot be stat'ed are logged and dropped rather than
/// failing the batch — matching the per-file isolation policy.
fn enumerate_files(dir: &Path, recursive: bool) -> Result<Vec<InputFile>, BatchError> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir).min_depth(1) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(file) = stat_input(entry.path()) {
                files.push(file);
            }
        }
    } else {
        let read_dir = std::fs::read_dir(dir).map_err(|e| BatchError::InputDirUnreadable {
            path: dir.to_path_buf(),
            source: e,
        })?;
        for entry in read_dir {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(file) = stat_input(&path) {
                files.push(file);
            }
        }
    }

    files.sort_by(|a, b| {
        a.file_name
            .to_lowercase()
            .cmp(&b.file_name.to_lowercase())
    });
    Ok(files)
}

fn stat_input(path: &Path) -> Option<InputFile> {
    let file_name = path.file_name()?.to_str()?.to_string();
    match std::fs::metadata(path) {
        Ok(meta) => Some(InputFile {
            path: path.to_path_buf(),
            file_name,
            size: meta.len(),
        }),
        Err(e) => {
            warn!("Skipping {} (stat failed: {})", path.display(), e);
            None
        }
    }
}

fn warn_if_all_failures_are_auth(report: &BatchReport) {
    if report.failed < 2 {
        return;
    }
    let all_auth = report.entries.iter().all(|e| match &e.outcome {
        FileOutcome::Failed { message, .. } => {
            message.contains("HTTP 401") || message.contains("HTTP 403")
        }
        _ => true,
    });
    if all_auth {
        warn!(
            "All {} failures were authorization rejections; check the service-account credential",
            report.failed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"contents").unwrap();
    }

    #[test]
    fn enumeration_is_sorted_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Zeta.docx");
        touch(dir.path(), "alpha.pptx");
        touch(dir.path(), "Beta.xlsx");

        let files = enumerate_files(dir.path(), false).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["alpha.pptx", "Beta.xlsx", "Zeta.docx"]);
    }

    #[test]
    fn non_recursive_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "top.docx");
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "deep.docx");

        let files = enumerate_files(dir.path(), false).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "top.docx");
    }

    #[test]
    fn recursive_descends_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "top.docx");
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "deep.docx");

        let files = enumerate_files(dir.path(), true).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["deep.docx", "top.docx"]);
    }

    #[test]
    fn enumeration_records_sizes() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.docx");
        let files = enumerate_files(dir.path(), false).unwrap();
        assert_eq!(files[0].size, "contents".len() as u64);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let err = enumerate_files(Path::new("/definitely/missing"), false).unwrap_err();
        assert!(matches!(err, BatchError::InputDirUnreadable { .. }));
    }
}
