//! The aggregated outcome record for one batch invocation.
//!
//! Built incrementally as tasks reach terminal states, then finalised:
//! tasks complete in whatever order the remote service allows, so the
//! report sorts entries by input path to make two runs over the same
//! directory comparable line-for-line.

use crate::error::FailureKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Terminal outcome for one discovered input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Converted; the PDF was written to `output`.
    Done { output: PathBuf, attempts: u32 },
    /// Not converted, and that is fine (unsupported extension, up-to-date).
    Skipped { reason: String },
    /// The task reached its terminal `Failed` state.
    Failed {
        kind: FailureKind,
        message: String,
        attempts: u32,
    },
}

/// One line of the report: an input file and what happened to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub outcome: FileOutcome,
}

/// The outcome record covering every discovered input file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub entries: Vec<ReportEntry>,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

impl BatchReport {
    /// Append one terminal outcome and bump the matching counter.
    pub fn push(&mut self, entry: ReportEntry) {
        match entry.outcome {
            FileOutcome::Done { .. } => self.succeeded += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.entries.push(entry);
    }

    /// Sort entries by input path for deterministic output.
    pub fn finalize(&mut self, elapsed_ms: u64) {
        self.entries.sort_by(|a, b| a.path.cmp(&b.path));
        self.elapsed_ms = elapsed_ms;
    }

    /// The batch succeeded iff no file failed. Skips do not count against it.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Look up one entry by file name (test and CLI convenience).
    pub fn entry(&self, file_name: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.file_name == file_name)
    }

    /// Multi-line human-readable report: one line per file plus a tally.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let line = match &entry.outcome {
                FileOutcome::Done { output, attempts } => {
                    if *attempts > 1 {
                        format!(
                            "  DONE     {} -> {} ({} attempts)",
                            entry.file_name,
                            output.display(),
                            attempts
                        )
                    } else {
                        format!("  DONE     {} -> {}", entry.file_name, output.display())
                    }
                }
                FileOutcome::Skipped { reason } => {
                    format!("  SKIPPED  {} ({reason})", entry.file_name)
                }
                FileOutcome::Failed { kind, message, .. } => {
                    format!("  FAILED   {} [{kind}] {message}", entry.file_name)
                }
            };
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!(
            "Batch complete in {:.2}s | success={} skipped={} failed={}\n",
            self.elapsed_ms as f64 / 1000.0,
            self.succeeded,
            self.skipped,
            self.failed
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(name: &str) -> ReportEntry {
        ReportEntry {
            path: PathBuf::from(format!("/in/{name}")),
            file_name: name.to_string(),
            outcome: FileOutcome::Done {
                output: PathBuf::from(format!("/out/{name}.pdf")),
                attempts: 1,
            },
        }
    }

    #[test]
    fn counters_track_outcomes() {
        let mut report = BatchReport::default();
        report.push(done("a.docx"));
        report.push(ReportEntry {
            path: "/in/n.txt".into(),
            file_name: "n.txt".into(),
            outcome: FileOutcome::Skipped {
                reason: "unsupported".into(),
            },
        });
        report.push(ReportEntry {
            path: "/in/b.pptx".into(),
            file_name: "b.pptx".into(),
            outcome: FileOutcome::Failed {
                kind: FailureKind::Permanent,
                message: "HTTP 400".into(),
                attempts: 1,
            },
        });

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.is_success());
    }

    #[test]
    fn skips_do_not_fail_the_batch() {
        let mut report = BatchReport::default();
        report.push(ReportEntry {
            path: "/in/n.txt".into(),
            file_name: "n.txt".into(),
            outcome: FileOutcome::Skipped {
                reason: "unsupported".into(),
            },
        });
        assert!(report.is_success());
    }

    #[test]
    fn finalize_sorts_by_path() {
        let mut report = BatchReport::default();
        report.push(done("c.docx"));
        report.push(done("a.docx"));
        report.push(done("b.docx"));
        report.finalize(1234);

        let names: Vec<&str> = report
            .entries
            .iter()
            .map(|e| e.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["a.docx", "b.docx", "c.docx"]);
        assert_eq!(report.elapsed_ms, 1234);
    }

    #[test]
    fn render_text_has_tally_line() {
        let mut report = BatchReport::default();
        report.push(done("a.docx"));
        report.finalize(2000);
        let text = report.render_text();
        assert!(text.contains("DONE"));
        assert!(text.contains("success=1 skipped=0 failed=0"));
        assert!(text.contains("2.00s"));
    }

    #[test]
    fn report_round_trips_through_json() {
        let mut report = BatchReport::default();
        report.push(done("a.docx"));
        report.push(ReportEntry {
            path: "/in/b.pptx".into(),
            file_name: "b.pptx".into(),
            outcome: FileOutcome::Failed {
                kind: FailureKind::Transient,
                message: "HTTP 503".into(),
                attempts: 3,
            },
        });
        report.finalize(10);

        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"status\": \"failed\""));
        let back: BatchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.succeeded, 1);
        assert_eq!(back.failed, 1);
    }
}
