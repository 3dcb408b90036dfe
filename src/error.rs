//! Error types for the office2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BatchError`] — **Fatal**: the batch cannot start at all (missing
//!   credential file, unreadable input directory, invalid configuration).
//!   Returned as `Err(BatchError)` from [`crate::batch::BatchDriver::run`]
//!   before any file is touched.
//!
//! * [`TaskError`] — **Non-fatal**: a single file failed (transient remote
//!   error after retry exhaustion, corrupt document, unreadable input) but
//!   all other files are fine. Stored inside
//!   [`crate::report::FileOutcome::Failed`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad file.
//!
//! The separation is the propagation policy made type-level: task errors are
//! caught at the task boundary and never abort sibling tasks, while
//! configuration errors abort the run before work begins.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the office2pdf library.
///
/// Per-file failures use [`TaskError`] and are stored in
/// [`crate::report::BatchReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    // ── Directory errors ──────────────────────────────────────────────────
    /// Input directory was not found at the given path.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    InputDirNotFound { path: PathBuf },

    /// Input directory exists but could not be enumerated.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output directory could not be created or written.
    #[error("Failed to prepare output directory '{path}': {source}")]
    OutputDirUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Credential errors ─────────────────────────────────────────────────
    /// The service-account key file is missing or unparsable.
    #[error("Invalid service-account credential '{path}': {detail}")]
    Credential { path: PathBuf, detail: String },

    /// The token endpoint rejected the signed assertion.
    #[error("Token exchange with '{endpoint}' failed: {detail}")]
    TokenExchange { endpoint: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error for a single input file.
///
/// Stored in [`crate::report::FileOutcome::Failed`] when a task reaches its
/// terminal `Failed` state. The overall batch continues regardless.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// A transient remote error persisted through every configured attempt.
    #[error("remote error persisted after {attempts} attempts: {message}")]
    Transient { message: String, attempts: u32 },

    /// The remote service rejected the file in a way retry cannot fix
    /// (corrupt document, quota permanently exhausted, auth rejected).
    #[error("permanent remote error: {message}")]
    Permanent { message: String },

    /// Reading the input file or writing the output PDF failed locally.
    #[error("I/O error on '{path}': {message}")]
    LocalIo { path: PathBuf, message: String },
}

impl TaskError {
    /// Coarse classification used in report entries and exit summaries.
    pub fn kind(&self) -> FailureKind {
        match self {
            TaskError::Transient { .. } => FailureKind::Transient,
            TaskError::Permanent { .. } => FailureKind::Permanent,
            TaskError::LocalIo { .. } => FailureKind::LocalIo,
        }
    }
}

/// Error taxonomy recorded per failed file in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network/timeout/rate-limit failure that outlived the retry budget.
    Transient,
    /// Failure that retrying cannot resolve.
    Permanent,
    /// Local filesystem failure (input unreadable, output unwritable).
    LocalIo,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::Permanent => write!(f, "permanent"),
            FailureKind::LocalIo => write!(f, "local-io"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_display_carries_attempt_count() {
        let e = TaskError::Transient {
            message: "HTTP 503".into(),
            attempts: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("3 attempts"), "got: {msg}");
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn permanent_is_not_transient() {
        let e = TaskError::Permanent {
            message: "HTTP 400".into(),
        };
        assert_eq!(e.kind(), FailureKind::Permanent);
    }

    #[test]
    fn local_io_display() {
        let e = TaskError::LocalIo {
            path: PathBuf::from("/in/a.docx"),
            message: "permission denied".into(),
        };
        assert!(e.to_string().contains("a.docx"));
        assert!(e.to_string().contains("permission denied"));
    }

    #[test]
    fn credential_display() {
        let e = BatchError::Credential {
            path: PathBuf::from("service-account.json"),
            detail: "missing field `private_key`".into(),
        };
        assert!(e.to_string().contains("service-account.json"));
    }

    #[test]
    fn failure_kind_display() {
        assert_eq!(FailureKind::Transient.to_string(), "transient");
        assert_eq!(FailureKind::LocalIo.to_string(), "local-io");
    }
}
