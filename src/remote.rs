//! The remote-converter capability: the seam between the orchestration core
//! and whatever service actually renders documents.
//!
//! The batch pipeline only ever talks to [`RemoteConverter`]. The shipped
//! binding is [`crate::drive::DriveConverter`], but tests inject in-memory
//! stubs and a poll-based or webhook-driven backend could slot in behind the
//! same trait without touching the state machine.

use async_trait::async_trait;
use std::fmt;

/// Opaque identifier for a document the remote service is holding.
///
/// Scoped to one [`crate::task::ConversionTask`]. Every handle obtained must
/// be deleted exactly once — either by the normal cleanup step or by the
/// failure path — so the batch never leaks remote storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteHandle(pub String);

impl fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a remote failure should be treated by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Expected to succeed on retry: timeouts, connection resets, 429, 5xx.
    Transient,
    /// Retry cannot help: corrupt input, auth rejection, hard quota, 4xx.
    Permanent,
}

/// A failure reported by the remote service or the transport underneath it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == RemoteErrorKind::Transient
    }
}

/// The document-conversion service the batch is a client of.
///
/// All four operations are suspension points from the task's perspective; a
/// task holds no other task's resources while awaiting any of them.
///
/// The Drive binding converts on import, so its `convert` is an
/// acknowledgement that the import finished. A backend with an explicit
/// conversion job would poll here instead — the state machine does not care.
#[async_trait]
pub trait RemoteConverter: Send + Sync {
    /// Send the document payload; on success the service holds a copy
    /// identified by the returned handle.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        source_mime: &str,
        import_mime: &str,
    ) -> Result<RemoteHandle, RemoteError>;

    /// Wait until the remote reports the format conversion finished.
    async fn convert(&self, handle: &RemoteHandle) -> Result<(), RemoteError>;

    /// Retrieve the converted document as PDF bytes.
    async fn export_pdf(&self, handle: &RemoteHandle) -> Result<Vec<u8>, RemoteError>;

    /// Delete the remote copy. Failures here are ignorable by contract —
    /// callers log them but never let them change a task's outcome.
    async fn delete(&self, handle: &RemoteHandle) -> Result<(), RemoteError>;
}
