//! Google Drive v3 binding for [`RemoteConverter`].
//!
//! Drive has no explicit "convert" call: uploading an Office payload with a
//! Google-native target MIME makes Drive convert the document on import, and
//! a later `export` renders it as PDF. The four trait operations map to:
//!
//! * `upload`  — `POST upload/drive/v3/files?uploadType=multipart` with a
//!   metadata part naming the import MIME and a media part carrying the
//!   bytes; payloads over [`RESUMABLE_THRESHOLD_BYTES`] open a resumable
//!   session (`uploadType=resumable`) and send the media in chunks instead
//! * `convert` — `GET files/{id}` confirming the imported document exists
//! * `export_pdf` — `GET files/{id}/export?mimeType=application/pdf`
//! * `delete`  — `DELETE files/{id}`
//!
//! Every response status is classified into the transient/permanent taxonomy
//! here, so the retry policy upstream stays a pure function of error kind.

use crate::auth::TokenProvider;
use crate::remote::{RemoteConverter, RemoteError, RemoteHandle};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// Boundary for the hand-built multipart/related upload body. Drive requires
/// multipart/related (not form-data), which reqwest does not generate.
const BOUNDARY: &str = "office2pdf_upload_boundary";

/// Payloads strictly larger than this use a resumable upload session
/// instead of a single multipart request.
const RESUMABLE_THRESHOLD_BYTES: usize = 5 * 1024 * 1024;

/// Chunk size for resumable uploads. Must be a multiple of 256 KiB.
const RESUMABLE_CHUNK_BYTES: usize = 8 * 1024 * 1024;

/// A [`RemoteConverter`] backed by the Google Drive v3 REST API.
pub struct DriveConverter {
    client: reqwest::Client,
    tokens: Arc<TokenProvider>,
}

impl DriveConverter {
    /// Build a converter with a per-call timeout.
    ///
    /// The `TokenProvider` is shared so all workers reuse one cached access
    /// token instead of racing the token endpoint.
    pub fn new(tokens: Arc<TokenProvider>, api_timeout_secs: u64) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_timeout_secs))
            .build()
            .map_err(|e| RemoteError::permanent(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, tokens })
    }

    async fn bearer(&self) -> Result<String, RemoteError> {
        self.tokens.bearer_token().await
    }
}

/// Map an HTTP response status to the retry taxonomy.
///
/// 429 and 5xx clear on retry (rate limit, overloaded backend); 408 is a
/// server-side timeout. Everything else in 4xx is a hard rejection: bad
/// payload, auth failure, or a handle that no longer exists.
fn status_error(status: StatusCode, context: &str, body: &str) -> RemoteError {
    let message = format!("{context}: HTTP {status}: {body}");
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        RemoteError::transient(message)
    } else {
        RemoteError::permanent(message)
    }
}

/// Map a transport-level reqwest error. Timeouts, connect failures, and
/// broken transfers are all transient; only TLS/builder problems are not.
fn transport_error(e: reqwest::Error, context: &str) -> RemoteError {
    if e.is_builder() {
        RemoteError::permanent(format!("{context}: {e}"))
    } else {
        RemoteError::transient(format!("{context}: {e}"))
    }
}

/// Assemble the multipart/related body: JSON metadata part + media part.
fn multipart_related_body(
    file_name: &str,
    import_mime: &str,
    source_mime: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let metadata = serde_json::json!({
        "name": file_name,
        "mimeType": import_mime,
    });

    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Type: {source_mime}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Consecutive `[start, end)` spans covering a payload of `total` bytes.
fn chunk_spans(total: usize, chunk: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    while offset < total {
        let end = (offset + chunk).min(total);
        spans.push((offset, end));
        offset = end;
    }
    spans
}

/// `Content-Range` value for one chunk of a resumable upload.
fn content_range(start: usize, end: usize, total: usize) -> String {
    format!("bytes {}-{}/{}", start, end - 1, total)
}

#[derive(serde::Deserialize)]
struct CreatedFile {
    id: String,
}

impl DriveConverter {
    /// Large-file upload: open a resumable session, then PUT the media in
    /// [`RESUMABLE_CHUNK_BYTES`] chunks. Drive answers 308 after each
    /// intermediate chunk and 200 with the file metadata after the last one.
    async fn upload_resumable(
        &self,
        bytes: &[u8],
        file_name: &str,
        source_mime: &str,
        import_mime: &str,
    ) -> Result<RemoteHandle, RemoteError> {
        let token = self.bearer().await?;
        let metadata = serde_json::json!({
            "name": file_name,
            "mimeType": import_mime,
        });

        let response = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "resumable"), ("fields", "id")])
            .bearer_auth(&token)
            .header("X-Upload-Content-Type", source_mime)
            .header("X-Upload-Content-Length", bytes.len().to_string())
            .json(&metadata)
            .send()
            .await
            .map_err(|e| transport_error(e, "resumable session"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, "resumable session", &body));
        }
        let session = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                RemoteError::transient("resumable session: missing Location header")
            })?;

        let total = bytes.len();
        for (start, end) in chunk_spans(total, RESUMABLE_CHUNK_BYTES) {
            let response = self
                .client
                .put(&session)
                .bearer_auth(&token)
                .header(
                    reqwest::header::CONTENT_RANGE,
                    content_range(start, end, total),
                )
                .body(bytes[start..end].to_vec())
                .send()
                .await
                .map_err(|e| transport_error(e, "resumable chunk"))?;

            let status = response.status();
            // 308 acknowledges the chunk and asks for the next one.
            if status.as_u16() == 308 {
                continue;
            }
            if status.is_success() {
                let created: CreatedFile = response
                    .json()
                    .await
                    .map_err(|e| transport_error(e, "resumable response"))?;
                debug!(
                    "Uploaded '{}' as Drive file {} (resumable, {} bytes)",
                    file_name, created.id, total
                );
                return Ok(RemoteHandle(created.id));
            }
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, "resumable chunk", &body));
        }

        // The session swallowed the final chunk without completing.
        Err(RemoteError::transient(
            "resumable upload ended without a completed file",
        ))
    }
}

#[async_trait]
impl RemoteConverter for DriveConverter {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        source_mime: &str,
        import_mime: &str,
    ) -> Result<RemoteHandle, RemoteError> {
        if bytes.len() > RESUMABLE_THRESHOLD_BYTES {
            return self
                .upload_resumable(&bytes, file_name, source_mime, import_mime)
                .await;
        }

        let token = self.bearer().await?;
        let body = multipart_related_body(file_name, import_mime, source_mime, &bytes);

        let response = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(e, "upload"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, "upload", &body));
        }

        let created: CreatedFile = response
            .json()
            .await
            .map_err(|e| transport_error(e, "upload response"))?;

        debug!("Uploaded '{}' as Drive file {}", file_name, created.id);
        Ok(RemoteHandle(created.id))
    }

    async fn convert(&self, handle: &RemoteHandle) -> Result<(), RemoteError> {
        // Drive converted on import; fetching the file metadata confirms the
        // imported document exists and is readable before we try to export.
        let token = self.bearer().await?;
        let response = self
            .client
            .get(format!("{FILES_URL}/{}", handle.0))
            .query(&[("fields", "id,mimeType")])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(e, "convert"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, "convert", &body));
        }
        Ok(())
    }

    async fn export_pdf(&self, handle: &RemoteHandle) -> Result<Vec<u8>, RemoteError> {
        let token = self.bearer().await?;
        let response = self
            .client
            .get(format!("{FILES_URL}/{}/export", handle.0))
            .query(&[("mimeType", crate::format::PDF_MIME)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(e, "export"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, "export", &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, "export body"))?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, handle: &RemoteHandle) -> Result<(), RemoteError> {
        let token = self.bearer().await?;
        let response = self
            .client
            .delete(format!("{FILES_URL}/{}", handle.0))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(e, "delete"))?;

        let status = response.status();
        // 404 means the file is already gone, which is the state we wanted.
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, "delete", &body));
        }
        debug!("Deleted Drive file {}", handle.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_5xx_are_transient() {
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "t", "").is_transient());
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "t", "").is_transient());
        assert!(status_error(StatusCode::INTERNAL_SERVER_ERROR, "t", "").is_transient());
        assert!(status_error(StatusCode::REQUEST_TIMEOUT, "t", "").is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        assert!(!status_error(StatusCode::BAD_REQUEST, "t", "").is_transient());
        assert!(!status_error(StatusCode::UNAUTHORIZED, "t", "").is_transient());
        assert!(!status_error(StatusCode::FORBIDDEN, "t", "").is_transient());
        assert!(!status_error(StatusCode::NOT_FOUND, "t", "").is_transient());
    }

    #[test]
    fn status_error_carries_context_and_body() {
        let e = status_error(StatusCode::FORBIDDEN, "upload", "quota exceeded");
        assert!(e.to_string().contains("upload"));
        assert!(e.to_string().contains("403"));
        assert!(e.to_string().contains("quota exceeded"));
    }

    #[test]
    fn chunk_spans_cover_the_payload_without_gaps() {
        let spans = chunk_spans(20 * 1024 * 1024, RESUMABLE_CHUNK_BYTES);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0], (0, 8 * 1024 * 1024));
        assert_eq!(spans[1], (8 * 1024 * 1024, 16 * 1024 * 1024));
        assert_eq!(spans[2], (16 * 1024 * 1024, 20 * 1024 * 1024));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn chunk_spans_of_small_payload_is_single() {
        assert_eq!(chunk_spans(100, RESUMABLE_CHUNK_BYTES), vec![(0, 100)]);
        assert!(chunk_spans(0, RESUMABLE_CHUNK_BYTES).is_empty());
    }

    #[test]
    fn content_range_is_inclusive_with_total() {
        assert_eq!(content_range(0, 100, 250), "bytes 0-99/250");
        assert_eq!(content_range(100, 250, 250), "bytes 100-249/250");
    }

    #[test]
    fn resumable_chunk_is_a_multiple_of_256_kib() {
        assert_eq!(RESUMABLE_CHUNK_BYTES % (256 * 1024), 0);
        assert!(RESUMABLE_THRESHOLD_BYTES < RESUMABLE_CHUNK_BYTES);
    }

    #[test]
    fn multipart_body_layout() {
        let body = multipart_related_body(
            "a.docx",
            "application/vnd.google-apps.document",
            "application/msword",
            b"PAYLOAD",
        );
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with(&format!("--{BOUNDARY}\r\n")));
        assert!(text.contains(r#""name":"a.docx""#));
        assert!(text.contains("Content-Type: application/msword"));
        assert!(text.contains("PAYLOAD"));
        assert!(text.ends_with(&format!("\r\n--{BOUNDARY}--\r\n")));
    }
}
