//! Configuration types for a batch conversion run.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across workers, log them, and diff two runs to understand
//! why their outcomes differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on documented
//! defaults for the rest.

use crate::error::BatchError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for one batch conversion run.
///
/// Built via [`BatchConfig::builder()`] or [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use office2pdf::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .concurrency(2)
///     .max_attempts(5)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Number of files converted concurrently. Default: 4.
    ///
    /// The remote service is rate-limited per credential, so the default is
    /// deliberately conservative. Raising it past ~8 mostly trades throughput
    /// for HTTP 429 responses that the retry policy then has to absorb.
    pub concurrency: usize,

    /// Total attempts per remote step before a transient error becomes a
    /// task failure. Default: 3.
    ///
    /// Most 5xx and timeout errors clear on the second attempt. Permanent
    /// errors (corrupt file, auth rejection) bypass this budget entirely.
    pub max_attempts: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s. Exponential backoff
    /// avoids the thundering-herd problem where N concurrent workers retry
    /// simultaneously against an already rate-limited endpoint.
    pub retry_backoff_ms: u64,

    /// Upper bound of the uniform jitter added to each backoff, in
    /// milliseconds. Default: 200.
    ///
    /// Jitter desynchronises workers that were rate-limited in the same
    /// instant and would otherwise retry in lock-step.
    pub retry_jitter_ms: u64,

    /// Enumerate the input directory recursively. Default: false.
    pub recursive: bool,

    /// Reconvert files whose output PDF is already up to date. Default: false.
    ///
    /// Without `force`, a file whose PDF in the output directory is newer
    /// than the input is skipped without contacting the remote service.
    pub force: bool,

    /// Per-HTTP-call timeout in seconds. Default: 120.
    ///
    /// Covers a single upload, export, or delete request. Large spreadsheets
    /// can take tens of seconds to import, so this is generous; a hung
    /// connection still surfaces as a transient error and is retried.
    pub api_timeout_secs: u64,

    /// Optional per-file progress callback (used by the CLI progress bar).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_attempts: 3,
            retry_backoff_ms: 500,
            retry_jitter_ms: 200,
            recursive: false,
            force: false,
            api_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("concurrency", &self.concurrency)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("retry_jitter_ms", &self.retry_jitter_ms)
            .field("recursive", &self.recursive)
            .field("force", &self.force)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn retry_jitter_ms(mut self, ms: u64) -> Self {
        self.config.retry_jitter_ms = ms;
        self
    }

    pub fn recursive(mut self, v: bool) -> Self {
        self.config.recursive = v;
        self
    }

    pub fn force(mut self, v: bool) -> Self {
        self.config.force = v;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(BatchError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.max_attempts == 0 {
            return Err(BatchError::InvalidConfig(
                "At least one attempt is required".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(BatchError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let c = BatchConfig::default();
        assert_eq!(c.concurrency, 4);
        assert_eq!(c.max_attempts, 3);
        assert_eq!(c.retry_backoff_ms, 500);
        assert!(!c.recursive);
        assert!(!c.force);
    }

    #[test]
    fn builder_clamps_zero_concurrency() {
        let c = BatchConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn builder_clamps_zero_attempts() {
        let c = BatchConfig::builder().max_attempts(0).build().unwrap();
        assert_eq!(c.max_attempts, 1);
    }

    #[test]
    fn builder_round_trips_fields() {
        let c = BatchConfig::builder()
            .concurrency(8)
            .max_attempts(5)
            .retry_backoff_ms(100)
            .retry_jitter_ms(50)
            .recursive(true)
            .force(true)
            .api_timeout_secs(30)
            .build()
            .unwrap();
        assert_eq!(c.concurrency, 8);
        assert_eq!(c.max_attempts, 5);
        assert_eq!(c.retry_backoff_ms, 100);
        assert_eq!(c.retry_jitter_ms, 50);
        assert!(c.recursive);
        assert!(c.force);
        assert_eq!(c.api_timeout_secs, 30);
    }
}
