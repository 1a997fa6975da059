//! Client configuration for the remote transformation service.
//!
//! One validated struct, built through a builder, shared by the HTTP service
//! and the CLI. Keeping every knob here makes configs trivial to log and to
//! diff between two runs.

use crate::error::WorkflowError;
use std::time::Duration;

/// Configuration for [`crate::service::HttpTransformService`].
///
/// # Example
/// ```rust
/// use pdfdesk::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8000")
///     .request_timeout_secs(120)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service origin, e.g. `http://localhost:8000`. No trailing slash needed.
    pub base_url: String,

    /// TCP connect timeout. Default: 10 s.
    pub connect_timeout: Duration,

    /// Whole-request timeout covering upload and response. Default: 300 s.
    ///
    /// Transformations are synchronous on the service side: the response only
    /// arrives once the artifact is ready, so this must cover the remote
    /// processing time, not just the network transfer.
    pub request_timeout: Duration,

    /// Upload chunk size in bytes, which sets the progress-tick granularity.
    /// Default: 64 KiB.
    pub upload_chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            upload_chunk_size: 64 * 1024,
        }
    }
}

impl ClientConfig {
    /// Create a new builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL for an operation endpoint.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/api/pdf/{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn upload_chunk_size(mut self, bytes: usize) -> Self {
        self.config.upload_chunk_size = bytes.max(1024);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, WorkflowError> {
        let c = &self.config;
        if c.base_url.is_empty() {
            return Err(WorkflowError::InvalidConfig("base_url must not be empty".into()));
        }
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(WorkflowError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_strips_trailing_slash() {
        let cfg = ClientConfig::builder()
            .base_url("http://localhost:8000/")
            .build()
            .unwrap();
        assert_eq!(
            cfg.endpoint_url("compress"),
            "http://localhost:8000/api/pdf/compress"
        );
    }

    #[test]
    fn rejects_schemeless_base_url() {
        let err = ClientConfig::builder()
            .base_url("localhost:8000")
            .build()
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_base_url() {
        assert!(ClientConfig::builder().base_url("").build().is_err());
    }

    #[test]
    fn chunk_size_floor() {
        let cfg = ClientConfig::builder().upload_chunk_size(1).build().unwrap();
        assert_eq!(cfg.upload_chunk_size, 1024);
    }
}
