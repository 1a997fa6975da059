//! The external transformation collaborator.
//!
//! [`TransformService`] is the seam the workflow layer calls through; tests
//! script it, production uses [`HttpTransformService`] against the real
//! service.
//!
//! ## Wire contract
//!
//! Each operation is a `POST {base}/api/pdf/{endpoint}` multipart request:
//! single-input operations send the payload under the `file` field,
//! multi-input operations repeat the `files` field; parameters travel as
//! plain text fields (`quality`, `format`, `use_ocr`). Errors come back as a
//! JSON `{"detail": …}` envelope whose message is shown to the user verbatim.
//! Extract-text responds with either `{"text": …}` or a plain UTF-8 body.
//!
//! ## Upload progress
//!
//! The request body is a counting byte stream: every chunk pulled off it by
//! the HTTP client advances a shared byte counter and emits a percentage
//! scaled to 0–90. The remaining 10 points cover the service's processing and
//! the response download; 100 fires once the response body is fully read.
//! Ticks are integers and non-decreasing.

use crate::config::ClientConfig;
use crate::error::WorkflowError;
use crate::input::{self, InputFile};
use crate::operation::{OperationKind, OperationParams};
use crate::progress::ProgressSink;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Share of the progress range attributed to the upload.
const UPLOAD_SHARE: u8 = 90;

/// A remote operation the workflow can dispatch.
#[async_trait]
pub trait TransformService: Send + Sync {
    /// Run one transformation and return the artifact bytes.
    ///
    /// Must report `sink` with non-decreasing values and must fail rather
    /// than return a partial artifact.
    async fn submit(
        &self,
        kind: OperationKind,
        files: &[InputFile],
        params: &OperationParams,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Bytes, WorkflowError>;
}

/// reqwest-backed implementation of [`TransformService`].
#[derive(Debug, Clone)]
pub struct HttpTransformService {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpTransformService {
    /// Build a service client from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self, WorkflowError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WorkflowError::Unreachable {
                reason: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    /// One multipart part whose stream advances the shared upload counter.
    fn progress_part(
        &self,
        file: &InputFile,
        sent: Arc<AtomicU64>,
        total: u64,
        sink: Arc<dyn ProgressSink>,
    ) -> multipart::Part {
        let chunk_size = self.config.upload_chunk_size;
        let bytes = file.bytes.clone();
        let len = bytes.len() as u64;

        let chunks: Vec<Bytes> = (0..bytes.len())
            .step_by(chunk_size)
            .map(|start| bytes.slice(start..(start + chunk_size).min(bytes.len())))
            .collect();

        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            let done = sent.fetch_add(chunk.len() as u64, Ordering::SeqCst) + chunk.len() as u64;
            sink.progress(upload_percent(done, total));
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        multipart::Part::stream_with_length(reqwest::Body::wrap_stream(stream), len)
            .file_name(file.name.clone())
    }

    fn map_send_error(&self, err: reqwest::Error) -> WorkflowError {
        if err.is_timeout() {
            WorkflowError::Timeout {
                secs: self.config.request_timeout.as_secs(),
            }
        } else {
            WorkflowError::Unreachable {
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl TransformService for HttpTransformService {
    async fn submit(
        &self,
        kind: OperationKind,
        files: &[InputFile],
        params: &OperationParams,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Bytes, WorkflowError> {
        let url = self.config.endpoint_url(kind.endpoint());
        let total = input::total_size(files).max(1);
        let sent = Arc::new(AtomicU64::new(0));

        let mut form = multipart::Form::new();
        // Single-input operations use `file`; multi-input ones repeat `files`.
        let field = if kind.max_files() == Some(1) {
            "file"
        } else {
            "files"
        };
        for file in files {
            form = form.part(
                field,
                self.progress_part(file, Arc::clone(&sent), total, Arc::clone(&sink)),
            );
        }
        for (name, value) in params.form_fields() {
            form = form.text(name, value);
        }

        info!("{}: POST {} ({} bytes)", kind, url, total);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(WorkflowError::Remote {
                status: status.as_u16(),
                detail: detail_from_body(status.as_u16(), &body),
            });
        }

        let artifact = match kind {
            OperationKind::ExtractText => decode_text_body(content_type.as_deref(), body)?,
            _ => body,
        };

        debug!("{}: received {} byte artifact", kind, artifact.len());
        sink.progress(100);
        Ok(artifact)
    }
}

/// Map cumulative uploaded bytes to the 0–90 progress range.
fn upload_percent(done: u64, total: u64) -> u8 {
    ((done.min(total) * UPLOAD_SHARE as u64) / total) as u8
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    detail: String,
}

/// Best human-readable message for a failed response: the `detail` envelope,
/// else the raw body, else the status code.
fn detail_from_body(status: u16, body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return envelope.detail;
    }
    match std::str::from_utf8(body) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => format!("Service returned HTTP {status}"),
    }
}

#[derive(Deserialize)]
struct TextEnvelope {
    text: String,
}

/// Extract-text responses arrive as `{"text": …}` or a plain UTF-8 body.
fn decode_text_body(content_type: Option<&str>, body: Bytes) -> Result<Bytes, WorkflowError> {
    let is_json = content_type.is_some_and(|ct| ct.contains("json"));
    if is_json {
        if let Ok(envelope) = serde_json::from_slice::<TextEnvelope>(&body) {
            return Ok(Bytes::from(envelope.text));
        }
    }
    match std::str::from_utf8(&body) {
        Ok(_) => Ok(body),
        Err(_) => Err(WorkflowError::InvalidTextEncoding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_percent_never_exceeds_share() {
        assert_eq!(upload_percent(0, 100), 0);
        assert_eq!(upload_percent(50, 100), 45);
        assert_eq!(upload_percent(100, 100), 90);
        // Overshoot (padding, retransmits) stays clamped.
        assert_eq!(upload_percent(150, 100), 90);
    }

    #[test]
    fn detail_envelope_is_preferred() {
        let msg = detail_from_body(422, br#"{"detail": "File is not a valid PDF"}"#);
        assert_eq!(msg, "File is not a valid PDF");
    }

    #[test]
    fn plain_body_is_fallback() {
        assert_eq!(detail_from_body(500, b"internal error"), "internal error");
    }

    #[test]
    fn empty_body_falls_back_to_status() {
        assert_eq!(detail_from_body(503, b""), "Service returned HTTP 503");
    }

    #[test]
    fn text_envelope_unwrapped() {
        let body = Bytes::from_static(br#"{"text": "hello"}"#);
        let out = decode_text_body(Some("application/json"), body).unwrap();
        assert_eq!(out.as_ref(), b"hello");
    }

    #[test]
    fn plain_text_passes_through() {
        let body = Bytes::from_static(b"plain extracted text");
        let out = decode_text_body(Some("text/plain; charset=utf-8"), body.clone()).unwrap();
        assert_eq!(out, body);
    }

    #[test]
    fn invalid_utf8_text_is_rejected() {
        let body = Bytes::from_static(&[0xFF, 0xFE, 0x00]);
        assert!(matches!(
            decode_text_body(None, body),
            Err(WorkflowError::InvalidTextEncoding)
        ));
    }
}
