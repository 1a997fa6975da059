//! Error types for the pdfdesk client.
//!
//! Every failure carries a [`WorkflowError::kind`] classification so callers
//! can route it without matching on individual variants:
//!
//! * [`ErrorKind::Validation`] — the request never left the machine (too few
//!   files, unknown parameter, bad magic bytes). Recoverable: file and
//!   parameter selections survive, fix the input and submit again.
//! * [`ErrorKind::Transport`] — the remote service failed or was unreachable.
//!   Recoverable the same way; the message is shown to the user verbatim.
//! * [`ErrorKind::IllegalState`] — a programming/usage error such as
//!   downloading before any run completed. Not user-facing.
//! * [`ErrorKind::Io`] / [`ErrorKind::Config`] — local disk and builder
//!   failures respectively.
//!
//! Validation errors are raised before any network call and never move the
//! workflow out of its current status.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`WorkflowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before any network call.
    Validation,
    /// The remote transformation service failed or was unreachable.
    Transport,
    /// Operation invoked in a state that does not support it.
    IllegalState,
    /// Local filesystem failure.
    Io,
    /// Invalid client configuration.
    Config,
}

/// All errors returned by the pdfdesk library.
#[derive(Debug, Error)]
pub enum WorkflowError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Fewer files selected than the operation requires.
    #[error("{operation} requires at least {required} file(s), got {actual}")]
    NotEnoughFiles {
        operation: &'static str,
        required: usize,
        actual: usize,
    },

    /// More files selected than the operation accepts.
    #[error("{operation} accepts at most {allowed} file(s), got {actual}")]
    TooManyFiles {
        operation: &'static str,
        allowed: usize,
        actual: usize,
    },

    /// Parameter name not in the operation's schema.
    #[error("'{operation}' has no parameter named '{name}'")]
    UnknownParameter {
        operation: &'static str,
        name: String,
    },

    /// Parameter value outside the allowed domain.
    #[error("Invalid value '{value}' for parameter '{name}' (expected one of: {expected})")]
    InvalidParameterValue {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// File content does not match the type the operation expects.
    #[error("'{name}' is not a valid {expected} file\nFirst bytes: {magic:?}")]
    WrongFileType {
        name: String,
        expected: &'static str,
        magic: [u8; 4],
    },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The service answered with a non-success status.
    ///
    /// `detail` is taken from the service's `{"detail": …}` envelope when
    /// present, otherwise from the response body or status line, and is
    /// displayed to the user as-is.
    #[error("{detail}")]
    Remote { status: u16, detail: String },

    /// The request could not be sent or the response not read.
    #[error("Transformation service unreachable: {reason}")]
    Unreachable { reason: String },

    /// The request exceeded the configured timeout.
    #[error("Request timed out after {secs}s\nIncrease --timeout or check the service.")]
    Timeout { secs: u64 },

    /// The extract-text response body was not valid UTF-8.
    #[error("Service returned text that is not valid UTF-8")]
    InvalidTextEncoding,

    // ── Illegal-state errors ──────────────────────────────────────────────
    /// Download requested while no artifact exists.
    #[error("No artifact to download — no run has completed")]
    NoArtifact,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Input file missing at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Could not read an input file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the artifact file.
    #[error("Failed to write artifact '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WorkflowError {
    /// Classify this error for routing and display decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NotEnoughFiles { .. }
            | WorkflowError::TooManyFiles { .. }
            | WorkflowError::UnknownParameter { .. }
            | WorkflowError::InvalidParameterValue { .. }
            | WorkflowError::WrongFileType { .. } => ErrorKind::Validation,

            WorkflowError::Remote { .. }
            | WorkflowError::Unreachable { .. }
            | WorkflowError::Timeout { .. }
            | WorkflowError::InvalidTextEncoding => ErrorKind::Transport,

            WorkflowError::NoArtifact => ErrorKind::IllegalState,

            WorkflowError::FileNotFound { .. }
            | WorkflowError::ReadFailed { .. }
            | WorkflowError::WriteFailed { .. } => ErrorKind::Io,

            WorkflowError::InvalidConfig(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_enough_files_display() {
        let e = WorkflowError::NotEnoughFiles {
            operation: "Merge",
            required: 2,
            actual: 1,
        };
        let msg = e.to_string();
        assert!(msg.contains("Merge"), "got: {msg}");
        assert!(msg.contains("at least 2"), "got: {msg}");
    }

    #[test]
    fn remote_detail_is_shown_verbatim() {
        let e = WorkflowError::Remote {
            status: 422,
            detail: "File is not a valid PDF".into(),
        };
        assert_eq!(e.to_string(), "File is not a valid PDF");
    }

    #[test]
    fn kinds_match_taxonomy() {
        assert_eq!(
            WorkflowError::NotEnoughFiles {
                operation: "Merge",
                required: 2,
                actual: 0
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            WorkflowError::Timeout { secs: 30 }.kind(),
            ErrorKind::Transport
        );
        assert_eq!(WorkflowError::NoArtifact.kind(), ErrorKind::IllegalState);
        assert_eq!(
            WorkflowError::InvalidConfig("bad".into()).kind(),
            ErrorKind::Config
        );
    }

    #[test]
    fn invalid_parameter_value_names_domain() {
        let e = WorkflowError::InvalidParameterValue {
            name: "quality",
            value: "ultra".into(),
            expected: "low, medium, high",
        };
        assert!(e.to_string().contains("low, medium, high"));
    }
}
