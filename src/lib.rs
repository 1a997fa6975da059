//! # pdfdesk
//!
//! Client for a remote PDF transformation service: compress, merge,
//! image↔PDF conversion, and text extraction (with optional OCR).
//!
//! ## Why this crate?
//!
//! The transformations themselves run on a remote service; what a client
//! actually has to get right is the workflow around them — single-flight
//! submissions, progress that never runs backwards, results that are
//! invalidated the moment their input files change, and automatic re-runs
//! when the user tweaks a parameter after seeing a result. This crate owns
//! that state machine once, instead of re-implementing it per operation.
//!
//! ## Architecture
//!
//! ```text
//! intents (select files / set parameter / submit / download / reset)
//!  │
//!  ├─ Workflow        async driver: dispatch, queue-latest re-runs, saving
//!  ├─ WorkflowController  pure state machine (status, progress, artifact)
//!  ├─ TransformService    collaborator seam → HttpTransformService (reqwest)
//!  └─ RunCallback     lifecycle events for progress bars / UIs
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfdesk::{
//!     ClientConfig, HttpTransformService, InputFile, OperationKind, Workflow,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:8000")
//!         .build()?;
//!     let service = Arc::new(HttpTransformService::new(config)?);
//!
//!     let workflow = Workflow::new(OperationKind::Compress, service);
//!     workflow.select_files(vec![InputFile::from_path("document.pdf").await?]);
//!     workflow.set_parameter("quality", "medium").await?;
//!     workflow.submit().await?;
//!
//!     if let Some(artifact) = workflow.artifact() {
//!         println!(
//!             "saved {} bytes ({}%)",
//!             artifact.comparison.delta, artifact.comparison.delta_percent
//!         );
//!     }
//!     workflow.save_artifact(".").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfdesk` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfdesk = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod metrics;
pub mod operation;
pub mod progress;
pub mod service;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use controller::{
    Artifact, ParamOutcome, RunStatus, RunTicket, Settled, SubmitDecision, WorkflowController,
};
pub use error::{ErrorKind, WorkflowError};
pub use input::InputFile;
pub use metrics::{compare, SizeComparison, SizeDirection};
pub use operation::{
    format_size, ImageFormat, OperationKind, OperationParams, Quality,
};
pub use progress::{NoopRunCallback, ProgressSink, RunCallback, SharedRunCallback};
pub use service::{HttpTransformService, TransformService};
pub use workflow::{SubmitOutcome, Workflow};
