//! Async workflow driver: binds the controller to the remote collaborator.
//!
//! [`Workflow`] owns the [`WorkflowController`] behind a mutex, a
//! [`TransformService`], and a [`RunCallback`] for the presentation adapter.
//! All state transitions happen inside short lock scopes; the only suspension
//! point is the service call itself, which runs without the lock held. The
//! controller's sequence check makes a late-arriving result from a superseded
//! run harmless.
//!
//! The queue-latest policy lives here: when a parameter changes mid-flight the
//! controller defers it, and [`Workflow::submit`] starts exactly one follow-up
//! run with the latest parameters after the current run settles.

use crate::controller::{
    Artifact, ParamOutcome, RunStatus, SubmitDecision, WorkflowController,
};
use crate::error::WorkflowError;
use crate::input::InputFile;
use crate::operation::OperationKind;
use crate::progress::{NoopRunCallback, ProgressSink, RunCallback, SharedRunCallback};
use crate::service::TransformService;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Terminal outcome of a [`Workflow::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The run (and any queued follow-up) completed; an artifact is held.
    Completed,
    /// The final run failed; see [`Workflow::last_error`].
    Failed,
    /// Nothing happened: another submission was already in flight.
    AlreadyInFlight,
    /// The run was superseded by `reset`/`select_files` while in flight; its
    /// result was discarded.
    Superseded,
}

/// One operation workflow bound to a transformation service.
pub struct Workflow {
    controller: Arc<Mutex<WorkflowController>>,
    service: Arc<dyn TransformService>,
    callback: SharedRunCallback,
}

impl Workflow {
    /// New workflow with a no-op presentation callback.
    pub fn new(kind: OperationKind, service: Arc<dyn TransformService>) -> Self {
        Self::with_callback(kind, service, Arc::new(NoopRunCallback))
    }

    /// New workflow that reports run events to `callback`.
    pub fn with_callback(
        kind: OperationKind,
        service: Arc<dyn TransformService>,
        callback: SharedRunCallback,
    ) -> Self {
        Self {
            controller: Arc::new(Mutex::new(WorkflowController::new(kind))),
            service,
            callback,
        }
    }

    // ── Intents ───────────────────────────────────────────────────────────

    /// Replace the FileSet; discards any artifact and returns to `Idle`.
    pub fn select_files(&self, files: Vec<InputFile>) {
        self.lock().select_files(files);
    }

    /// Update a parameter; performs the reactive re-run when a completed
    /// result exists for the current FileSet.
    ///
    /// Returns `Some(outcome)` when a re-run was performed, `None` when the
    /// change required none (no completed result yet, or the in-flight submit
    /// loop will pick it up when the current run settles).
    pub async fn set_parameter(
        &self,
        name: &str,
        value: &str,
    ) -> Result<Option<SubmitOutcome>, WorkflowError> {
        let outcome = self.lock().set_parameter(name, value)?;
        match outcome {
            ParamOutcome::RerunRequested => {
                debug!("parameter change triggers reactive re-run");
                self.submit().await.map(Some)
            }
            ParamOutcome::Updated | ParamOutcome::Deferred => Ok(None),
        }
    }

    /// Validate, dispatch, and settle a run — plus any follow-up run queued
    /// by mid-flight parameter changes.
    pub async fn submit(&self) -> Result<SubmitOutcome, WorkflowError> {
        loop {
            let ticket = match self.lock().begin_submit()? {
                SubmitDecision::Accepted(t) => t,
                SubmitDecision::InFlight => return Ok(SubmitOutcome::AlreadyInFlight),
            };

            self.callback
                .on_run_start(ticket.kind, ticket.files.len(), ticket.input_bytes);

            let sink: Arc<dyn ProgressSink> = Arc::new(ControllerSink {
                controller: Arc::clone(&self.controller),
                callback: Arc::clone(&self.callback),
                seq: ticket.seq,
            });

            let result = self
                .service
                .submit(ticket.kind, &ticket.files, &ticket.params, sink)
                .await;
            let error_message = result.as_ref().err().map(ToString::to_string);

            let (settled, summary) = {
                let mut controller = self.lock();
                let settled = controller.finish_run(ticket.seq, result);
                let summary = controller
                    .artifact()
                    .filter(|_| settled.applied && error_message.is_none())
                    .map(|a| (a.output_bytes, a.comparison));
                (settled, summary)
            };

            if !settled.applied {
                info!("run #{} superseded; result discarded", ticket.seq);
                return Ok(SubmitOutcome::Superseded);
            }

            match (&error_message, summary) {
                (None, Some((output_bytes, comparison))) => {
                    self.callback.on_run_complete(output_bytes, comparison);
                }
                (Some(message), _) => self.callback.on_run_error(message),
                _ => {}
            }

            if settled.rerun {
                debug!("starting queued follow-up run with latest parameters");
                continue;
            }

            return Ok(if error_message.is_none() {
                SubmitOutcome::Completed
            } else {
                SubmitOutcome::Failed
            });
        }
    }

    /// Clear files, artifact, progress, and error; parameters persist.
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Write the artifact into `dir` under the operation's fixed filename.
    ///
    /// Fails with `IllegalStateError` when no run has completed. The write is
    /// atomic (temp file + rename) so a crash never leaves a partial
    /// artifact.
    pub async fn save_artifact(&self, dir: impl AsRef<Path>) -> Result<PathBuf, WorkflowError> {
        let (bytes, filename) = {
            let controller = self.lock();
            let (artifact, filename) = controller.download_target()?;
            (artifact.bytes.clone(), filename)
        };

        let dir = dir.as_ref();
        let path = dir.join(filename);
        let write_err = |e| WorkflowError::WriteFailed {
            path: path.clone(),
            source: e,
        };

        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        let tmp_path = dir.join(format!("{filename}.tmp"));
        tokio::fs::write(&tmp_path, &bytes).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(write_err)?;

        info!("artifact saved: {}", path.display());
        Ok(path)
    }

    // ── Presentation accessors ────────────────────────────────────────────

    pub fn status(&self) -> RunStatus {
        self.lock().status()
    }

    pub fn progress(&self) -> u8 {
        self.lock().progress()
    }

    pub fn artifact(&self) -> Option<Artifact> {
        self.lock().artifact().cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error().map(str::to_owned)
    }

    pub fn file_count(&self) -> usize {
        self.lock().files().len()
    }

    // ── Internal ──────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, WorkflowController> {
        // A poisoned lock means a panic mid-transition; the state machine has
        // no partially-applied transitions, so continuing is safe.
        self.controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Forwards service progress into the controller (sequence-checked) and on to
/// the presentation callback with the clamped, monotone value.
struct ControllerSink {
    controller: Arc<Mutex<WorkflowController>>,
    callback: SharedRunCallback,
    seq: u64,
}

impl ProgressSink for ControllerSink {
    fn progress(&self, percent: u8) {
        let effective = {
            let mut controller = self
                .controller
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            controller.apply_progress(self.seq, percent);
            controller.progress()
        };
        self.callback.on_progress(effective);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationParams;
    use async_trait::async_trait;
    use bytes::Bytes;

    struct FixedService {
        output: Bytes,
    }

    #[async_trait]
    impl TransformService for FixedService {
        async fn submit(
            &self,
            _kind: OperationKind,
            _files: &[InputFile],
            _params: &OperationParams,
            sink: Arc<dyn ProgressSink>,
        ) -> Result<Bytes, WorkflowError> {
            sink.progress(50);
            sink.progress(100);
            Ok(self.output.clone())
        }
    }

    fn pdf(len: usize) -> InputFile {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.resize(len, b'x');
        InputFile::new("doc.pdf", bytes)
    }

    #[tokio::test]
    async fn submit_completes_and_saves_artifact() {
        let workflow = Workflow::new(
            OperationKind::Compress,
            Arc::new(FixedService {
                output: Bytes::from_static(b"%PDF shrunk"),
            }),
        );
        workflow.select_files(vec![pdf(1000)]);

        let outcome = workflow.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Completed);
        assert_eq!(workflow.status(), RunStatus::Completed);
        assert_eq!(workflow.progress(), 100);

        let dir = tempfile::tempdir().unwrap();
        let path = workflow.save_artifact(dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "compressed.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF shrunk");
        // No temp file left behind.
        assert!(!dir.path().join("compressed.pdf.tmp").exists());
    }

    #[tokio::test]
    async fn save_artifact_without_run_is_illegal_state() {
        let workflow = Workflow::new(
            OperationKind::Compress,
            Arc::new(FixedService {
                output: Bytes::new(),
            }),
        );
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            workflow.save_artifact(dir.path()).await,
            Err(WorkflowError::NoArtifact)
        ));
    }

    #[tokio::test]
    async fn set_parameter_after_completion_reruns() {
        let workflow = Workflow::new(
            OperationKind::Compress,
            Arc::new(FixedService {
                output: Bytes::from_static(b"%PDF out"),
            }),
        );
        workflow.select_files(vec![pdf(1000)]);
        workflow.submit().await.unwrap();

        let outcome = workflow.set_parameter("quality", "low").await.unwrap();
        assert_eq!(outcome, Some(SubmitOutcome::Completed));
        assert_eq!(workflow.status(), RunStatus::Completed);
    }

    #[tokio::test]
    async fn set_parameter_before_any_run_does_not_submit() {
        let workflow = Workflow::new(
            OperationKind::Compress,
            Arc::new(FixedService {
                output: Bytes::new(),
            }),
        );
        let outcome = workflow.set_parameter("quality", "high").await.unwrap();
        assert_eq!(outcome, None);
        assert_eq!(workflow.status(), RunStatus::Idle);
    }
}
