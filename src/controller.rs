//! The workflow controller: one state machine per operation instance.
//!
//! Every operation shares the same lifecycle — select files, submit, watch
//! progress, keep or invalidate the result, re-run when a parameter changes —
//! so one machine governs all five instead of each front-end re-implementing
//! it.
//!
//! The controller is deliberately pure — no I/O, no async. Intents arrive as
//! method calls; the asynchronous outcome of a remote run is injected back as
//! explicit events ([`WorkflowController::apply_progress`],
//! [`WorkflowController::finish_run`]) tagged with the run's sequence number.
//! [`crate::workflow::Workflow`] supplies the async plumbing. Keeping the
//! machine synchronous means every transition in this file is testable without
//! a runtime or a network.
//!
//! ## Run sequencing
//!
//! Each accepted submission gets a fresh sequence number; `select_files` and
//! `reset` also advance it. Progress and terminal events carrying a stale
//! sequence are discarded, so a run superseded by a reset can land late
//! without corrupting the new session. There is no remote cancellation — a
//! superseded run simply completes into the void.

use crate::error::WorkflowError;
use crate::input::{self, InputFile};
use crate::metrics::{self, SizeComparison};
use crate::operation::{OperationKind, OperationParams};
use bytes::Bytes;
use tracing::{debug, info, warn};

/// Lifecycle of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// No run dispatched for the current FileSet.
    #[default]
    Idle,
    /// A run is in flight; further submissions are rejected.
    Submitting,
    /// The last run succeeded; an artifact is held.
    Completed,
    /// The last run failed; files and parameters survive for a retry.
    Failed,
}

/// The binary result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Result payload.
    pub bytes: Bytes,
    /// Size of `bytes`.
    pub output_bytes: u64,
    /// Input size recorded when the session's first run was accepted.
    pub input_bytes: u64,
    /// Savings/increase relative to `input_bytes`.
    pub comparison: SizeComparison,
}

/// Snapshot handed to the async driver when a submission is accepted.
///
/// Files are `Bytes`-backed, so the clone is cheap and the in-flight run is
/// immune to later `select_files` calls.
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub seq: u64,
    pub kind: OperationKind,
    pub files: Vec<InputFile>,
    pub params: OperationParams,
    /// Input size the run's metrics will be computed against.
    pub input_bytes: u64,
}

/// Outcome of [`WorkflowController::begin_submit`].
#[derive(Debug)]
pub enum SubmitDecision {
    /// The run was accepted; dispatch it with this ticket.
    Accepted(RunTicket),
    /// A run is already in flight. Single-flight guard: nothing was started,
    /// nothing was queued.
    InFlight,
}

/// Outcome of [`WorkflowController::set_parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamOutcome {
    /// Value stored; nothing else to do.
    Updated,
    /// Value stored and a completed result exists: the caller should re-run
    /// now (reactive re-run).
    RerunRequested,
    /// Value stored while a run was in flight: one follow-up run with the
    /// latest parameters is queued for when the current run settles.
    Deferred,
}

/// Outcome of [`WorkflowController::finish_run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    /// False when the event carried a stale sequence and was discarded.
    pub applied: bool,
    /// True when a parameter change was queued mid-flight; the caller should
    /// start exactly one follow-up run.
    pub rerun: bool,
}

/// State machine governing one operation workflow.
#[derive(Debug)]
pub struct WorkflowController {
    kind: OperationKind,
    files: Vec<InputFile>,
    params: OperationParams,
    status: RunStatus,
    progress: u8,
    artifact: Option<Artifact>,
    last_error: Option<String>,
    /// Captured at the first accepted submit of a session; reactive re-runs
    /// reuse it so savings stay comparable. Cleared by `select_files`/`reset`.
    session_input_bytes: Option<u64>,
    seq: u64,
    pending_rerun: bool,
}

impl WorkflowController {
    /// New controller for one operation, with the operation's default
    /// parameters and an empty FileSet.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            files: Vec::new(),
            params: kind.default_params(),
            status: RunStatus::Idle,
            progress: 0,
            artifact: None,
            last_error: None,
            session_input_bytes: None,
            seq: 0,
            pending_rerun: false,
        }
    }

    // ── Intents ───────────────────────────────────────────────────────────

    /// Replace the FileSet. Always returns to `Idle` and discards any
    /// artifact, progress, and recorded input size. No network call.
    pub fn select_files(&mut self, files: Vec<InputFile>) {
        debug!("{}: selected {} file(s)", self.kind, files.len());
        self.files = files;
        self.status = RunStatus::Idle;
        self.progress = 0;
        self.artifact = None;
        self.last_error = None;
        self.session_input_bytes = None;
        self.pending_rerun = false;
        // Invalidate any in-flight run's callbacks.
        self.seq += 1;
    }

    /// Update one parameter.
    ///
    /// Returns [`ParamOutcome::RerunRequested`] when a completed result exists
    /// for the current FileSet (the caller performs the reactive re-run), and
    /// [`ParamOutcome::Deferred`] while a run is in flight (queue-latest: the
    /// follow-up fires once, when the current run settles).
    pub fn set_parameter(&mut self, name: &str, value: &str) -> Result<ParamOutcome, WorkflowError> {
        self.params.set(name, value)?;
        debug!("{}: parameter {}={}", self.kind, name, value);
        if self.status == RunStatus::Submitting {
            self.pending_rerun = true;
            return Ok(ParamOutcome::Deferred);
        }
        // A retained artifact after a failed re-run still re-runs on the next
        // parameter change, same as a Completed state.
        if self.artifact.is_some() {
            return Ok(ParamOutcome::RerunRequested);
        }
        Ok(ParamOutcome::Updated)
    }

    /// Validate and accept a submission.
    ///
    /// Validation failures (file count, file type) are `ValidationError`s and
    /// leave the status untouched. A submission while one is in flight returns
    /// [`SubmitDecision::InFlight`]: a signalled no-op, not an error.
    pub fn begin_submit(&mut self) -> Result<SubmitDecision, WorkflowError> {
        if self.status == RunStatus::Submitting {
            debug!("{}: submit rejected, run in flight", self.kind);
            return Ok(SubmitDecision::InFlight);
        }

        self.validate_files()?;

        let input_bytes = *self
            .session_input_bytes
            .get_or_insert_with(|| input::total_size(&self.files));

        self.seq += 1;
        self.status = RunStatus::Submitting;
        self.progress = 0;
        self.last_error = None;

        info!(
            "{}: run #{} accepted ({} file(s), {} bytes)",
            self.kind,
            self.seq,
            self.files.len(),
            input_bytes
        );

        Ok(SubmitDecision::Accepted(RunTicket {
            seq: self.seq,
            kind: self.kind,
            files: self.files.clone(),
            params: self.params,
            input_bytes,
        }))
    }

    /// Inject a progress tick for run `seq`.
    ///
    /// Stale sequences and out-of-state ticks are ignored; applied values are
    /// clamped to 100 and forced non-decreasing.
    pub fn apply_progress(&mut self, seq: u64, percent: u8) {
        if seq != self.seq || self.status != RunStatus::Submitting {
            return;
        }
        self.progress = self.progress.max(percent.min(100));
    }

    /// Inject the terminal result for run `seq`.
    pub fn finish_run(&mut self, seq: u64, result: Result<Bytes, WorkflowError>) -> Settled {
        if seq != self.seq || self.status != RunStatus::Submitting {
            debug!("{}: discarding stale result for run #{}", self.kind, seq);
            return Settled {
                applied: false,
                rerun: false,
            };
        }

        match result {
            Ok(bytes) => {
                let input_bytes = self.session_input_bytes.unwrap_or(0);
                let output_bytes = bytes.len() as u64;
                self.artifact = Some(Artifact {
                    comparison: metrics::compare(input_bytes, output_bytes),
                    bytes,
                    output_bytes,
                    input_bytes,
                });
                self.status = RunStatus::Completed;
                self.progress = 100;
                self.last_error = None;
                info!("{}: run #{} completed ({} bytes)", self.kind, seq, output_bytes);
            }
            Err(err) => {
                // Files and parameters survive; an artifact from an earlier
                // successful run on this FileSet is retained as a stale
                // result the presentation layer may keep showing.
                self.status = RunStatus::Failed;
                self.last_error = Some(err.to_string());
                warn!("{}: run #{} failed: {}", self.kind, seq, err);
            }
        }

        let rerun = std::mem::take(&mut self.pending_rerun);
        Settled {
            applied: true,
            rerun,
        }
    }

    /// Clear files, artifact, progress, and error; keep parameters.
    pub fn reset(&mut self) {
        debug!("{}: reset", self.kind);
        self.files.clear();
        self.status = RunStatus::Idle;
        self.progress = 0;
        self.artifact = None;
        self.last_error = None;
        self.session_input_bytes = None;
        self.pending_rerun = false;
        self.seq += 1;
    }

    /// The artifact and its fixed download filename, or `IllegalStateError`
    /// when no run has completed.
    pub fn download_target(&self) -> Result<(&Artifact, &'static str), WorkflowError> {
        match self.artifact.as_ref() {
            Some(a) => Ok((a, self.kind.output_filename())),
            None => Err(WorkflowError::NoArtifact),
        }
    }

    // ── Presentation accessors ────────────────────────────────────────────

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    pub fn params(&self) -> &OperationParams {
        &self.params
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Internal ──────────────────────────────────────────────────────────

    fn validate_files(&self) -> Result<(), WorkflowError> {
        let required = self.kind.min_files();
        if self.files.len() < required {
            return Err(WorkflowError::NotEnoughFiles {
                operation: self.kind.name(),
                required,
                actual: self.files.len(),
            });
        }
        if let Some(allowed) = self.kind.max_files() {
            if self.files.len() > allowed {
                return Err(WorkflowError::TooManyFiles {
                    operation: self.kind.name(),
                    allowed,
                    actual: self.files.len(),
                });
            }
        }
        let expected = self.kind.expected_input();
        for file in &self.files {
            file.check_type(expected)?;
        }
        Ok(())
    }
}
