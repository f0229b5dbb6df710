//! Serialized driving of the remote sampler's update endpoints.
//!
//! The sampler keeps a single mutable chain per session, so one
//! [`UpdateOrchestrator`] issues every update request and waits for each
//! answer to be applied before sending the next.

use crate::chain::DomainMismatchError;
use crate::remote::{SamplerClient, SamplerError, UpdateMode};
use crate::session::SessionAccess;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause between steps of a batch so each intermediate state gets drawn.
pub const DEFAULT_STEP_PAUSE: Duration = Duration::from_millis(100);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("the target graph is not loaded")]
    TargetGraphMissing,
    #[error("generate a biclique first")]
    NoBiclique,
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    #[error("update refused: {0}")]
    DomainMismatch(#[from] DomainMismatchError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("iteration count must be positive")]
    InvalidIterationCount,
    #[error("the target graph is not loaded")]
    TargetGraphMissing,
    #[error("generate a biclique first")]
    NoBiclique,
}


/// What happened to one update attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The sampler moved the chain; history now has `history_len` entries
    Accepted { history_len: usize },
    /// The sampler found no valid move
    Rejected { message: String },
    /// The step never reached the chain
    Failed(StepError),
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Text to show the user, if any.
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { message } => Some(message.clone()),
            Self::Failed(err) => Some(err.to_string()),
        }
    }
}

/// Where a single update attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Requesting,
    Applying,
    Reporting,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "waiting for sampler",
            Self::Applying => "applying reply",
            Self::Reporting => "reporting",
        }
    }
}

/// Shared stop flag for a running batch, checked before every iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capabilities the renderer exposes to the orchestrator.
pub trait RenderSink {
    fn request_redraw(&self);

    fn fit_to_view(&self) {}

    fn phase_changed(&self, _phase: Phase) {}

    fn step_finished(&self, _step: u32, _outcome: &UpdateOutcome) {}
}

/// Sink for headless callers.
pub struct NullSink;

impl RenderSink for NullSink {
    fn request_redraw(&self) {}
}

/// Success and failure counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationTally {
    pub requested: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub cancelled: bool,
}

impl IterationTally {
    pub fn new(requested: u32) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &UpdateOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn completed(&self) -> u32 {
        self.succeeded + self.failed
    }
}

impl fmt::Display for IterationTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Out of {} iterations: {} succeeded, {} failed",
            self.completed(),
            self.succeeded,
            self.failed
        )?;
        if self.cancelled {
            write!(f, " (stopped, {} requested)", self.requested)?;
        }
        Ok(())
    }
}

/// Update driver for one [`UpdateMode`].
pub struct UpdateOrchestrator<C> {
    client: C,
    mode: UpdateMode,
    pause: Duration,
}

impl<C: SamplerClient> UpdateOrchestrator<C> {
    pub fn new(client: C, mode: UpdateMode) -> Self {
        Self {
            client,
            mode,
            pause: DEFAULT_STEP_PAUSE,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    fn enter(&self, sink: &dyn RenderSink, phase: Phase) {
        debug!(mode = ?self.mode, ?phase, "orchestrator.phase");
        sink.phase_changed(phase);
    }

    /// Issue exactly one update request and fold the answer into `session`.
    pub fn step_once(&self, session: &mut impl SessionAccess) -> UpdateOutcome {
        self.step_once_with(session, &NullSink)
    }

    /// Like [`Self::step_once`], reporting each [`Phase`] to `sink`.
    ///
    /// The session is not borrowed while the request is in flight. Nothing
    /// is sent unless both G and S are present.
    pub fn step_once_with(
        &self,
        session: &mut impl SessionAccess,
        sink: &dyn RenderSink,
    ) -> UpdateOutcome {
        if let Some(blocker) = session.with_session(|s| s.update_blocker()) {
            return UpdateOutcome::Failed(blocker);
        }

        self.enter(sink, Phase::Requesting);
        let outcome = match self.client.update(self.mode) {
            Ok(reply) => {
                self.enter(sink, Phase::Applying);
                session.with_session(|s| s.apply_update(reply))
            }
            Err(err) => UpdateOutcome::Failed(StepError::Sampler(err)),
        };

        self.enter(sink, Phase::Reporting);
        match &outcome {
            UpdateOutcome::Accepted { history_len } => {
                debug!(mode = ?self.mode, history_len, "orchestrator.step.accepted");
            }
            UpdateOutcome::Rejected { message } => {
                info!(mode = ?self.mode, %message, "orchestrator.step.rejected");
            }
            UpdateOutcome::Failed(err) => {
                warn!(mode = ?self.mode, error = %err, "orchestrator.step.failed");
            }
        }
        self.enter(sink, Phase::Idle);
        outcome
    }

    /// Run `count` steps back to back.
    ///
    /// Individual step failures are tallied, never returned. The run stops
    /// early only when `cancel` is raised.
    pub fn step_many(
        &self,
        session: &mut impl SessionAccess,
        count: u32,
        cancel: &CancelToken,
        sink: &dyn RenderSink,
    ) -> Result<IterationTally, OrchestratorError> {
        if count == 0 {
            return Err(OrchestratorError::InvalidIterationCount);
        }
        match session.with_session(|s| s.update_blocker()) {
            Some(StepError::TargetGraphMissing) => {
                return Err(OrchestratorError::TargetGraphMissing);
            }
            Some(_) => return Err(OrchestratorError::NoBiclique),
            None => {}
        }

        info!(mode = ?self.mode, count, "orchestrator.run.start");
        let mut tally = IterationTally::new(count);
        for step in 0..count {
            if step > 0 && !self.pause.is_zero() {
                thread::sleep(self.pause);
            }
            if cancel.is_cancelled() {
                tally.cancelled = true;
                info!(mode = ?self.mode, step, "orchestrator.run.cancelled");
                break;
            }
            let outcome = self.step_once_with(session, sink);
            tally.record(&outcome);
            sink.step_finished(step, &outcome);
            sink.request_redraw();
        }

        info!(
            mode = ?self.mode,
            succeeded = tally.succeeded,
            failed = tally.failed,
            cancelled = tally.cancelled,
            "orchestrator.run.finished"
        );
        Ok(tally)
    }
}
