//! Background worker for everything that talks to the sampler.
//!
//! One job runs at a time on its own thread. It reports back over a
//! channel that the UI drains once per frame, and it never holds the
//! session lock while a request is in flight.

use eframe::egui;
use homomorphism::{
    CancelToken, IterationTally, OrchestratorError, Phase, RenderSink, SamplerClient,
    SamplerError, SessionAccess, SessionError, SharedSession, SyncStatus,
    UpdateMode, UpdateOrchestrator, UpdateOutcome,
};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

pub type SharedSampler = Arc<dyn SamplerClient + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    LoadTarget,
    Generate { n: i64 },
    Step { mode: UpdateMode },
    Run { mode: UpdateMode, count: u32 },
    CheckSync,
}

impl JobKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LoadTarget => "Loading target graph",
            Self::Generate { .. } => "Generating biclique",
            Self::Step { .. } => "Updating",
            Self::Run { .. } => "Running iterations",
            Self::CheckSync => "Checking sync",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    Loaded(Result<(), SessionError>),
    Generated(Result<(), SessionError>),
    Stepped(UpdateOutcome),
    Ran(Result<IterationTally, OrchestratorError>),
    Synced(Result<SyncStatus, SamplerError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress {
        completed: u32,
        total: u32,
        message: Option<String>,
    },
    FitToView,
    Phase(Phase),
    Finished(JobResult),
    /// The worker went away without reporting a result
    Lost,
}

/// The running job as seen from the UI thread.
pub struct JobHandle {
    pub kind: JobKind,
    cancel: CancelToken,
    events: Receiver<JobEvent>,
}

impl JobHandle {
    pub(crate) fn new(
        kind: JobKind,
        cancel: CancelToken,
        events: Receiver<JobEvent>,
    ) -> Self {
        Self {
            kind,
            cancel,
            events,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Everything reported since the last poll, ending at `Finished` or
    /// `Lost` once the worker is done.
    pub fn poll(&self) -> Vec<JobEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    let done = matches!(event, JobEvent::Finished(_));
                    events.push(event);
                    if done {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    events.push(JobEvent::Lost);
                    break;
                }
            }
        }
        events
    }
}

/// Forwards orchestrator callbacks to the UI thread.
struct ChannelSink {
    ctx: Option<egui::Context>,
    events: Sender<JobEvent>,
    total: u32,
}

impl ChannelSink {
    fn send(&self, event: JobEvent) {
        // The receiver is gone only when the app is shutting down.
        let _ = self.events.send(event);
    }
}

impl RenderSink for ChannelSink {
    fn request_redraw(&self) {
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }

    fn fit_to_view(&self) {
        self.send(JobEvent::FitToView);
        self.request_redraw();
    }

    fn phase_changed(&self, phase: Phase) {
        self.send(JobEvent::Phase(phase));
    }

    fn step_finished(&self, step: u32, outcome: &UpdateOutcome) {
        self.send(JobEvent::Progress {
            completed: step + 1,
            total: self.total,
            message: outcome.notice(),
        });
    }
}

/// Start `kind` on a fresh worker thread.
pub fn spawn(
    kind: JobKind,
    session: SharedSession,
    sampler: SharedSampler,
    pause: Duration,
    ctx: Option<egui::Context>,
) -> std::io::Result<JobHandle> {
    let (tx, rx) = mpsc::channel();
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let total = match kind {
        JobKind::Run { count, .. } => count,
        _ => 1,
    };

    thread::Builder::new()
        .name("sampler-job".to_string())
        .spawn(move || {
            let sink = ChannelSink {
                ctx,
                events: tx,
                total,
            };
            let mut session = session;
            let result =
                run(kind, &mut session, sampler, pause, &worker_cancel, &sink);
            sink.send(JobEvent::Finished(result));
            sink.request_redraw();
        })?;

    info!(job = kind.label(), "jobs.spawned");
    Ok(JobHandle::new(kind, cancel, rx))
}

/// Body of a job. Runs on the worker thread; public for headless callers.
pub fn run(
    kind: JobKind,
    session: &mut impl SessionAccess,
    sampler: SharedSampler,
    pause: Duration,
    cancel: &CancelToken,
    sink: &dyn RenderSink,
) -> JobResult {
    debug!(?kind, "jobs.run.start");
    let result = match kind {
        JobKind::LoadTarget => {
            let fetched = sampler.fetch_target_graph();
            let loaded = session.with_session(|s| s.apply_target_fetch(fetched));
            if loaded.is_ok() {
                sink.fit_to_view();
            }
            JobResult::Loaded(loaded)
        }
        JobKind::Generate { n } => JobResult::Generated(generate(session, &sampler, n, sink)),
        JobKind::Step { mode } => {
            let orchestrator = UpdateOrchestrator::new(sampler, mode);
            JobResult::Stepped(orchestrator.step_once_with(session, sink))
        }
        JobKind::Run { mode, count } => {
            let orchestrator = UpdateOrchestrator::new(sampler, mode).with_pause(pause);
            JobResult::Ran(orchestrator.step_many(session, count, cancel, sink))
        }
        JobKind::CheckSync => JobResult::Synced(
            sampler
                .current_homomorphism()
                .map(|remote| session.with_session(|s| s.compare_with(remote))),
        ),
    };
    if let JobResult::Loaded(Err(err)) | JobResult::Generated(Err(err)) = &result {
        error!(?kind, error = %err, "jobs.run.failed");
    }
    result
}

fn generate(
    session: &mut impl SessionAccess,
    sampler: &SharedSampler,
    n: i64,
    sink: &dyn RenderSink,
) -> Result<(), SessionError> {
    let biclique = session.with_session(|s| s.prepare_biclique(n))?;
    let size = biclique.size();
    let mapping = sampler.generate_biclique(size, size)?;
    session.with_session(|s| s.install_biclique(biclique, mapping))?;
    sink.fit_to_view();
    Ok(())
}
