use crate::effects::Effect;
use crate::jobs::{JobEvent, JobKind, JobResult};
use crate::settings::{BICLIQUE_SIZE_RANGE, ITERATION_RANGE};
use crate::store::{RunProgress, Store};
use homomorphism::{OrchestratorError, Phase, SyncStatus, UpdateMode, biclique, read_shared};
use tracing::{info, warn};

/// Actions that can be dispatched to modify the viewer state
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Controls
    /// Choose which update endpoint drives the chain
    SetMode { mode: UpdateMode },
    /// Partition size for the next generated biclique
    SetBicliqueSize { n: i64 },
    /// Length of the next batch run
    SetIterations { count: u32 },
    /// Toggle node label visibility
    SetShowLabels { show: bool },
    /// Lay both graphs out again
    ResetLayouts,
    ClearTargetLayoutResetFlag,
    ClearBicliqueLayoutResetFlag,
    FitToViewApplied,

    // Sampler requests
    LoadTargetGraph,
    GenerateBiclique,
    StepOnce,
    RunIterations,
    CheckSync,
    /// Stop the running batch before its next step
    CancelRun,

    // Worker reports
    Job(JobEvent),

    /// Close the oldest notice
    DismissNotice,
}

impl From<JobEvent> for Action {
    fn from(event: JobEvent) -> Self {
        Self::Job(event)
    }
}

/// Apply a single action to modify the store state
pub fn update(store: &mut Store, action: Action) -> Vec<Effect> {
    match action {
        Action::SetMode { mode } => {
            store.mode = mode;
            vec![]
        }
        Action::SetBicliqueSize { n } => {
            store.biclique_size = BICLIQUE_SIZE_RANGE.clamp(n as f32) as i64;
            vec![]
        }
        Action::SetIterations { count } => {
            store.iterations = ITERATION_RANGE.clamp(count as f32) as u32;
            vec![]
        }
        Action::SetShowLabels { show } => {
            store.show_labels = show;
            vec![]
        }
        Action::ResetLayouts => {
            store.target_layout_reset_needed = true;
            store.biclique_layout_reset_needed = true;
            store.fit_to_view_requested = true;
            vec![]
        }
        Action::ClearTargetLayoutResetFlag => {
            store.target_layout_reset_needed = false;
            vec![]
        }
        Action::ClearBicliqueLayoutResetFlag => {
            store.biclique_layout_reset_needed = false;
            vec![]
        }
        Action::FitToViewApplied => {
            store.fit_to_view_requested = false;
            vec![]
        }

        Action::LoadTargetGraph => start(store, JobKind::LoadTarget),
        Action::GenerateBiclique => {
            if let Err(e) = biclique::validate_size(store.biclique_size) {
                store.notify(e.to_string());
                return vec![];
            }
            if read_shared(&store.session).graphs().target().is_empty() {
                store.notify("Load the target graph before generating a biclique.");
                return vec![];
            }
            let kind = JobKind::Generate {
                n: store.biclique_size,
            };
            start(store, kind)
        }
        Action::StepOnce => {
            let kind = JobKind::Step { mode: store.mode };
            start(store, kind)
        }
        Action::RunIterations => {
            if store.iterations == 0 {
                store.notify(OrchestratorError::InvalidIterationCount.to_string());
                return vec![];
            }
            store.progress = Some(RunProgress {
                completed: 0,
                total: store.iterations,
                last_message: None,
            });
            let kind = JobKind::Run {
                mode: store.mode,
                count: store.iterations,
            };
            let effects = start(store, kind);
            if effects.is_empty() {
                store.progress = None;
            }
            effects
        }
        Action::CheckSync => start(store, JobKind::CheckSync),
        Action::CancelRun => {
            if let Some(job) = &store.job
                && matches!(job.kind, JobKind::Run { .. })
            {
                info!("actions.run.cancel");
                job.cancel();
            }
            vec![]
        }

        Action::Job(JobEvent::Progress {
            completed,
            total,
            message,
        }) => {
            store.progress = Some(RunProgress {
                completed,
                total,
                last_message: message,
            });
            vec![]
        }
        Action::Job(JobEvent::FitToView) => {
            store.fit_to_view_requested = true;
            vec![]
        }
        Action::Job(JobEvent::Phase(phase)) => {
            store.phase = (phase != Phase::Idle).then_some(phase);
            vec![]
        }
        Action::Job(JobEvent::Finished(result)) => {
            store.job = None;
            store.progress = None;
            store.phase = None;
            finish(store, result);
            vec![]
        }
        Action::Job(JobEvent::Lost) => {
            store.job = None;
            store.progress = None;
            store.phase = None;
            warn!("actions.job.lost");
            store.notify("The background request stopped unexpectedly.");
            vec![]
        }

        Action::DismissNotice => {
            store.notices.pop_front();
            vec![]
        }
    }
}

fn start(store: &mut Store, kind: JobKind) -> Vec<Effect> {
    if let Some(running) = store.running() {
        warn!(
            requested = kind.label(),
            running = running.label(),
            "actions.job.busy"
        );
        store.notify(format!(
            "{} is still in progress; try again when it finishes.",
            running.label()
        ));
        return vec![];
    }
    vec![Effect::StartJob(kind)]
}

fn finish(store: &mut Store, result: JobResult) {
    match result {
        JobResult::Loaded(loaded) => {
            store.target_layout_reset_needed = true;
            if let Err(e) = loaded {
                store.notify(e.to_string());
            }
        }
        JobResult::Generated(Ok(())) => {
            store.biclique_layout_reset_needed = true;
            store.sync_status = None;
            store.last_tally = None;
        }
        JobResult::Generated(Err(e)) => store.notify(e.to_string()),
        JobResult::Stepped(outcome) => {
            if let Some(notice) = outcome.notice() {
                store.notify(notice);
            }
        }
        JobResult::Ran(Ok(tally)) => {
            store.notify(tally.to_string());
            store.last_tally = Some(tally);
        }
        JobResult::Ran(Err(e)) => store.notify(e.to_string()),
        JobResult::Synced(Ok(status)) => {
            if let SyncStatus::Diverged { .. } = status {
                store.notify(
                    "The sampler's current mapping differs from the last one shown here.",
                );
            }
            store.sync_status = Some(status);
        }
        JobResult::Synced(Err(e)) => store.notify(e.to_string()),
    }
}
