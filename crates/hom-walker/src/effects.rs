use crate::jobs::{self, JobKind};
use crate::store::Store;
use std::sync::Arc;
use tracing::error;

/// Deferred effects that must run outside the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Hand a sampler request to the background worker
    StartJob(JobKind),
}

/// Execute a single effect against the store
pub fn run(store: &mut Store, effect: Effect) {
    match effect {
        Effect::StartJob(kind) => {
            if store.is_busy() {
                return;
            }
            let spawned = jobs::spawn(
                kind,
                Arc::clone(&store.session),
                Arc::clone(&store.sampler),
                store.settings.run.step_pause(),
                store.repaint.clone(),
            );
            match spawned {
                Ok(handle) => store.job = Some(handle),
                Err(e) => spawn_failed(store, kind, &e),
            }
        }
    }
}

fn spawn_failed(store: &mut Store, kind: JobKind, e: &std::io::Error) {
    error!(error = %e, job = kind.label(), "effects.spawn.failed");
    store.progress = None;
    store.phase = None;
    store.notify(format!("Could not start worker: {e}"));
}
