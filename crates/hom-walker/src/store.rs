use crate::jobs::{JobHandle, JobKind, SharedSampler};
use crate::settings::ViewerSettings;
use eframe::egui;
use homomorphism::{IterationTally, Phase, SharedSession, SyncStatus, UpdateMode};
use std::collections::VecDeque;

/// Progress of the running batch, as last reported by the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct RunProgress {
    pub completed: u32,
    pub total: u32,
    pub last_message: Option<String>,
}

/// Everything the UI reads. Only the reducer in `actions` writes to it.
pub struct Store {
    pub session: SharedSession,
    pub sampler: SharedSampler,
    pub settings: ViewerSettings,
    /// Used by workers to wake the UI; absent in tests
    pub repaint: Option<egui::Context>,

    pub mode: UpdateMode,
    pub biclique_size: i64,
    pub iterations: u32,
    pub show_labels: bool,

    pub target_layout_reset_needed: bool,
    pub biclique_layout_reset_needed: bool,
    pub fit_to_view_requested: bool,

    pub job: Option<JobHandle>,
    pub progress: Option<RunProgress>,
    /// Stage of the update request in flight, if any
    pub phase: Option<Phase>,
    pub last_tally: Option<IterationTally>,
    pub sync_status: Option<SyncStatus>,
    pub notices: VecDeque<String>,
}

impl Store {
    pub fn new(
        settings: ViewerSettings,
        session: SharedSession,
        sampler: SharedSampler,
        repaint: Option<egui::Context>,
    ) -> Self {
        Self {
            session,
            sampler,
            mode: UpdateMode::default(),
            biclique_size: settings.run.default_biclique_size,
            iterations: settings.run.default_iterations,
            show_labels: settings.target.show_labels,
            settings,
            repaint,
            target_layout_reset_needed: true,
            biclique_layout_reset_needed: true,
            fit_to_view_requested: false,
            job: None,
            progress: None,
            phase: None,
            last_tally: None,
            sync_status: None,
            notices: VecDeque::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    pub fn running(&self) -> Option<JobKind> {
        self.job.as_ref().map(|job| job.kind)
    }

    pub fn notify(&mut self, notice: impl Into<String>) {
        self.notices.push_back(notice.into());
    }

    pub fn notice(&self) -> Option<&str> {
        self.notices.front().map(String::as_str)
    }
}
