use crate::actions::Action;
use crate::cache::{biclique_caption, mapping_rows};
use crate::graph_view::{
    BicliqueGraphView, TargetGraphView, VertexGraphDisplay,
    paint_highlights,
};
use crate::jobs::JobKind;
use crate::layout_circular::{self, LayoutStateCircular, SpacingConfig};
use crate::layout_columns::LayoutStateColumns;
use crate::node_shapes::{self, role_color};
use crate::settings::{BICLIQUE_SIZE_RANGE, ITERATION_RANGE};
use crate::state::State;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use egui_graphs::{
    SettingsInteraction, SettingsNavigation, SettingsStyle,
    reset_layout,
};
use homomorphism::{
    Category, NodeRole, Session, SyncStatus, UpdateMode, read_shared,
};
use std::sync::Arc;

const TARGET_VIEW_ID: &str = "target_graph";
const BICLIQUE_VIEW_ID: &str = "biclique_graph";
const ROW_HEIGHT: f32 = 18.0;

pub struct HomWalkerApp {
    state: State,
    /// Cache versions the current layouts were computed for
    target_seen: u64,
    biclique_seen: u64,
}

impl HomWalkerApp {
    pub fn new(state: State) -> Self {
        Self {
            state,
            target_seen: 0,
            biclique_seen: 0,
        }
    }
}

impl eframe::App for HomWalkerApp {
    fn update(
        &mut self,
        ctx: &egui::Context,
        _frame: &mut eframe::Frame,
    ) {
        self.state.poll_jobs();
        self.state.flush_actions();
        self.state.flush_effects();

        let mut actions = Vec::new();
        let panel_width = (ctx.available_rect().width() / 4.0).max(220.0);

        egui::SidePanel::left("controls")
            .exact_width(panel_width)
            .frame(
                egui::Frame::side_top_panel(&ctx.style())
                    .inner_margin(8.0),
            )
            .show(ctx, |ui| self.controls_panel(ui, &mut actions));

        egui::SidePanel::right("chain")
            .exact_width(panel_width)
            .frame(
                egui::Frame::side_top_panel(&ctx.style())
                    .inner_margin(8.0),
            )
            .show(ctx, |ui| self.chain_panel(ui));

        egui::CentralPanel::default()
            .frame(
                egui::Frame::central_panel(&ctx.style())
                    .inner_margin(8.0),
            )
            .show(ctx, |ui| self.graph_panels(ui, &mut actions));

        if let Some(notice) = self.state.store.notice() {
            let notice = notice.to_string();
            egui::Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(&notice);
                    if ui.button("OK").clicked() {
                        actions.push(Action::DismissNotice);
                    }
                });
        }

        let had_actions = !actions.is_empty();
        for action in actions {
            self.state.dispatch(action);
        }
        if had_actions {
            ctx.request_repaint();
        }
    }
}

impl HomWalkerApp {
    fn controls_panel(
        &self,
        ui: &mut egui::Ui,
        actions: &mut Vec<Action>,
    ) {
        let store = &self.state.store;
        let busy = store.is_busy();

        ui.heading("Sampler");
        ui.separator();

        let mut mode = store.mode;
        ui.horizontal(|ui| {
            for candidate in UpdateMode::ALL {
                ui.selectable_value(
                    &mut mode,
                    candidate,
                    candidate.label(),
                );
            }
        });
        if mode != store.mode {
            actions.push(Action::SetMode { mode });
        }
        ui.label(format!("Endpoint: {}", store.mode.endpoint()));
        ui.add_space(8.0);

        ui.strong("Target graph");
        {
            let session = read_shared(&store.session);
            let meta = session.graphs().metadata();
            if session.graphs().target().is_empty() {
                ui.label("Not loaded");
            } else {
                ui.label(format!("Type: {}", meta.graph_type));
                ui.label(format!(
                    "Nodes: {}  Edges: {}",
                    meta.num_nodes, meta.num_edges
                ));
            }
        }
        if ui
            .add_enabled(!busy, egui::Button::new("Reload target graph"))
            .clicked()
        {
            actions.push(Action::LoadTargetGraph);
        }
        ui.add_space(8.0);

        ui.strong("Biclique");
        let mut n = store.biclique_size;
        ui.horizontal(|ui| {
            ui.label("n =");
            ui.add(
                egui::DragValue::new(&mut n)
                    .range(
                        BICLIQUE_SIZE_RANGE.min as i64
                            ..=BICLIQUE_SIZE_RANGE.max as i64,
                    )
                    .speed(BICLIQUE_SIZE_RANGE.step),
            );
            if ui
                .add_enabled(!busy, egui::Button::new("Generate"))
                .clicked()
            {
                actions.push(Action::GenerateBiclique);
            }
        });
        if n != store.biclique_size {
            actions.push(Action::SetBicliqueSize { n });
        }
        ui.add_space(8.0);

        ui.strong("Update");
        if ui
            .add_enabled(!busy, egui::Button::new("Step once"))
            .clicked()
        {
            actions.push(Action::StepOnce);
        }
        let mut count = store.iterations;
        ui.horizontal(|ui| {
            ui.add(
                egui::DragValue::new(&mut count)
                    .range(
                        ITERATION_RANGE.min as u32
                            ..=ITERATION_RANGE.max as u32,
                    )
                    .suffix(" steps"),
            );
            if ui
                .add_enabled(!busy, egui::Button::new("Run"))
                .clicked()
            {
                actions.push(Action::RunIterations);
            }
            let running =
                matches!(store.running(), Some(JobKind::Run { .. }));
            if ui
                .add_enabled(running, egui::Button::new("Stop"))
                .clicked()
            {
                actions.push(Action::CancelRun);
            }
        });
        if count != store.iterations {
            actions.push(Action::SetIterations { count });
        }

        if let Some(progress) = &store.progress {
            let fraction = if progress.total == 0 {
                0.0
            } else {
                progress.completed as f32 / progress.total as f32
            };
            ui.add(egui::ProgressBar::new(fraction).text(format!(
                "{} / {}",
                progress.completed, progress.total
            )));
            if let Some(message) = &progress.last_message {
                ui.small(message);
            }
        }
        if let Some(tally) = &store.last_tally {
            ui.label(tally.to_string());
        }
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy, egui::Button::new("Check sync"))
                .clicked()
            {
                actions.push(Action::CheckSync);
            }
            ui.label(sync_text(store.sync_status.as_ref()));
        });
        ui.separator();

        let mut show = store.show_labels;
        if ui.checkbox(&mut show, "Show labels").changed() {
            actions.push(Action::SetShowLabels { show });
        }
        if ui.button("Reset layout").clicked() {
            actions.push(Action::ResetLayouts);
        }

        ui.with_layout(
            egui::Layout::bottom_up(egui::Align::LEFT),
            |ui| {
                if let Some(kind) = store.running() {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        match store.phase {
                            Some(phase) => ui.label(format!("{}: {}", kind.label(), phase.label())),
                            None => ui.label(kind.label()),
                        };
                    });
                } else {
                    ui.label("Idle");
                }
                ui.separator();
            },
        );
    }

    fn chain_panel(&self, ui: &mut egui::Ui) {
        let session = read_shared(&self.state.store.session);
        let active_s = session
            .selection()
            .selected_s
            .as_ref()
            .map(ToString::to_string);

        ui.heading("Current mapping");
        ui.separator();
        let rows = mapping_rows(&session);
        if rows.is_empty() {
            ui.label("No homomorphism yet");
        }
        egui::ScrollArea::vertical()
            .id_salt("mapping")
            .max_height(ui.available_height() / 2.0)
            .show(ui, |ui| {
                egui::Grid::new("mapping_grid").striped(true).show(
                    ui,
                    |ui| {
                        for (from, to) in &rows {
                            let active = active_s.as_ref() == Some(from);
                            let role = if active {
                                NodeRole::Active(category_of(&session, from))
                            } else {
                                NodeRole::Plain(category_of(&session, from))
                            };
                            ui.label(
                                egui::RichText::new(from)
                                    .color(role_color(role))
                                    .strong(),
                            );
                            ui.label(format!("→ {to}"));
                            ui.end_row();
                        }
                    },
                );
            });

        ui.add_space(8.0);
        ui.heading("Markov chain");
        ui.separator();
        history_table(ui, &session);
    }

    fn graph_panels(
        &mut self,
        ui: &mut egui::Ui,
        actions: &mut Vec<Action>,
    ) {
        let shared = Arc::clone(&self.state.store.session);
        let session = read_shared(&shared);
        let store = &self.state.store;
        let cache = &mut self.state.cache;

        node_shapes::set_label_visibility(store.show_labels);
        let interaction = SettingsInteraction::new()
            .with_dragging_enabled(true)
            .with_node_clicking_enabled(false);
        let style = SettingsStyle::new().with_labels_always(store.show_labels);
        let fit = store.fit_to_view_requested;
        let navigation = SettingsNavigation::new()
            .with_fit_to_screen_enabled(fit)
            .with_zoom_and_pan_enabled(true);

        cache.biclique_graph.get(&session);
        cache.target_graph.get(&session);
        let biclique_version = cache.biclique_graph.version();
        let target_version = cache.target_graph.version();

        let biclique_reset = store.biclique_layout_reset_needed
            || biclique_version != self.biclique_seen;
        let target_reset = store.target_layout_reset_needed
            || target_version != self.target_seen;

        ui.columns(2, |cols| {
            let ui = &mut cols[0];
            ui.heading("Biclique S");
            ui.label(biclique_caption(session.graphs().biclique()));
            ui.separator();
            if biclique_reset {
                reset_layout::<LayoutStateColumns>(
                    ui,
                    Some(BICLIQUE_VIEW_ID.to_string()),
                );
            }
            let display = cache.biclique_graph.get_mut(&session);
            paint_highlights(display, &session);
            draw_biclique(ui, display, &interaction, &style, &navigation);

            let ui = &mut cols[1];
            ui.heading("Target graph G");
            ui.label(format!(
                "{} vertices, {} edges",
                session.graphs().target().vertex_count(),
                session.graphs().target().edge_count()
            ));
            ui.separator();
            if target_reset {
                layout_circular::set_pending_layout(SpacingConfig::from(
                    &store.settings.layout,
                ));
                reset_layout::<LayoutStateCircular>(
                    ui,
                    Some(TARGET_VIEW_ID.to_string()),
                );
            }
            let display = cache.target_graph.get_mut(&session);
            paint_highlights(display, &session);
            draw_target(ui, display, &interaction, &style, &navigation);
        });

        if biclique_reset {
            self.biclique_seen = biclique_version;
            if store.biclique_layout_reset_needed {
                actions.push(Action::ClearBicliqueLayoutResetFlag);
            }
        }
        if target_reset {
            self.target_seen = target_version;
            if store.target_layout_reset_needed {
                actions.push(Action::ClearTargetLayoutResetFlag);
            }
        }
        if fit {
            actions.push(Action::FitToViewApplied);
        }
    }
}

fn draw_biclique(
    ui: &mut egui::Ui,
    display: &mut VertexGraphDisplay,
    interaction: &SettingsInteraction,
    style: &SettingsStyle,
    navigation: &SettingsNavigation,
) {
    ui.add(
        &mut BicliqueGraphView::new(display)
            .with_id(Some(BICLIQUE_VIEW_ID.to_string()))
            .with_interactions(interaction)
            .with_styles(style)
            .with_navigations(navigation),
    );
}

fn draw_target(
    ui: &mut egui::Ui,
    display: &mut VertexGraphDisplay,
    interaction: &SettingsInteraction,
    style: &SettingsStyle,
    navigation: &SettingsNavigation,
) {
    ui.add(
        &mut TargetGraphView::new(display)
            .with_id(Some(TARGET_VIEW_ID.to_string()))
            .with_interactions(interaction)
            .with_styles(style)
            .with_navigations(navigation),
    );
}

fn history_table(ui: &mut egui::Ui, session: &Session) {
    let history = session.chain().history();
    if history.is_empty() {
        ui.label("Empty");
        return;
    }
    TableBuilder::new(ui)
        .id_salt("history")
        .striped(true)
        .stick_to_bottom(true)
        .column(Column::auto().at_least(32.0))
        .column(Column::remainder().clip(true))
        .header(ROW_HEIGHT, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            header.col(|ui| {
                ui.strong("Mapping");
            });
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, history.len(), |mut row| {
                let index = row.index();
                row.col(|ui| {
                    ui.label(index.to_string());
                });
                row.col(|ui| {
                    ui.label(history[index].to_string());
                });
            });
        });
}

fn category_of(session: &Session, label: &str) -> Category {
    label
        .parse()
        .map(|id| session.node_role(&id).category())
        .unwrap_or(Category::TargetGraph)
}

fn sync_text(status: Option<&SyncStatus>) -> &'static str {
    match status {
        None => "Not checked",
        Some(SyncStatus::NotStarted) => "Sampler has no chain yet",
        Some(SyncStatus::InSync) => "In sync",
        Some(SyncStatus::Diverged { .. }) => "Out of sync",
    }
}
