pub mod actions;
pub mod app;
pub mod cache;
pub mod effects;
pub mod graph_view;
pub mod jobs;
pub mod layout_circular;
pub mod layout_columns;
pub mod logging;
pub mod memoized;
pub mod native;
pub mod node_shapes;
pub mod settings;
pub mod state;
pub mod store;

use actions::Action;
use app::HomWalkerApp;
use homomorphism::{HttpSampler, Session};
use jobs::SharedSampler;
use node_shapes::VisualParams;
use settings::ViewerSettings;
use state::State;
use std::sync::Arc;
use store::Store;

/// Build the viewer and queue the initial `/get_graph` request.
pub fn create_app(
    cc: &eframe::CreationContext<'_>,
    settings: ViewerSettings,
    startup_notices: Vec<String>,
) -> HomWalkerApp {
    node_shapes::set_target_visuals(VisualParams::from(&settings.target));
    node_shapes::set_biclique_visuals(VisualParams::from(&settings.biclique));
    graph_view::set_edge_widths(
        settings.edges.width,
        settings.edges.highlight_width,
    );

    let sampler: SharedSampler = Arc::new(HttpSampler::new(
        &settings.sampler.base_url,
        settings.sampler.timeout(),
    ));
    let mut store = Store::new(
        settings,
        Session::new().into_shared(),
        sampler,
        Some(cc.egui_ctx.clone()),
    );
    for notice in startup_notices {
        store.notify(notice);
    }

    let mut state = State::new(store);
    state.dispatch(Action::LoadTargetGraph);
    HomWalkerApp::new(state)
}
