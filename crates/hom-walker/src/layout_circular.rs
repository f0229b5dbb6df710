use eframe::egui;
use egui_graphs::{DisplayEdge, DisplayNode, Graph, Layout, LayoutState};
use once_cell::sync::Lazy;
use petgraph::EdgeType;
use petgraph::graph::IndexType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock};

use crate::settings::LayoutSettings;

// Read by `LayoutStateCircular::default` on the next reset_layout
static PENDING_SPACING: Lazy<RwLock<Option<SpacingConfig>>> =
    Lazy::new(|| RwLock::new(None));

pub fn set_pending_layout(spacing: SpacingConfig) {
    *PENDING_SPACING
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(spacing);
}

/// Radius of the circle: a base plus a share per vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacingConfig {
    pub base_radius: f32,
    pub radius_per_node: f32,
}

impl SpacingConfig {
    pub fn radius(&self, node_count: usize) -> f32 {
        self.base_radius + node_count as f32 * self.radius_per_node
    }
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self::from(&LayoutSettings::default())
    }
}

impl From<&LayoutSettings> for SpacingConfig {
    fn from(settings: &LayoutSettings) -> Self {
        Self {
            base_radius: settings.circular_base_radius,
            radius_per_node: settings.circular_radius_per_node,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutStateCircular {
    pub spacing: SpacingConfig,
}

impl Default for LayoutStateCircular {
    fn default() -> Self {
        let spacing = PENDING_SPACING
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();
        Self { spacing }
    }
}

impl LayoutState for LayoutStateCircular {}

/// Order labels so that `G-2` comes before `G-10`. Labels without a
/// numeric tail sort after numeric ones, alphabetically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    fn key(label: &str) -> (Option<u64>, &str) {
        let tail = label.rsplit('-').next().unwrap_or(label);
        (tail.parse().ok(), label)
    }
    match (key(a), key(b)) {
        ((Some(x), _), (Some(y), _)) => x.cmp(&y).then_with(|| a.cmp(b)),
        ((Some(_), _), (None, _)) => Ordering::Less,
        ((None, _), (Some(_), _)) => Ordering::Greater,
        ((None, la), (None, lb)) => la.cmp(lb),
    }
}

/// Places every vertex of G on one circle, starting at the top and going
/// clockwise in label order. Applied once per reset.
#[derive(Debug, Clone, Default)]
pub struct LayoutCircular {
    state: LayoutStateCircular,
    applied: bool,
}

impl Layout<LayoutStateCircular> for LayoutCircular {
    fn from_state(
        state: LayoutStateCircular,
    ) -> impl Layout<LayoutStateCircular> {
        Self {
            state,
            applied: false,
        }
    }

    fn next<N, E, Ty, Ix, Dn, De>(
        &mut self,
        g: &mut Graph<N, E, Ty, Ix, Dn, De>,
        ui: &egui::Ui,
    ) where
        N: Clone,
        E: Clone,
        Ty: EdgeType,
        Ix: IndexType,
        Dn: DisplayNode<N, E, Ty, Ix>,
        De: DisplayEdge<N, E, Ty, Ix, Dn>,
    {
        if self.applied {
            return;
        }

        let mut order: Vec<_> = g
            .nodes_iter()
            .map(|(idx, node)| (idx, node.label().to_string()))
            .collect();
        if order.is_empty() {
            return;
        }
        order.sort_by(|a, b| natural_cmp(&a.1, &b.1));

        let center = ui.available_rect_before_wrap().center();
        let count = order.len();
        let radius = self.state.spacing.radius(count);
        for (i, (idx, _)) in order.iter().enumerate() {
            let angle = -std::f32::consts::FRAC_PI_2
                + i as f32 * std::f32::consts::TAU / count as f32;
            if let Some(node) = g.node_mut(*idx) {
                node.set_location(egui::Pos2::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                ));
            }
        }

        self.applied = true;
    }

    fn state(&self) -> LayoutStateCircular {
        self.state.clone()
    }
}
