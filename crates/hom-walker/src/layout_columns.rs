use eframe::egui;
use egui_graphs::{DisplayEdge, DisplayNode, Graph, Layout, LayoutState};
use homomorphism::VertexId;
use homomorphism::biclique;
use petgraph::EdgeType;
use petgraph::graph::IndexType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutStateColumns {
    /// Partition size the current positions were computed for
    pub size: Option<usize>,
}

impl LayoutState for LayoutStateColumns {}

/// K(n,n) drawn as two columns: `S-0..S-(n-1)` on the left and the rest on
/// the right, both centred on the canvas.
///
/// Positions come from the node labels, so the layout works for any node
/// payload as long as labels are `S-<index>`.
#[derive(Debug, Clone, Default)]
pub struct LayoutColumns {
    state: LayoutStateColumns,
    applied: bool,
}

impl Layout<LayoutStateColumns> for LayoutColumns {
    fn from_state(
        state: LayoutStateColumns,
    ) -> impl Layout<LayoutStateColumns> {
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

        let placements: Vec<_> = g
            .nodes_iter()
            .filter_map(|(idx, node)| {
                match node.label().parse::<VertexId>() {
                    Ok(VertexId::Biclique(index)) => Some((idx, index)),
                    _ => None,
                }
            })
            .collect();
        if placements.is_empty() {
            return;
        }
        let n = placements.len().div_ceil(2);

        let center = ui.available_rect_before_wrap().center();
        for (idx, index) in placements {
            let Some(hint) = biclique::layout_hint(index, n) else {
                continue;
            };
            if let Some(node) = g.node_mut(idx) {
                node.set_location(egui::Pos2::new(
                    center.x + hint.x,
                    center.y + hint.y,
                ));
            }
        }

        self.state.size = Some(n);
        self.applied = true;
    }

    fn state(&self) -> LayoutStateColumns {
        self.state.clone()
    }
}
