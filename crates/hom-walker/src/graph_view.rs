use crate::layout_circular::{LayoutCircular, LayoutStateCircular};
use crate::layout_columns::{LayoutColumns, LayoutStateColumns};
use crate::node_shapes::{VertexNodeShape, highlight_color};
use eframe::egui::{self, Shape, Stroke};
use egui_graphs::{
    DefaultEdgeShape, DisplayEdge, DisplayNode, DrawContext, EdgeProps, Graph, GraphView, Node,
};
use homomorphism::highlight::{self, classify};
use homomorphism::{Edge, NodeRole, Session, VertexId};
use once_cell::sync::Lazy;
use petgraph::graph::DefaultIx;
use petgraph::stable_graph::{EdgeIndex, IndexType, NodeIndex, StableGraph};
use petgraph::{EdgeType, Undirected};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Copy)]
struct EdgeStyle {
    width: f32,
    highlight_width: f32,
}

static EDGE_STYLE: Lazy<RwLock<EdgeStyle>> = Lazy::new(|| {
    RwLock::new(EdgeStyle {
        width: 1.5,
        highlight_width: 4.0,
    })
});

fn edge_style() -> EdgeStyle {
    *EDGE_STYLE.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_edge_widths(width: f32, highlight_width: f32) {
    *EDGE_STYLE.write().unwrap_or_else(PoisonError::into_inner) = EdgeStyle {
        width: width.max(0.1),
        highlight_width: highlight_width.max(width),
    };
}

// ------------------------------------------------------------------
// Payloads
// ------------------------------------------------------------------

/// Node payload: the namespaced id and how it is currently drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexNode {
    pub id: VertexId,
    pub role: NodeRole,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMark {
    pub edge: Edge,
    pub highlighted: bool,
}

// ------------------------------------------------------------------
// Type aliases for graph types
// ------------------------------------------------------------------

pub type VertexGraphDisplay =
    Graph<VertexNode, EdgeMark, Undirected, DefaultIx, VertexNodeShape, HighlightEdgeShape>;

pub type TargetGraphView<'a> = GraphView<
    'a,
    VertexNode,
    EdgeMark,
    Undirected,
    DefaultIx,
    VertexNodeShape,
    HighlightEdgeShape,
    LayoutStateCircular,
    LayoutCircular,
>;

pub type BicliqueGraphView<'a> = GraphView<
    'a,
    VertexNode,
    EdgeMark,
    Undirected,
    DefaultIx,
    VertexNodeShape,
    HighlightEdgeShape,
    LayoutStateColumns,
    LayoutColumns,
>;

/// Build the display graph for G or S. `n` is the biclique size used to
/// split S into its columns; it is ignored for G.
pub fn setup_graph_display(graph: &homomorphism::Graph, n: usize) -> VertexGraphDisplay {
    let mut g: StableGraph<VertexNode, EdgeMark, Undirected> = StableGraph::default();
    let mut index: HashMap<&VertexId, NodeIndex> = HashMap::with_capacity(graph.vertex_count());
    for id in graph.vertices() {
        let idx = g.add_node(VertexNode {
            id: id.clone(),
            role: NodeRole::Plain(classify(id, n)),
        });
        index.insert(id, idx);
    }
    for edge in graph.edges() {
        let (a, b) = edge.endpoints();
        if let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) {
            g.add_edge(
                ia,
                ib,
                EdgeMark {
                    edge: edge.clone(),
                    highlighted: false,
                },
            );
        }
    }

    let mut display = VertexGraphDisplay::from(&g);
    let node_indices: Vec<_> = display.nodes_iter().map(|(idx, _)| idx).collect();
    for idx in node_indices {
        if let Some(node) = display.node_mut(idx) {
            let label = node.payload().id.to_string();
            node.set_label(label);
        }
    }
    let edge_indices: Vec<_> = display.edges_iter().map(|(idx, _)| idx).collect();
    for idx in edge_indices {
        if let Some(edge) = display.edge_mut(idx) {
            edge.set_label(String::new());
        }
    }
    display
}

/// Recompute roles and edge highlights from the session's current
/// selection. Cheap enough to run every frame.
pub fn paint_highlights(display: &mut VertexGraphDisplay, session: &Session) {
    let node_updates: Vec<(NodeIndex, NodeRole)> = display
        .nodes_iter()
        .filter_map(|(idx, node)| {
            let role = session.node_role(&node.payload().id);
            (role != node.payload().role).then_some((idx, role))
        })
        .collect();
    for (idx, role) in node_updates {
        if let Some(node) = display.node_mut(idx) {
            node.payload_mut().role = role;
            node.display_mut().set_role(role);
        }
    }

    let selection = session.selection();
    let mapping = session.chain().current();
    let edge_updates: Vec<(EdgeIndex, bool)> = display
        .edges_iter()
        .filter_map(|(idx, edge)| {
            let mark = edge.payload();
            let lit = highlight::edge_is_highlighted(&mark.edge, selection, mapping);
            (lit != mark.highlighted).then_some((idx, lit))
        })
        .collect();
    for (idx, lit) in edge_updates {
        if let Some(edge) = display.edge_mut(idx) {
            edge.payload_mut().highlighted = lit;
            edge.display_mut().highlighted = lit;
        }
    }
}

// ------------------------------------------------------------------
// Edge shape
// ------------------------------------------------------------------

/// Default straight edge, redrawn thick and green while it explains the
/// current step.
#[derive(Clone, Debug)]
pub struct HighlightEdgeShape {
    default_impl: DefaultEdgeShape,
    highlighted: bool,
}

impl From<EdgeProps<EdgeMark>> for HighlightEdgeShape {
    fn from(props: EdgeProps<EdgeMark>) -> Self {
        let highlighted = props.payload.highlighted;
        let mut default_impl = DefaultEdgeShape::from(props);
        default_impl.width = edge_style().width;
        Self {
            default_impl,
            highlighted,
        }
    }
}

impl<N: Clone, Ty: EdgeType, Ix: IndexType, D: DisplayNode<N, EdgeMark, Ty, Ix>>
    DisplayEdge<N, EdgeMark, Ty, Ix, D> for HighlightEdgeShape
{
    fn is_inside(
        &self,
        start: &Node<N, EdgeMark, Ty, Ix, D>,
        end: &Node<N, EdgeMark, Ty, Ix, D>,
        pos: egui::Pos2,
    ) -> bool {
        self.default_impl.is_inside(start, end, pos)
    }

    fn shapes(
        &mut self,
        start: &Node<N, EdgeMark, Ty, Ix, D>,
        end: &Node<N, EdgeMark, Ty, Ix, D>,
        ctx: &DrawContext,
    ) -> Vec<Shape> {
        let style = edge_style();
        self.default_impl.width = style.width;
        if !self.highlighted || start.id() == end.id() {
            return self.default_impl.shapes(start, end, ctx);
        }

        let dir = (end.location() - start.location()).normalized();
        let from = start.display().closest_boundary_point(dir);
        let to = end.display().closest_boundary_point(-dir);
        let width = ctx.meta.canvas_to_screen_size(style.highlight_width);
        vec![Shape::line_segment(
            [
                ctx.meta.canvas_to_screen_pos(from),
                ctx.meta.canvas_to_screen_pos(to),
            ],
            Stroke::new(width, highlight_color()),
        )]
    }

    fn update(&mut self, state: &EdgeProps<EdgeMark>) {
        self.highlighted = state.payload.highlighted;
        DisplayEdge::<N, EdgeMark, Ty, Ix, D>::update(&mut self.default_impl, state);
    }

    fn extra_bounds(
        &self,
        start: &Node<N, EdgeMark, Ty, Ix, D>,
        end: &Node<N, EdgeMark, Ty, Ix, D>,
    ) -> Option<(egui::Pos2, egui::Pos2)> {
        self.default_impl.extra_bounds(start, end)
    }
}
