//! Presentation policy: which vertices and edges the renderer emphasises.
//!
//! Everything here is a pure function of the graphs and the latest
//! [`Selection`], so it can be evaluated on every frame.

use crate::chain::Homomorphism;
use crate::vertex::{Edge, VertexId};
use std::collections::BTreeSet;

/// Vertices and edges involved in the most recent update attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected_s: Option<VertexId>,
    pub selected_g: Option<VertexId>,
    pub homomorphic_edges: BTreeSet<Edge>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.selected_s.is_none()
            && self.selected_g.is_none()
            && self.homomorphic_edges.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    BicliqueLeft,
    BicliqueRight,
    TargetGraph,
}

/// What the renderer should paint a vertex as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Picked by the last update attempt
    Active(Category),
    Plain(Category),
}

impl NodeRole {
    pub fn category(self) -> Category {
        match self {
            Self::Active(c) | Self::Plain(c) => c,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// Biclique ids below `n` are the left partition, the rest the right one.
pub fn classify(id: &VertexId, n: usize) -> Category {
    match id {
        VertexId::Target(_) => Category::TargetGraph,
        VertexId::Biclique(index) if *index < n => Category::BicliqueLeft,
        VertexId::Biclique(_) => Category::BicliqueRight,
    }
}

pub fn is_active(id: &VertexId, selection: &Selection) -> bool {
    selection.selected_s.as_ref() == Some(id) || selection.selected_g.as_ref() == Some(id)
}

pub fn is_homomorphic_edge(edge: &Edge, selection: &Selection) -> bool {
    selection.homomorphic_edges.contains(edge)
}

/// The edge of G that `edge` of S is sent to under `mapping`.
pub fn image_edge(edge: &Edge, mapping: &Homomorphism) -> Option<Edge> {
    let (a, b) = edge.endpoints();
    Some(Edge::new(mapping.image(a)?.clone(), mapping.image(b)?.clone()))
}

/// Whether the renderer draws `edge` as part of the current step.
///
/// Edges of G are highlighted when the sampler listed them. An edge of S is
/// highlighted when it touches the selected S vertex and its image is one of
/// those edges.
pub fn edge_is_highlighted(
    edge: &Edge,
    selection: &Selection,
    mapping: Option<&Homomorphism>,
) -> bool {
    let (a, _) = edge.endpoints();
    if a.is_target() {
        return is_homomorphic_edge(edge, selection);
    }
    let Some(selected) = selection.selected_s.as_ref() else {
        return false;
    };
    edge.touches(selected)
        && mapping
            .and_then(|m| image_edge(edge, m))
            .is_some_and(|image| is_homomorphic_edge(&image, selection))
}

pub fn node_role(id: &VertexId, n: usize, selection: &Selection) -> NodeRole {
    let category = classify(id, n);
    if is_active(id, selection) {
        NodeRole::Active(category)
    } else {
        NodeRole::Plain(category)
    }
}
