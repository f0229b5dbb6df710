use crate::vertex::{Edge, VertexId};
use std::collections::BTreeSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("edge {edge} references unknown vertex {missing}")]
    DanglingEdge { edge: Edge, missing: VertexId },
}

/// Undirected simple graph over namespaced vertex ids.
///
/// Every edge endpoint is a member of `vertices`; the mutators refuse
/// anything that would break that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    vertices: BTreeSet<VertexId>,
    edges: BTreeSet<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        vertices: impl IntoIterator<Item = VertexId>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Result<Self, GraphError> {
        let mut g = Self {
            vertices: vertices.into_iter().collect(),
            edges: BTreeSet::new(),
        };
        for edge in edges {
            g.insert_edge(edge)?;
        }
        Ok(g)
    }

    pub fn add_vertex(&mut self, v: VertexId) -> bool {
        self.vertices.insert(v)
    }

    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> Result<bool, GraphError> {
        self.insert_edge(Edge::new(a, b))
    }

    fn insert_edge(&mut self, edge: Edge) -> Result<bool, GraphError> {
        let (a, b) = edge.endpoints();
        let missing = [a, b]
            .into_iter()
            .find(|v| !self.vertices.contains(*v))
            .cloned();
        if let Some(missing) = missing {
            return Err(GraphError::DanglingEdge { edge, missing });
        }
        Ok(self.edges.insert(edge))
    }

    pub fn vertices(&self) -> &BTreeSet<VertexId> {
        &self.vertices
    }

    pub fn edges(&self) -> &BTreeSet<Edge> {
        &self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains_vertex(&self, v: &VertexId) -> bool {
        self.vertices.contains(v)
    }

    pub fn has_edge(&self, a: &VertexId, b: &VertexId) -> bool {
        self.edges.contains(&Edge::new(a.clone(), b.clone()))
    }

    pub fn neighbours<'a>(&'a self, v: &'a VertexId) -> impl Iterator<Item = &'a VertexId> + 'a {
        self.edges.iter().filter_map(move |e| {
            let (a, b) = e.endpoints();
            if a == v {
                Some(b)
            } else if b == v {
                Some(a)
            } else {
                None
            }
        })
    }
}
