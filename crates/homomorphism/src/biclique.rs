use crate::graph::Graph;
use crate::vertex::VertexId;

/// Largest accepted partition size; K(n,n) has n² edges to draw.
pub const MAX_BICLIQUE_SIZE: usize = 256;

/// Horizontal distance of each column from the layout centre
pub const COLUMN_OFFSET: f32 = 150.0;
/// Vertical distance between consecutive vertices of a column
pub const ROW_SPACING: f32 = 100.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSizeError {
    #[error("biclique size must be positive, got {0}")]
    NonPositive(i64),
    #[error("biclique size {0} exceeds the maximum of {MAX_BICLIQUE_SIZE}")]
    TooLarge(i64),
}

/// Which column of K(n,n) a vertex sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Advisory canvas position for a biclique vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutHint {
    pub side: Side,
    pub x: f32,
    pub y: f32,
}

/// The complete bipartite graph K(n,n).
///
/// Vertices are numbered the way the sampler numbers them: `S-0..S-(n-1)`
/// form the left partition, `S-n..S-(2n-1)` the right one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Biclique {
    n: usize,
    graph: Graph,
}

/// Build K(n,n). Same `n` always yields the same ids and edges.
pub fn generate(n: i64) -> Result<Biclique, InvalidSizeError> {
    let n = validate_size(n)?;

    let mut graph = Graph::new();
    for index in 0..2 * n {
        graph.add_vertex(VertexId::biclique(index));
    }
    for left in 0..n {
        for right in n..2 * n {
            // Both endpoints were inserted above.
            let _ = graph.add_edge(VertexId::biclique(left), VertexId::biclique(right));
        }
    }

    Ok(Biclique { n, graph })
}

/// Check a user-supplied partition size before anything is sent remotely.
pub fn validate_size(n: i64) -> Result<usize, InvalidSizeError> {
    if n <= 0 {
        return Err(InvalidSizeError::NonPositive(n));
    }
    match usize::try_from(n) {
        Ok(size) if size <= MAX_BICLIQUE_SIZE => Ok(size),
        _ => Err(InvalidSizeError::TooLarge(n)),
    }
}

impl Biclique {
    /// Partition size n.
    pub fn size(&self) -> usize {
        self.n
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn left(&self) -> impl Iterator<Item = VertexId> {
        (0..self.n).map(VertexId::biclique)
    }

    pub fn right(&self) -> impl Iterator<Item = VertexId> {
        (self.n..2 * self.n).map(VertexId::biclique)
    }

    pub fn side_of(&self, id: &VertexId) -> Option<Side> {
        match id {
            VertexId::Biclique(index) if *index < self.n => Some(Side::Left),
            VertexId::Biclique(index) if *index < 2 * self.n => Some(Side::Right),
            _ => None,
        }
    }

    /// Two parallel columns, evenly spaced and centred on y = 0.
    pub fn layout_hint(&self, id: &VertexId) -> Option<LayoutHint> {
        match id {
            VertexId::Biclique(index) => layout_hint(*index, self.n),
            VertexId::Target(_) => None,
        }
    }
}

/// Position of biclique vertex `index` in K(n,n), without building the graph.
pub fn layout_hint(index: usize, n: usize) -> Option<LayoutHint> {
    let (side, row, x) = if index < n {
        (Side::Left, index, -COLUMN_OFFSET)
    } else if index < 2 * n {
        (Side::Right, index - n, COLUMN_OFFSET)
    } else {
        return None;
    };
    let half_span = (n as f32 - 1.0) * ROW_SPACING / 2.0;
    Some(LayoutHint {
        side,
        x,
        y: row as f32 * ROW_SPACING - half_span,
    })
}
