use std::fmt;
use std::str::FromStr;

const TARGET_PREFIX: &str = "G-";
const BICLIQUE_PREFIX: &str = "S-";

/// Vertex identifier namespaced by the graph it belongs to.
///
/// The sampler labels both graphs with small integers, so the raw label
/// `"0"` exists in G and in S. Keeping the origin in the type means the two
/// spaces can share one lookup table without colliding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VertexId {
    /// Vertex of the target graph G, carrying the sampler's label
    Target(String),
    /// Vertex of the biclique S, carrying its positional index
    Biclique(usize),
}

impl VertexId {
    pub fn target(label: impl Into<String>) -> Self {
        Self::Target(label.into())
    }

    pub fn biclique(index: usize) -> Self {
        Self::Biclique(index)
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Self::Target(_))
    }

    pub fn is_biclique(&self) -> bool {
        matches!(self, Self::Biclique(_))
    }

    /// The label as the sampler knows it, without namespace prefix.
    pub fn raw_label(&self) -> String {
        match self {
            Self::Target(label) => label.clone(),
            Self::Biclique(index) => index.to_string(),
        }
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(label) => write!(f, "{TARGET_PREFIX}{label}"),
            Self::Biclique(index) => write!(f, "{BICLIQUE_PREFIX}{index}"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VertexIdParseError {
    #[error("vertex id `{0}` has no known namespace prefix")]
    UnknownNamespace(String),
    #[error("biclique vertex id `{0}` is not a positional index")]
    BadIndex(String),
}

impl FromStr for VertexId {
    type Err = VertexIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(label) = s.strip_prefix(TARGET_PREFIX) {
            return Ok(Self::target(label));
        }
        if let Some(index) = s.strip_prefix(BICLIQUE_PREFIX) {
            return index
                .parse::<usize>()
                .map(Self::biclique)
                .map_err(|_| VertexIdParseError::BadIndex(s.to_string()));
        }
        Err(VertexIdParseError::UnknownNamespace(s.to_string()))
    }
}

/// Undirected edge. Endpoints are stored in sorted order so `(a, b)` and
/// `(b, a)` compare, hash and order identically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    low: VertexId,
    high: VertexId,
}

impl Edge {
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn endpoints(&self) -> (&VertexId, &VertexId) {
        (&self.low, &self.high)
    }

    pub fn touches(&self, v: &VertexId) -> bool {
        self.low == *v || self.high == *v
    }

    pub fn is_loop(&self) -> bool {
        self.low == self.high
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {}", self.low, self.high)
    }
}
