use crate::graph_view::{VertexGraphDisplay, setup_graph_display};
use crate::memoized::Memoized;
use homomorphism::{Biclique, Graph, Session};

/// Display graphs rebuilt only when the session's G or S changes.
pub struct Cache {
    pub target_graph: Memoized<Session, u64, VertexGraphDisplay>,
    pub biclique_graph: Memoized<Session, u64, VertexGraphDisplay>,
}

impl Cache {
    pub fn new() -> Self {
        let target_graph = Memoized::new(
            |s: &Session| s.graphs().target_revision(),
            |s: &Session| setup_graph_display(s.graphs().target(), 0),
        );

        let biclique_graph = Memoized::new(
            |s: &Session| s.graphs().biclique_revision(),
            |s: &Session| match s.graphs().biclique() {
                Some(biclique) => {
                    setup_graph_display(biclique.graph(), biclique.size())
                }
                None => setup_graph_display(&Graph::new(), 0),
            },
        );

        Self {
            target_graph,
            biclique_graph,
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

/// Vertices of S in display order, with their current image in G.
pub fn mapping_rows(session: &Session) -> Vec<(String, String)> {
    let Some(current) = session.chain().current() else {
        return Vec::new();
    };
    let Some(biclique) = session.graphs().biclique() else {
        return Vec::new();
    };
    biclique
        .left()
        .chain(biclique.right())
        .map(|v| {
            let image = current
                .image(&v)
                .map_or_else(|| "?".to_string(), ToString::to_string);
            (v.to_string(), image)
        })
        .collect()
}

/// Size shown next to the biclique view.
pub fn biclique_caption(biclique: Option<&Biclique>) -> String {
    match biclique {
        Some(b) => format!(
            "K({n},{n}): {} vertices, {} edges",
            b.graph().vertex_count(),
            b.graph().edge_count(),
            n = b.size()
        ),
        None => "No biclique generated".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homomorphism::biclique;

    #[test]
    fn test_empty_session_has_no_rows() {
        let session = Session::new();
        assert!(mapping_rows(&session).is_empty());
        assert_eq!(
            biclique_caption(session.graphs().biclique()),
            "No biclique generated"
        );
    }

    #[test]
    fn test_caption_counts() {
        let b = biclique::generate(3).unwrap();
        assert_eq!(biclique_caption(Some(&b)), "K(3,3): 6 vertices, 9 edges");
    }

    #[test]
    fn test_cache_follows_revisions() {
        let session = Session::new();
        let mut cache = Cache::new();
        assert_eq!(cache.target_graph.get(&session).nodes_iter().count(), 0);
        let v = cache.target_graph.version();
        cache.target_graph.get(&session);
        assert_eq!(cache.target_graph.version(), v);
    }
}
