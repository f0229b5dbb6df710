use crate::biclique::Biclique;
use crate::graph::Graph;
use crate::remote::{SamplerClient, SamplerError, TargetGraphReply};
use crate::versioned::Versioned;
use tracing::{error, info};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("could not fetch the target graph: {0}")]
    Sampler(#[from] SamplerError),
}

/// Descriptive fields reported alongside the target graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetMetadata {
    pub graph_type: String,
    pub num_nodes: usize,
    pub num_edges: usize,
}

/// Owner of the target graph G and the current biclique S.
#[derive(Debug, Default)]
pub struct GraphStore {
    target: Versioned<Graph>,
    biclique: Versioned<Option<Biclique>>,
    metadata: TargetMetadata,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch G from the sampler.
    ///
    /// On failure G is left empty so the renderer shows no graph.
    pub fn load_target_graph<C: SamplerClient + ?Sized>(
        &mut self,
        client: &C,
    ) -> Result<&Graph, FetchError> {
        self.apply_fetch(client.fetch_target_graph())
    }

    /// Install the result of a `/get_graph` request made elsewhere.
    pub fn apply_fetch(
        &mut self,
        fetched: Result<TargetGraphReply, SamplerError>,
    ) -> Result<&Graph, FetchError> {
        match fetched {
            Ok(reply) => {
                info!(
                    vertices = reply.graph.vertex_count(),
                    edges = reply.graph.edge_count(),
                    graph_type = %reply.metadata.graph_type,
                    "graph_store.fetch.loaded"
                );
                self.target.set(reply.graph);
                self.metadata = reply.metadata;
                Ok(self.target.get())
            }
            Err(err) => {
                error!(error = %err, "graph_store.fetch.failed");
                self.clear_target();
                Err(err.into())
            }
        }
    }

    fn clear_target(&mut self) {
        if !self.target.get().is_empty() {
            self.target.set(Graph::new());
        }
        self.metadata = TargetMetadata::default();
    }

    /// Drop S. A biclique is only meaningful against a loaded G.
    pub(crate) fn clear_biclique(&mut self) {
        if self.biclique.get().is_some() {
            self.biclique.set(None);
        }
    }

    /// Replace S. Only biclique generation in the session calls this.
    pub(crate) fn set_biclique(&mut self, biclique: Biclique) {
        self.biclique.set(Some(biclique));
    }

    pub fn target(&self) -> &Graph {
        self.target.get()
    }

    pub fn biclique(&self) -> Option<&Biclique> {
        self.biclique.get().as_ref()
    }

    pub fn metadata(&self) -> &TargetMetadata {
        &self.metadata
    }

    pub fn target_revision(&self) -> u64 {
        self.target.revision()
    }

    pub fn biclique_revision(&self) -> u64 {
        self.biclique.revision()
    }
}
