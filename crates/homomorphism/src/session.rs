//! One browsing session: both graphs, the chain record and the latest
//! selection, plus the operations that keep them consistent with each other.

use crate::biclique::{self, Biclique, InvalidSizeError};
use crate::chain::{DomainMismatchError, Homomorphism, HomomorphismState};
use crate::graph_store::{FetchError, GraphStore};
use crate::highlight::{self, NodeRole, Selection};
use crate::orchestrator::{StepError, UpdateOutcome};
use crate::remote::{SamplerClient, SamplerError, TargetGraphReply, UpdateReply};
use crate::vertex::VertexId;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

/// Shown when the sampler rejects a step without saying why.
pub const GENERIC_REJECTION: &str = "Update failed. No valid mapping found for the selected vertex.";

pub type SharedSession = Arc<RwLock<Session>>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    InvalidSize(#[from] InvalidSizeError),
    #[error("the target graph is not loaded")]
    TargetGraphMissing,
    #[error(transparent)]
    Sampler(#[from] SamplerError),
    #[error("sampler mapping does not fit the new biclique: {0}")]
    DomainMismatch(#[from] DomainMismatchError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Result of comparing the local chain head with the sampler's mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// No biclique on either side yet
    NotStarted,
    InSync,
    Diverged {
        local: Option<Homomorphism>,
        remote: Homomorphism,
    },
}

#[derive(Debug, Default)]
pub struct Session {
    graphs: GraphStore,
    chain: HomomorphismState,
    selection: Selection,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn load_target_graph<C: SamplerClient + ?Sized>(
        &mut self,
        client: &C,
    ) -> Result<(), SessionError> {
        self.apply_target_fetch(client.fetch_target_graph())
    }

    /// Install the outcome of a `/get_graph` request made without the
    /// session borrowed.
    ///
    /// A failed fetch leaves G empty, and S, the chain and the selection go
    /// with it so no update can run against a missing target.
    pub fn apply_target_fetch(
        &mut self,
        fetched: Result<TargetGraphReply, SamplerError>,
    ) -> Result<(), SessionError> {
        if let Err(err) = self.graphs.apply_fetch(fetched) {
            if self.graphs.biclique().is_some() {
                warn!("session.fetch.failed.biclique_dropped");
            }
            self.graphs.clear_biclique();
            self.chain = HomomorphismState::new();
            self.selection = Selection::default();
            return Err(err.into());
        }
        Ok(())
    }

    /// Why an update request may not be sent right now, if anything.
    pub fn update_blocker(&self) -> Option<StepError> {
        if self.graphs.target().is_empty() {
            Some(StepError::TargetGraphMissing)
        } else if self.graphs.biclique().is_none() {
            Some(StepError::NoBiclique)
        } else {
            None
        }
    }

    /// Build K(n,n), ask the sampler for a starting mapping and install both.
    ///
    /// Nothing changes unless every step succeeds.
    pub fn generate_biclique<C: SamplerClient + ?Sized>(
        &mut self,
        client: &C,
        n: i64,
    ) -> Result<(), SessionError> {
        let biclique = self.prepare_biclique(n)?;
        let size = biclique.size();
        let mapping = client.generate_biclique(size, size)?;
        self.install_biclique(biclique, mapping)
    }

    /// Validate `n` and build S locally. Must succeed before any
    /// `/generate_biclique` request is sent.
    pub fn prepare_biclique(&self, n: i64) -> Result<Biclique, SessionError> {
        let biclique = biclique::generate(n)?;
        if self.graphs.target().is_empty() {
            warn!(n, "session.generate.no_target");
            return Err(SessionError::TargetGraphMissing);
        }
        Ok(biclique)
    }

    /// Replace S and restart the chain from the sampler's initial mapping.
    pub fn install_biclique(
        &mut self,
        biclique: Biclique,
        mapping: Homomorphism,
    ) -> Result<(), SessionError> {
        let mut chain = HomomorphismState::new();
        chain.initialize(mapping, biclique.graph())?;

        info!(
            n = biclique.size(),
            edges = biclique.graph().edge_count(),
            "session.generate.installed"
        );
        self.chain = chain;
        self.selection = Selection::default();
        self.graphs.set_biclique(biclique);
        Ok(())
    }

    /// Fold one update reply into the session.
    ///
    /// The selection follows every attempted step. A reply whose mapping
    /// belongs to another biclique is refused outright and changes nothing.
    pub fn apply_update(&mut self, reply: UpdateReply) -> UpdateOutcome {
        let UpdateReply {
            mapping,
            success,
            message,
            selection,
        } = reply;

        let Some(biclique) = self.graphs.biclique() else {
            return UpdateOutcome::Failed(StepError::NoBiclique);
        };

        if success {
            match self.chain.record_success(mapping, biclique.graph()) {
                Ok(history_len) => {
                    self.selection = selection;
                    UpdateOutcome::Accepted { history_len }
                }
                Err(err) => UpdateOutcome::Failed(StepError::DomainMismatch(err)),
            }
        } else {
            let message = message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_REJECTION.to_string());
            self.chain.record_failure(&message);
            self.selection = selection;
            UpdateOutcome::Rejected { message }
        }
    }

    /// Ask the sampler for its current mapping and compare.
    pub fn check_sync<C: SamplerClient + ?Sized>(
        &self,
        client: &C,
    ) -> Result<SyncStatus, SamplerError> {
        Ok(self.compare_with(client.current_homomorphism()?))
    }

    pub fn compare_with(&self, remote: Homomorphism) -> SyncStatus {
        let local = self.chain.current();
        let status = match local {
            None if remote.is_empty() => SyncStatus::NotStarted,
            Some(local) if *local == remote => SyncStatus::InSync,
            _ => SyncStatus::Diverged {
                local: local.cloned(),
                remote,
            },
        };
        debug!(?status, "session.check_sync");
        status
    }

    pub fn graphs(&self) -> &GraphStore {
        &self.graphs
    }

    pub fn chain(&self) -> &HomomorphismState {
        &self.chain
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn biclique_size(&self) -> usize {
        self.graphs.biclique().map_or(0, Biclique::size)
    }

    /// Rendering role of any vertex under the current selection.
    pub fn node_role(&self, id: &VertexId) -> NodeRole {
        highlight::node_role(id, self.biclique_size(), &self.selection)
    }
}

/// Uniform mutable access to a session, owned or shared.
pub trait SessionAccess {
    fn with_session<R>(&mut self, f: impl FnOnce(&mut Session) -> R) -> R;
}

impl SessionAccess for Session {
    fn with_session<R>(&mut self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(self)
    }
}

impl SessionAccess for SharedSession {
    fn with_session<R>(&mut self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

/// Read guard that survives a panicked writer.
pub fn read_shared(session: &SharedSession) -> RwLockReadGuard<'_, Session> {
    session.read().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::graph_store::TargetMetadata;
    use crate::remote::UpdateMode;
    use crate::vertex::Edge;
    use std::cell::Cell;

    /// Maps every biclique vertex onto one edge of a two-vertex G.
    struct TwoVertexSampler {
        generate_calls: Cell<usize>,
        remote: Homomorphism,
    }

    impl TwoVertexSampler {
        fn new() -> Self {
            Self {
                generate_calls: Cell::new(0),
                remote: Homomorphism::new(),
            }
        }
    }

    fn split_mapping(n: usize) -> Homomorphism {
        (0..2 * n)
            .map(|i| {
                let image = if i < n { "a" } else { "b" };
                (VertexId::biclique(i), VertexId::target(image))
            })
            .collect()
    }

    impl SamplerClient for TwoVertexSampler {
        fn fetch_target_graph(&self) -> Result<TargetGraphReply, SamplerError> {
            let graph = Graph::from_parts(
                [VertexId::target("a"), VertexId::target("b")],
                [Edge::new(VertexId::target("a"), VertexId::target("b"))],
            )
            .unwrap();
            Ok(TargetGraphReply {
                graph,
                metadata: TargetMetadata::default(),
            })
        }

        fn generate_biclique(&self, left: usize, right: usize) -> Result<Homomorphism, SamplerError> {
            assert_eq!(left, right);
            self.generate_calls.set(self.generate_calls.get() + 1);
            Ok(split_mapping(left))
        }

        fn update(&self, _: UpdateMode) -> Result<UpdateReply, SamplerError> {
            unreachable!()
        }

        fn current_homomorphism(&self) -> Result<Homomorphism, SamplerError> {
            Ok(self.remote.clone())
        }
    }

    fn ready_session(sampler: &TwoVertexSampler, n: i64) -> Session {
        let mut session = Session::new();
        session.load_target_graph(sampler).unwrap();
        session.generate_biclique(sampler, n).unwrap();
        session
    }

    #[test]
    fn test_generate_requires_target_graph() {
        let sampler = TwoVertexSampler::new();
        let mut session = Session::new();
        assert_eq!(
            session.generate_biclique(&sampler, 2).unwrap_err(),
            SessionError::TargetGraphMissing
        );
        assert_eq!(sampler.generate_calls.get(), 0);
    }

    #[test]
    fn test_invalid_size_rejected_before_request() {
        let sampler = TwoVertexSampler::new();
        let mut session = Session::new();
        session.load_target_graph(&sampler).unwrap();
        assert!(matches!(
            session.generate_biclique(&sampler, 0),
            Err(SessionError::InvalidSize(InvalidSizeError::NonPositive(0)))
        ));
        assert_eq!(sampler.generate_calls.get(), 0);
        assert!(session.graphs().biclique().is_none());
    }

    #[test]
    fn test_generate_seeds_chain_and_clears_selection() {
        let sampler = TwoVertexSampler::new();
        let mut session = ready_session(&sampler, 2);
        session.selection = Selection {
            selected_s: Some(VertexId::biclique(0)),
            ..Selection::default()
        };

        session.generate_biclique(&sampler, 3).unwrap();
        assert_eq!(session.biclique_size(), 3);
        assert_eq!(session.chain().len(), 1);
        assert_eq!(session.chain().current(), Some(&split_mapping(3)));
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_rejection_uses_fallback_message_and_keeps_history() {
        let sampler = TwoVertexSampler::new();
        let mut session = ready_session(&sampler, 1);
        let outcome = session.apply_update(UpdateReply {
            mapping: split_mapping(1),
            success: false,
            message: None,
            selection: Selection {
                selected_s: Some(VertexId::biclique(1)),
                ..Selection::default()
            },
        });
        assert_eq!(
            outcome,
            UpdateOutcome::Rejected {
                message: GENERIC_REJECTION.to_string()
            }
        );
        assert_eq!(session.chain().len(), 1);
        assert_eq!(session.selection().selected_s, Some(VertexId::biclique(1)));
    }

    #[test]
    fn test_stale_mapping_leaves_everything_untouched() {
        let sampler = TwoVertexSampler::new();
        let mut session = ready_session(&sampler, 1);
        let outcome = session.apply_update(UpdateReply {
            mapping: split_mapping(2),
            success: true,
            message: None,
            selection: Selection {
                selected_s: Some(VertexId::biclique(3)),
                ..Selection::default()
            },
        });
        assert!(matches!(outcome, UpdateOutcome::Failed(StepError::DomainMismatch(_))));
        assert_eq!(session.chain().len(), 1);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_check_sync() {
        let mut sampler = TwoVertexSampler::new();
        assert_eq!(Session::new().check_sync(&sampler), Ok(SyncStatus::NotStarted));

        let session = ready_session(&sampler, 2);
        assert!(matches!(
            session.check_sync(&sampler),
            Ok(SyncStatus::Diverged { .. })
        ));
        sampler.remote = split_mapping(2);
        assert_eq!(session.check_sync(&sampler), Ok(SyncStatus::InSync));
    }

    #[test]
    fn test_shared_session_access() {
        let sampler = TwoVertexSampler::new();
        let mut shared = ready_session(&sampler, 2).into_shared();
        let len = shared.with_session(|s| s.chain().len());
        assert_eq!(len, 1);
        assert_eq!(read_shared(&shared).biclique_size(), 2);
    }
}
