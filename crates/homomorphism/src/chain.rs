use crate::graph::Graph;
use crate::vertex::VertexId;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error};

/// Total mapping from the biclique's vertices into the target graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Homomorphism(BTreeMap<VertexId, VertexId>);

impl Homomorphism {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: VertexId, to: VertexId) -> Option<VertexId> {
        self.0.insert(from, to)
    }

    pub fn image(&self, v: &VertexId) -> Option<&VertexId> {
        self.0.get(v)
    }

    pub fn domain(&self) -> impl Iterator<Item = &VertexId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VertexId, &VertexId)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compare the domain with a biclique's vertex set.
    pub fn check_domain(&self, biclique: &Graph) -> Result<(), DomainMismatchError> {
        let missing: Vec<VertexId> = biclique
            .vertices()
            .iter()
            .filter(|v| !self.0.contains_key(v))
            .cloned()
            .collect();
        let unexpected: Vec<VertexId> = self
            .0
            .keys()
            .filter(|v| !biclique.contains_vertex(v))
            .cloned()
            .collect();
        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(DomainMismatchError {
                missing,
                unexpected,
            })
        }
    }
}

impl FromIterator<(VertexId, VertexId)> for Homomorphism {
    fn from_iter<I: IntoIterator<Item = (VertexId, VertexId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Homomorphism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (from, to) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{from} -> {to}")?;
            first = false;
        }
        Ok(())
    }
}

/// The mapping's domain does not match the active biclique. Indicates the
/// client and the sampler disagree about which S is current.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "mapping domain does not match the biclique ({} missing, {} unexpected)",
    missing.len(),
    unexpected.len()
)]
pub struct DomainMismatchError {
    pub missing: Vec<VertexId>,
    pub unexpected: Vec<VertexId>,
}

/// Current homomorphism plus the append-only record of every accepted one.
///
/// `history[0]` is the mapping handed out at biclique generation; each later
/// entry comes from one successful update step, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct HomomorphismState {
    history: Vec<Homomorphism>,
}

impl HomomorphismState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new chain from the mapping produced at generation time.
    pub fn initialize(
        &mut self,
        mapping: Homomorphism,
        biclique: &Graph,
    ) -> Result<(), DomainMismatchError> {
        mapping.check_domain(biclique)?;
        debug!(vertices = mapping.len(), "chain.initialize");
        self.history = vec![mapping];
        Ok(())
    }

    /// Append an accepted mapping. Returns the new history length.
    pub fn record_success(
        &mut self,
        mapping: Homomorphism,
        biclique: &Graph,
    ) -> Result<usize, DomainMismatchError> {
        if let Err(err) = mapping.check_domain(biclique) {
            error!(
                missing = err.missing.len(),
                unexpected = err.unexpected.len(),
                "chain.record_success.domain_mismatch"
            );
            return Err(err);
        }
        self.history.push(mapping);
        Ok(self.history.len())
    }

    pub fn record_failure(&self, reason: &str) {
        debug!(%reason, history = self.history.len(), "chain.record_failure");
    }

    pub fn current(&self) -> Option<&Homomorphism> {
        self.history.last()
    }

    pub fn history(&self) -> &[Homomorphism] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        !self.history.is_empty()
    }
}
