//! The remote sampler: endpoint contract, wire decoding and an HTTP client.
//!
//! The sampler owns the Markov chain. Everything it returns is decoded here
//! into namespaced ids, so nothing past this module ever sees a bare label.

use crate::chain::Homomorphism;
use crate::graph::Graph;
use crate::graph_store::TargetMetadata;
use crate::highlight::Selection;
use crate::vertex::{Edge, VertexId};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const GET_GRAPH: &str = "/get_graph";
pub const GENERATE_BICLIQUE: &str = "/generate_biclique";
pub const UPDATE_REGULAR: &str = "/update_homomorphism";
pub const UPDATE_NEIGHBOURHOOD: &str = "/update_homomorphism_neighbourhood";
pub const GET_HOMOMORPHISM: &str = "/get_homomorphism";

/// Which update rule the sampler applies for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateMode {
    /// Re-map a random S vertex to any other vertex of G
    #[default]
    Regular,
    /// Re-map a random S vertex to a neighbour of the current image
    Neighbourhood,
}

impl UpdateMode {
    pub const ALL: [UpdateMode; 2] = [UpdateMode::Regular, UpdateMode::Neighbourhood];

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Regular => UPDATE_REGULAR,
            Self::Neighbourhood => UPDATE_NEIGHBOURHOOD,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Regular => "Regular Update",
            Self::Neighbourhood => "Neighbourhood Update",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SamplerError {
    #[error("sampler unreachable at {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("{message}")]
    Refused {
        endpoint: &'static str,
        status: u16,
        message: String,
    },
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },
}

impl SamplerError {
    fn malformed(endpoint: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            endpoint,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetGraphReply {
    pub graph: Graph,
    pub metadata: TargetMetadata,
}

/// Decoded answer to one update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReply {
    pub mapping: Homomorphism,
    pub success: bool,
    pub message: Option<String>,
    pub selection: Selection,
}

/// Contract of the remote sampler.
///
/// The sampler holds a single mutable chain per session; callers must never
/// have two `update` calls in flight at once.
pub trait SamplerClient {
    fn fetch_target_graph(&self) -> Result<TargetGraphReply, SamplerError>;

    fn generate_biclique(&self, left: usize, right: usize) -> Result<Homomorphism, SamplerError>;

    fn update(&self, mode: UpdateMode) -> Result<UpdateReply, SamplerError>;

    /// The sampler's idea of the current mapping.
    fn current_homomorphism(&self) -> Result<Homomorphism, SamplerError>;
}

impl<T: SamplerClient + ?Sized> SamplerClient for &T {
    fn fetch_target_graph(&self) -> Result<TargetGraphReply, SamplerError> {
        (**self).fetch_target_graph()
    }

    fn generate_biclique(&self, left: usize, right: usize) -> Result<Homomorphism, SamplerError> {
        (**self).generate_biclique(left, right)
    }

    fn update(&self, mode: UpdateMode) -> Result<UpdateReply, SamplerError> {
        (**self).update(mode)
    }

    fn current_homomorphism(&self) -> Result<Homomorphism, SamplerError> {
        (**self).current_homomorphism()
    }
}

impl<T: SamplerClient + ?Sized> SamplerClient for Arc<T> {
    fn fetch_target_graph(&self) -> Result<TargetGraphReply, SamplerError> {
        (**self).fetch_target_graph()
    }

    fn generate_biclique(&self, left: usize, right: usize) -> Result<Homomorphism, SamplerError> {
        (**self).generate_biclique(left, right)
    }

    fn update(&self, mode: UpdateMode) -> Result<UpdateReply, SamplerError> {
        (**self).update(mode)
    }

    fn current_homomorphism(&self) -> Result<Homomorphism, SamplerError> {
        (**self).current_homomorphism()
    }
}

// ------------------------------------------------------------------
// Wire format
// ------------------------------------------------------------------

/// The sampler emits labels as JSON numbers or strings depending on the
/// graph it was built from.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireLabel {
    Text(String),
    Number(serde_json::Number),
}

impl WireLabel {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct GraphPayload {
    nodes: Vec<WireLabel>,
    edges: Vec<(WireLabel, WireLabel)>,
    #[serde(default)]
    graph_type: Option<String>,
    #[serde(default)]
    num_nodes: Option<usize>,
    #[serde(default)]
    num_edges: Option<usize>,
}

#[derive(Deserialize)]
struct GeneratePayload {
    homomorphism: BTreeMap<String, WireLabel>,
}

#[derive(Deserialize)]
struct UpdatePayload {
    #[serde(default)]
    homomorphism: BTreeMap<String, WireLabel>,
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "selected_S")]
    selected_s: Option<WireLabel>,
    #[serde(default, rename = "selected_G")]
    selected_g: Option<WireLabel>,
    #[serde(default)]
    homomorphic_edges: Option<Vec<(WireLabel, WireLabel)>>,
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: String,
}

fn biclique_vertex(endpoint: &'static str, label: &str) -> Result<VertexId, SamplerError> {
    label
        .trim()
        .parse::<usize>()
        .map(VertexId::biclique)
        .map_err(|_| SamplerError::malformed(endpoint, format!("biclique vertex `{label}` is not an index")))
}

fn decode_mapping(
    endpoint: &'static str,
    raw: BTreeMap<String, WireLabel>,
) -> Result<Homomorphism, SamplerError> {
    raw.into_iter()
        .map(|(from, to)| Ok((biclique_vertex(endpoint, &from)?, VertexId::target(to.into_string()))))
        .collect()
}

fn status_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Error carried by a non-2xx answer: the sampler's `{error}` text when
/// present, otherwise the status line.
fn refusal(endpoint: &'static str, status: u16, body: &str) -> SamplerError {
    let message = serde_json::from_str::<ErrorPayload>(body)
        .map(|p| p.error)
        .unwrap_or_else(|_| format!("{endpoint} answered HTTP {status}"));
    SamplerError::Refused {
        endpoint,
        status,
        message,
    }
}

pub fn decode_target_graph(status: u16, body: &str) -> Result<TargetGraphReply, SamplerError> {
    if !status_ok(status) {
        return Err(refusal(GET_GRAPH, status, body));
    }
    let payload: GraphPayload =
        serde_json::from_str(body).map_err(|e| SamplerError::malformed(GET_GRAPH, e))?;

    let vertices: Vec<VertexId> = payload
        .nodes
        .into_iter()
        .map(|l| VertexId::target(l.into_string()))
        .collect();
    let edges = payload
        .edges
        .into_iter()
        .map(|(a, b)| Edge::new(VertexId::target(a.into_string()), VertexId::target(b.into_string())));
    let graph = Graph::from_parts(vertices, edges).map_err(|e| SamplerError::malformed(GET_GRAPH, e))?;

    let metadata = TargetMetadata {
        graph_type: payload.graph_type.unwrap_or_else(|| "Unknown".to_string()),
        num_nodes: payload.num_nodes.unwrap_or(graph.vertex_count()),
        num_edges: payload.num_edges.unwrap_or(graph.edge_count()),
    };
    Ok(TargetGraphReply { graph, metadata })
}

pub fn decode_generated(status: u16, body: &str) -> Result<Homomorphism, SamplerError> {
    if !status_ok(status) {
        return Err(refusal(GENERATE_BICLIQUE, status, body));
    }
    let payload: GeneratePayload =
        serde_json::from_str(body).map_err(|e| SamplerError::malformed(GENERATE_BICLIQUE, e))?;
    decode_mapping(GENERATE_BICLIQUE, payload.homomorphism)
}

/// Decode an update answer.
///
/// The sampler reports some rejected steps with HTTP 400 but the regular
/// update body, so the body shape decides, not the status.
pub fn decode_update(mode: UpdateMode, status: u16, body: &str) -> Result<UpdateReply, SamplerError> {
    let endpoint = mode.endpoint();
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| SamplerError::malformed(endpoint, e))?;
    if value.get("success").is_none() {
        if value.get("error").is_some() || !status_ok(status) {
            return Err(refusal(endpoint, status, body));
        }
        return Err(SamplerError::malformed(endpoint, "missing field `success`"));
    }
    let payload: UpdatePayload =
        serde_json::from_value(value).map_err(|e| SamplerError::malformed(endpoint, e))?;

    let selected_s = payload
        .selected_s
        .map(|l| biclique_vertex(endpoint, &l.into_string()))
        .transpose()?;
    let selection = Selection {
        selected_s,
        selected_g: payload.selected_g.map(|l| VertexId::target(l.into_string())),
        homomorphic_edges: payload
            .homomorphic_edges
            .unwrap_or_default()
            .into_iter()
            .map(|(a, b)| Edge::new(VertexId::target(a.into_string()), VertexId::target(b.into_string())))
            .collect(),
    };

    Ok(UpdateReply {
        mapping: decode_mapping(endpoint, payload.homomorphism)?,
        success: payload.success,
        message: payload.message,
        selection,
    })
}

pub fn decode_current(status: u16, body: &str) -> Result<Homomorphism, SamplerError> {
    if !status_ok(status) {
        return Err(refusal(GET_HOMOMORPHISM, status, body));
    }
    let raw: BTreeMap<String, WireLabel> =
        serde_json::from_str(body).map_err(|e| SamplerError::malformed(GET_HOMOMORPHISM, e))?;
    decode_mapping(GET_HOMOMORPHISM, raw)
}

// ------------------------------------------------------------------
// HTTP client
// ------------------------------------------------------------------

/// Blocking HTTP client for the sampler service.
pub struct HttpSampler {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpSampler {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Collapse a ureq result into (status, body). Error statuses still
    /// carry a body worth decoding.
    fn exchange(
        &self,
        endpoint: &'static str,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<(u16, String), SamplerError> {
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(SamplerError::Transport {
                    url: self.url(endpoint),
                    reason: transport.to_string(),
                });
            }
        };
        let status = response.status();
        let body = response.into_string().map_err(|e| SamplerError::Transport {
            url: self.url(endpoint),
            reason: e.to_string(),
        })?;
        debug!(endpoint, status, bytes = body.len(), "remote.response");
        Ok((status, body))
    }
}

impl SamplerClient for HttpSampler {
    fn fetch_target_graph(&self) -> Result<TargetGraphReply, SamplerError> {
        let result = self.agent.get(&self.url(GET_GRAPH)).call();
        let (status, body) = self.exchange(GET_GRAPH, result)?;
        decode_target_graph(status, &body)
    }

    fn generate_biclique(&self, left: usize, right: usize) -> Result<Homomorphism, SamplerError> {
        let result = self
            .agent
            .post(&self.url(GENERATE_BICLIQUE))
            .send_json(serde_json::json!({ "set1_size": left, "set2_size": right }));
        let (status, body) = self.exchange(GENERATE_BICLIQUE, result)?;
        decode_generated(status, &body)
    }

    fn update(&self, mode: UpdateMode) -> Result<UpdateReply, SamplerError> {
        let endpoint = mode.endpoint();
        let result = self.agent.post(&self.url(endpoint)).call();
        let (status, body) = self.exchange(endpoint, result)?;
        decode_update(mode, status, &body)
    }

    fn current_homomorphism(&self) -> Result<Homomorphism, SamplerError> {
        let result = self.agent.get(&self.url(GET_HOMOMORPHISM)).call();
        let (status, body) = self.exchange(GET_HOMOMORPHISM, result)?;
        decode_current(status, &body)
    }
}
