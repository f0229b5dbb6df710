#![allow(dead_code)]

use homomorphism::{
    Edge, Graph, Homomorphism, SamplerClient, SamplerError, Selection, TargetGraphReply,
    TargetMetadata, UpdateMode, UpdateReply, VertexId,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// In-memory sampler that answers from a script, in order.
pub struct ScriptedSampler {
    target: Mutex<Result<TargetGraphReply, SamplerError>>,
    generated: Mutex<VecDeque<Result<Homomorphism, SamplerError>>>,
    updates: Mutex<VecDeque<Result<UpdateReply, SamplerError>>>,
    pub update_calls: Mutex<Vec<UpdateMode>>,
    pub generate_calls: Mutex<usize>,
    pub remote: Mutex<Homomorphism>,
}

impl ScriptedSampler {
    pub fn new(target: Result<TargetGraphReply, SamplerError>) -> Self {
        Self {
            target: Mutex::new(target),
            generated: Mutex::new(VecDeque::new()),
            updates: Mutex::new(VecDeque::new()),
            update_calls: Mutex::new(Vec::new()),
            generate_calls: Mutex::new(0),
            remote: Mutex::new(Homomorphism::new()),
        }
    }

    pub fn with_cycle(n: usize) -> Self {
        Self::new(Ok(cycle(n)))
    }

    /// Answer for every later `/get_graph` request.
    pub fn set_target(&self, target: Result<TargetGraphReply, SamplerError>) {
        *self.target.lock().unwrap() = target;
    }

    pub fn push_generated(&self, reply: Result<Homomorphism, SamplerError>) {
        self.generated.lock().unwrap().push_back(reply);
    }

    pub fn push_update(&self, reply: Result<UpdateReply, SamplerError>) {
        self.updates.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.update_calls.lock().unwrap().len()
    }
}

impl SamplerClient for ScriptedSampler {
    fn fetch_target_graph(&self) -> Result<TargetGraphReply, SamplerError> {
        self.target.lock().unwrap().clone()
    }

    fn generate_biclique(&self, left: usize, right: usize) -> Result<Homomorphism, SamplerError> {
        assert_eq!(left, right, "the viewer only asks for balanced bicliques");
        *self.generate_calls.lock().unwrap() += 1;
        let reply = self
            .generated
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(constant(2 * left, "0")));
        if let Ok(mapping) = &reply {
            *self.remote.lock().unwrap() = mapping.clone();
        }
        reply
    }

    fn update(&self, mode: UpdateMode) -> Result<UpdateReply, SamplerError> {
        self.update_calls.lock().unwrap().push(mode);
        let reply = self
            .updates
            .lock()
            .unwrap()
            .pop_front()
            .expect("update script exhausted");
        if let Ok(reply) = &reply {
            if reply.success {
                *self.remote.lock().unwrap() = reply.mapping.clone();
            }
        }
        reply
    }

    fn current_homomorphism(&self) -> Result<Homomorphism, SamplerError> {
        Ok(self.remote.lock().unwrap().clone())
    }
}

/// The cycle C_n with labels "0".."n-1".
pub fn cycle(n: usize) -> TargetGraphReply {
    let vertices: Vec<VertexId> = (0..n).map(|i| VertexId::target(i.to_string())).collect();
    let edges = (0..n).map(|i| {
        Edge::new(
            VertexId::target(i.to_string()),
            VertexId::target(((i + 1) % n).to_string()),
        )
    });
    TargetGraphReply {
        graph: Graph::from_parts(vertices, edges).unwrap(),
        metadata: TargetMetadata {
            graph_type: "Cycle".into(),
            num_nodes: n,
            num_edges: n,
        },
    }
}

/// Every one of `vertices` biclique vertices sent to the same G vertex.
pub fn constant(vertices: usize, image: &str) -> Homomorphism {
    (0..vertices)
        .map(|i| (VertexId::biclique(i), VertexId::target(image)))
        .collect()
}

pub fn accepted(mapping: Homomorphism, s: usize, g: &str, edges: &[(&str, &str)]) -> UpdateReply {
    UpdateReply {
        mapping,
        success: true,
        message: None,
        selection: Selection {
            selected_s: Some(VertexId::biclique(s)),
            selected_g: Some(VertexId::target(g)),
            homomorphic_edges: edges
                .iter()
                .map(|(a, b)| Edge::new(VertexId::target(*a), VertexId::target(*b)))
                .collect(),
        },
    }
}

pub fn rejected(mapping: Homomorphism, s: usize, message: Option<&str>) -> UpdateReply {
    UpdateReply {
        mapping,
        success: false,
        message: message.map(str::to_string),
        selection: Selection {
            selected_s: Some(VertexId::biclique(s)),
            ..Selection::default()
        },
    }
}
