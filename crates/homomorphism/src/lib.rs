pub mod biclique;
pub mod chain;
pub mod graph;
pub mod graph_store;
pub mod highlight;
pub mod orchestrator;
pub mod remote;
pub mod session;
pub mod versioned;
pub mod vertex;

pub use biclique::{Biclique, InvalidSizeError};
pub use chain::{DomainMismatchError, Homomorphism, HomomorphismState};
pub use graph::{Graph, GraphError};
pub use graph_store::{FetchError, GraphStore, TargetMetadata};
pub use highlight::{Category, NodeRole, Selection};
pub use orchestrator::{
    CancelToken, IterationTally, NullSink, OrchestratorError, Phase, RenderSink,
    StepError, UpdateOrchestrator, UpdateOutcome, DEFAULT_STEP_PAUSE,
};
pub use remote::{
    HttpSampler, SamplerClient, SamplerError, TargetGraphReply, UpdateMode, UpdateReply,
};
pub use session::{
    read_shared, Session, SessionAccess, SessionError, SharedSession, SyncStatus,
};
pub use versioned::Versioned;
pub use vertex::{Edge, VertexId};
