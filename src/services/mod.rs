pub mod cache;
pub mod cycle;
pub mod narrative;
pub mod orchestrator;
pub mod retry;
pub mod signals;

pub use cache::Cache;
pub use cycle::{CycleGate, CycleStatus, GatePhase, SkipReason, Trigger};
pub use narrative::{
    LocalNarrativeAnalyzer, Narrative, NarrativeAnalyzer, NarrativeContext,
    RemoteNarrativeAnalyzer,
};
pub use orchestrator::{Collaborators, SignalOrchestrator};
pub use retry::RetryPolicy;
