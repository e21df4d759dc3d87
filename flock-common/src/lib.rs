pub mod agent;
pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use agent::{Agent, AgentId};
pub use config::{SimulationConfig, WorldConfig, FlockSetup, RulesConfig, RulePreset, TimingConfig, NeighborConfig, NeighborStrategy, OutputConfig, ControlEvent};
pub use sim_params::{CoincidencePolicy, Factors, FlockConfig};
pub use snapshot::{AgentRecord, Snapshot};
pub use vecmath::{Vector2, WorldBounds};
