use crate::agent::{Agent, AgentId};
use crate::sim_params::Factors;
use crate::vecmath::Vector2;
use serde::{Deserialize, Serialize};

/// Per-agent state handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: AgentId,
    pub sprite_index: u32,
    pub position: Vector2,
    pub velocity: Vector2,
    /// Rotation in radians, from the velocity.
    pub heading: f64,
}

impl From<&Agent> for AgentRecord {
    fn from(agent: &Agent) -> Self {
        AgentRecord {
            id: agent.id,
            sprite_index: agent.sprite_index,
            position: agent.position,
            velocity: agent.velocity,
            heading: agent.heading(),
        }
    }
}

/// A snapshot of the flock and its summary metrics at a specific tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of ticks completed when the snapshot was taken.
    pub step: u64,
    /// Integrated simulation time (sum of every dt passed to the integrator).
    pub time: f64,
    pub agent_count: u64,
    /// Mean |velocity| over all agents.
    pub mean_speed: f64,
    /// |sum of unit headings| / n. 1.0 means everyone flies the same way.
    pub polarization: f64,
    /// Arithmetic mean position.
    pub centroid: Vector2,
    pub factors: Factors,
    /// Always written, even when `None`: bincode and MessagePack decode by field position.
    pub agents: Option<Vec<AgentRecord>>,
}

impl Snapshot {
    /// Computes the summary metrics for `agents`. Agent records are attached only when asked.
    pub fn capture(step: u64, time: f64, factors: Factors, agents: &[Agent], with_agents: bool) -> Self {
        let n = agents.len();
        let (mean_speed, polarization, centroid) = if n == 0 {
            (0.0, 0.0, Vector2::zero())
        } else {
            let mut speed_sum = 0.0;
            let mut heading_sum = Vector2::zero();
            let mut position_sum = Vector2::zero();
            for agent in agents {
                speed_sum += agent.speed();
                if let Some(u) = agent.velocity.unit() {
                    heading_sum += u;
                }
                position_sum += agent.position;
            }
            let inv_n = 1.0 / n as f64;
            (speed_sum * inv_n, heading_sum.len() * inv_n, position_sum.scaled(inv_n))
        };

        Snapshot {
            step,
            time,
            agent_count: n as u64,
            mean_speed,
            polarization,
            centroid,
            factors,
            agents: with_agents.then(|| agents.iter().map(AgentRecord::from).collect()),
        }
    }
}
