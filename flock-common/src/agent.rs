use crate::vecmath::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an agent. Assigned at creation and never reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One boid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Visual variant tag. Opaque to the simulation.
    pub sprite_index: u32,
    pub position: Vector2,
    /// Magnitude stays within `[min_speed, max_speed]` after every step.
    pub velocity: Vector2,
    /// Steering accumulator, zero between ticks.
    pub acceleration: Vector2,
}

impl Agent {
    pub fn new(id: AgentId, sprite_index: u32, position: Vector2, velocity: Vector2) -> Self {
        Agent {
            id,
            sprite_index,
            position,
            velocity,
            acceleration: Vector2::zero(),
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.len()
    }

    /// Rotation a renderer should draw this agent with.
    pub fn heading(&self) -> f64 {
        self.velocity.angle()
    }
}
