use flock_common::{Agent, AgentId, Vector2};

/// Holds the flock in insertion order plus the per-tick steering buffer.
#[derive(Debug, Default)]
pub struct FlockState {
    /// Agents in insertion order. Ids are strictly increasing along the vector.
    pub agents: Vec<Agent>,
    /// Damped steering computed for each agent this tick (output of the rule pass).
    pub steering_out: Vec<Vector2>,
    next_id: u64,
}

impl FlockState {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            agents: Vec::with_capacity(capacity),
            steering_out: Vec::with_capacity(capacity),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Ensures the agent and steering buffers can hold `required` agents without reallocating.
    pub fn ensure_capacity(&mut self, required: usize) {
        if required > self.agents.capacity() {
            let new_capacity = (required as f64 * 1.2).ceil() as usize; // Grow by 20%
            log::debug!(
                "Resizing flock buffers from {} to {} capacity.",
                self.agents.capacity(),
                new_capacity
            );
            self.agents.reserve_exact(new_capacity - self.agents.len());
            self.steering_out.reserve_exact(new_capacity.saturating_sub(self.steering_out.len()));
        }
    }

    /// Appends a new agent with zero acceleration and returns its fresh id.
    pub fn add_agent(&mut self, position: Vector2, velocity: Vector2, sprite_index: u32) -> AgentId {
        self.ensure_capacity(self.agents.len() + 1);
        let id = AgentId(self.next_id);
        self.next_id += 1;
        self.agents.push(Agent::new(id, sprite_index, position, velocity));
        id
    }

    /// Insertion index of `id`, if it is in the flock.
    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        self.agents.binary_search_by_key(&id, |a| a.id).ok()
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.index_of(id).map(|idx| &self.agents[idx])
    }
}
