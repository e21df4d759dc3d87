use crate::control::FactorControl;
use crate::flock_state::FlockState;
use crate::grid::NeighborGrid;
use crate::rules::{compute_steering, Steering};
use anyhow::Result;
use flock_common::{
    Agent, AgentId, ControlEvent, Factors, FlockConfig, NeighborStrategy, SimulationConfig,
    Snapshot, Vector2, WorldBounds,
};
use log::{debug, info, warn};
use rand::distr::Uniform;
use rand::prelude::*;
use rayon::prelude::*;

/// Per-axis range initial and spawned velocities are drawn from.
const INITIAL_VELOCITY_RANGE: f64 = 100.0;

/// Owns the flock and advances it one tick at a time.
pub struct FlockSimulation {
    /// Tunables read every tick. Mutated only between ticks.
    config: FlockConfig,
    /// The agents plus the per-tick steering buffer.
    state: FlockState,
    /// RNG for initial placement and spawned agents' defaults.
    rng: StdRng,
    sprite_variants: u32,
    current_step: u64,
    /// Sum of every dt integrated so far.
    elapsed: f64,
    strategy: NeighborStrategy,
    parallel: bool,
    grid: NeighborGrid,
    control: Option<FactorControl>,
    /// Stores collected snapshots at record intervals.
    recorded_snapshots: Vec<Snapshot>,
}

impl FlockSimulation {
    /// Creates an empty flock. Agents can be added with [`FlockSimulation::add_agent`].
    pub fn new(config: FlockConfig, seed: u64) -> Self {
        Self {
            config,
            state: FlockState::default(),
            rng: StdRng::seed_from_u64(seed),
            sprite_variants: 1,
            current_step: 0,
            elapsed: 0.0,
            strategy: NeighborStrategy::BruteForce,
            parallel: false,
            grid: NeighborGrid::new(),
            control: None,
            recorded_snapshots: Vec::new(),
        }
    }

    /// Populates `agent_count` agents uniformly inside `bounds`, with velocities in
    /// [-100, 100] per axis, zero acceleration and a random sprite in `0..sprite_variants`.
    pub fn initialize(
        agent_count: usize,
        bounds: WorldBounds,
        sprite_variants: u32,
        config: FlockConfig,
        seed: u64,
    ) -> Result<Self> {
        if sprite_variants == 0 {
            anyhow::bail!("sprite_variants must be greater than 0.");
        }
        let mut sim = Self::new(config, seed);
        sim.sprite_variants = sprite_variants;
        sim.state = FlockState::with_capacity(agent_count);

        let x_dist = Uniform::new_inclusive(bounds.min.x, bounds.max.x)?;
        let y_dist = Uniform::new_inclusive(bounds.min.y, bounds.max.y)?;
        for _ in 0..agent_count {
            let position = Vector2::new(sim.rng.sample(x_dist), sim.rng.sample(y_dist));
            let velocity = sim.random_velocity()?;
            let sprite = sim.random_sprite();
            sim.state.add_agent(position, velocity, sprite);
        }
        debug!("Initialized {} agents inside {:?}", agent_count, bounds);

        Ok(sim)
    }

    /// Builds the simulation described by a loaded configuration file.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let sim = Self::initialize(
            config.flock.num_boids as usize,
            config.bounds(),
            config.flock.sprite_variants,
            config.flock_config(),
            config.flock.seed,
        )?
        .with_neighbor_strategy(config.neighbors.strategy)
        .with_parallel(config.neighbors.parallel);
        info!(
            "Flock ready: {} agents, {:?} neighbor search, parallel = {}",
            sim.len(),
            sim.strategy,
            sim.parallel
        );
        Ok(sim)
    }

    pub fn with_neighbor_strategy(mut self, strategy: NeighborStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn random_velocity(&mut self) -> Result<Vector2> {
        let dist = Uniform::new_inclusive(-INITIAL_VELOCITY_RANGE, INITIAL_VELOCITY_RANGE)?;
        Ok(Vector2::new(self.rng.sample(dist), self.rng.sample(dist)))
    }

    fn random_sprite(&mut self) -> u32 {
        self.rng.random_range(0..self.sprite_variants.max(1))
    }

    /// Advances every agent by one tick: rules, then integration with `dt`.
    pub fn step(&mut self, dt: f64) {
        self.apply_pending_control();
        self.evaluate_rules();
        self.integrate(dt);
        self.current_step += 1;
    }

    /// Computes this tick's acceleration for every agent from a frozen view of the flock.
    ///
    /// Each agent's neighbors are visited in insertion order whatever the strategy, so
    /// brute force, grid, sequential and parallel evaluation all give identical results.
    pub fn evaluate_rules(&mut self) {
        let n = self.state.agents.len();
        if n == 0 {
            return;
        }
        if self.strategy == NeighborStrategy::Grid {
            self.grid.rebuild(&self.state.agents, self.config.max_perception());
        }

        let agents = &self.state.agents;
        let params = &self.config;
        let grid = &self.grid;
        let strategy = self.strategy;
        let steering_out = &mut self.state.steering_out;
        steering_out.clear();
        steering_out.resize(n, Vector2::zero());

        let eval = |idx: usize, scratch: &mut Vec<usize>| -> Vector2 {
            steering_with(idx, agents, params, strategy, grid, scratch).acceleration(&params.factors)
        };

        if self.parallel {
            steering_out
                .par_iter_mut()
                .enumerate()
                .for_each_init(Vec::new, |scratch, (idx, out)| *out = eval(idx, scratch));
        } else {
            let mut scratch = Vec::new();
            for (idx, out) in steering_out.iter_mut().enumerate() {
                *out = eval(idx, &mut scratch);
            }
        }

        for (agent, steering) in self.state.agents.iter_mut().zip(&self.state.steering_out) {
            agent.acceleration += *steering;
        }
    }

    /// Moves every agent by `velocity * dt`, applies acceleration, clamps speed into
    /// `[min_speed, max_speed]` and resets acceleration.
    pub fn integrate(&mut self, dt: f64) {
        if !dt.is_finite() {
            warn!("Integrating with non-finite dt {} at step {}", dt, self.current_step);
        }
        let (min_speed, max_speed) = (self.config.min_speed, self.config.max_speed);
        for agent in &mut self.state.agents {
            agent.position = agent.position.add(agent.velocity.scaled(dt));
            let previous = agent.velocity;
            agent.velocity = maintain_speed(agent.velocity.add(agent.acceleration), previous, min_speed, max_speed);
            agent.acceleration = Vector2::zero();
        }
        self.elapsed += dt;
    }

    /// Appends an agent with zero acceleration. No upper bound on flock size.
    pub fn add_agent(&mut self, position: Vector2, velocity: Vector2, sprite_index: u32) -> AgentId {
        self.state.add_agent(position, velocity, sprite_index)
    }

    /// Appends an agent at `position` with the same random velocity and sprite an initial agent gets.
    pub fn spawn_at(&mut self, position: Vector2) -> Result<AgentId> {
        let velocity = self.random_velocity()?;
        let sprite = self.random_sprite();
        Ok(self.add_agent(position, velocity, sprite))
    }

    /// Replaces the three rule weights. Any value is accepted; negative weights invert a rule.
    pub fn set_factors(&mut self, alignment: f64, cohesion: f64, separation: f64) {
        self.config.factors = Factors::new(alignment, cohesion, separation);
    }

    pub fn factors(&self) -> Factors {
        self.config.factors
    }

    /// Handle for changing weights from another thread. Requests land at the next tick.
    pub fn control_handle(&mut self) -> FactorControl {
        self.control.get_or_insert_with(FactorControl::new).clone()
    }

    fn apply_pending_control(&mut self) {
        if let Some(factors) = self.control.as_ref().and_then(FactorControl::take) {
            debug!("Applying factor update at step {}: {:?}", self.current_step, factors);
            self.config.factors = factors;
        }
    }

    /// Applies one scripted input event immediately.
    pub fn apply_event(&mut self, event: &ControlEvent) -> Result<()> {
        match *event {
            ControlEvent::Spawn { position, velocity, sprite_index, .. } => {
                let velocity = match velocity {
                    Some(v) => v,
                    None => self.random_velocity()?,
                };
                let sprite = sprite_index.unwrap_or_else(|| self.random_sprite());
                let id = self.add_agent(position, velocity, sprite);
                debug!("Spawned agent {} at {} (step {})", id, position, self.current_step);
            }
            ControlEvent::SetFactors { alignment, cohesion, separation, .. } => {
                self.set_factors(alignment, cohesion, separation);
                debug!("Factors set at step {}:\n{}", self.current_step, self.factors());
            }
        }
        Ok(())
    }

    /// Rule breakdown for the agent at insertion index `idx`, computed against the current flock.
    pub fn steering_of(&self, idx: usize) -> Option<Steering> {
        let n = self.state.agents.len();
        (idx < n).then(|| {
            compute_steering(idx, &self.state.agents, (0..n).filter(|&j| j != idx), &self.config)
        })
    }

    /// Captures the flock's current metrics.
    pub fn snapshot(&self, with_agents: bool) -> Snapshot {
        Snapshot::capture(self.current_step, self.elapsed, self.config.factors, &self.state.agents, with_agents)
    }

    /// Collects a snapshot and stores it. Should be called at record intervals.
    pub fn record_snapshot(&mut self, with_agents: bool) {
        let snapshot = self.snapshot(with_agents);
        debug!(
            "Snapshot at step {}: {} agents, mean speed {:.2}, polarization {:.3}",
            snapshot.step, snapshot.agent_count, snapshot.mean_speed, snapshot.polarization
        );
        self.recorded_snapshots.push(snapshot);
    }

    pub fn get_recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    pub fn agents(&self) -> &[Agent] {
        &self.state.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.state.get(id)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Mutable access to the tunables. Only reachable between ticks.
    pub fn config_mut(&mut self) -> &mut FlockConfig {
        &mut self.config
    }

    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

fn steering_with(
    idx: usize,
    agents: &[Agent],
    params: &FlockConfig,
    strategy: NeighborStrategy,
    grid: &NeighborGrid,
    scratch: &mut Vec<usize>,
) -> Steering {
    match strategy {
        NeighborStrategy::BruteForce => {
            compute_steering(idx, agents, (0..agents.len()).filter(|&j| j != idx), params)
        }
        NeighborStrategy::Grid => {
            grid.candidates(idx, agents[idx].position, scratch);
            compute_steering(idx, agents, scratch.iter().copied(), params)
        }
    }
}

/// Rescales `velocity` into `[min_speed, max_speed]`.
///
/// A zero velocity keeps the heading of `previous`, or +x when that is zero too.
/// NaN passes through unchanged.
pub fn maintain_speed(velocity: Vector2, previous: Vector2, min_speed: f64, max_speed: f64) -> Vector2 {
    let speed = velocity.len();
    if speed < min_speed {
        let heading = velocity
            .unit()
            .or_else(|| previous.unit())
            .unwrap_or(Vector2::new(1.0, 0.0));
        heading.scaled(min_speed)
    } else if speed > max_speed {
        velocity.with_len(max_speed).unwrap_or(velocity)
    } else {
        velocity
    }
}
