//! Separation, alignment and cohesion steering for a single agent.

use flock_common::sim_params::{
    ALIGNMENT_STEER_LIMIT, COHESION_STEER_LIMIT, COINCIDENCE_EPS, RESPONSE_DAMPING,
    SEPARATION_STEER_LIMIT,
};
use flock_common::{Agent, CoincidencePolicy, Factors, FlockConfig, Vector2};

/// The steering contributions acting on one agent for one tick, before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Steering {
    pub separation: Vector2,
    pub alignment: Vector2,
    pub cohesion: Vector2,
    /// Pull toward the configured center, already scaled by the attraction weight.
    pub center: Vector2,
    pub separation_neighbors: u32,
    pub alignment_neighbors: u32,
    pub cohesion_neighbors: u32,
}

impl Steering {
    /// Weighted sum of every term, damped by the response gain.
    pub fn acceleration(&self, factors: &Factors) -> Vector2 {
        let total = self.center
            + self.separation.scaled(factors.separation)
            + self.alignment.scaled(factors.alignment)
            + self.cohesion.scaled(factors.cohesion);
        total.scaled(RESPONSE_DAMPING)
    }
}

/// Desired velocity along `direction` at full speed, minus the current velocity, clamped to `limit`.
/// Zero when `direction` has no length or no finite heading.
fn steer_toward(direction: Vector2, velocity: Vector2, max_speed: f64, limit: f64) -> Vector2 {
    match direction.with_len(max_speed).filter(Vector2::is_finite) {
        Some(desired) => desired.sub(velocity).limit(limit),
        None => Vector2::zero(),
    }
}

/// Evaluates the three local rules and the center pull for `agents[idx]`.
///
/// `neighbors` yields indices of the other agents to consider, in ascending order; agents
/// outside every perception radius may be included and are ignored.
pub fn compute_steering<I>(idx: usize, agents: &[Agent], neighbors: I, params: &FlockConfig) -> Steering
where
    I: IntoIterator<Item = usize>,
{
    let boid = &agents[idx];
    let mut steering = Steering::default();
    let mut separation_sum = Vector2::zero();
    let mut alignment_sum = Vector2::zero();
    let mut cohesion_sum = Vector2::zero();

    for other_idx in neighbors {
        if other_idx == idx {
            continue;
        }
        let other = &agents[other_idx];
        let diff = boid.position.sub(other.position);
        let d = diff.len();

        if d < params.separation_perception {
            if let Some(push) = separation_push(boid, other, diff, d, params.coincidence) {
                steering.separation_neighbors += 1;
                separation_sum = separation_sum.add(push);
            }
        }

        if d < params.alignment_perception {
            steering.alignment_neighbors += 1;
            alignment_sum = alignment_sum.add(other.velocity);
        }

        if d < params.cohesion_perception {
            steering.cohesion_neighbors += 1;
            cohesion_sum = cohesion_sum.add(other.position);
        }
    }

    if steering.separation_neighbors > 0 {
        steering.separation =
            steer_toward(separation_sum, boid.velocity, params.max_speed, SEPARATION_STEER_LIMIT);
    }

    if steering.alignment_neighbors > 0 {
        steering.alignment =
            steer_toward(alignment_sum, boid.velocity, params.max_speed, ALIGNMENT_STEER_LIMIT);
    }

    if steering.cohesion_neighbors > 0 {
        let centroid = cohesion_sum.scaled(1.0 / steering.cohesion_neighbors as f64);
        steering.cohesion = steer_toward(
            centroid.sub(boid.position),
            boid.velocity,
            params.max_speed,
            COHESION_STEER_LIMIT,
        );
    }

    let attraction = params.effective_center_attraction();
    if attraction != 0.0 {
        steering.center = params.center.sub(boid.position).scaled(attraction / 100.0);
    }

    steering
}

/// Inverse-square push away from `other`. `None` when the pair coincides and the policy skips it.
///
/// Distances below [`COINCIDENCE_EPS`] count as coincident under either policy.
fn separation_push(
    boid: &Agent,
    other: &Agent,
    diff: Vector2,
    d: f64,
    policy: CoincidencePolicy,
) -> Option<Vector2> {
    match policy {
        CoincidencePolicy::Skip => (d >= COINCIDENCE_EPS).then(|| diff.scaled(1.0 / (d * d))),
        CoincidencePolicy::MinDistance(eps) => {
            let eps = eps.max(COINCIDENCE_EPS);
            if d >= eps {
                Some(diff.scaled(1.0 / (d * d)))
            } else if d >= COINCIDENCE_EPS {
                Some(diff.scaled(1.0 / (d * eps)))
            } else {
                let away = if boid.id < other.id { 1.0 } else { -1.0 };
                Some(Vector2::new(away / eps, 0.0))
            }
        }
    }
}
