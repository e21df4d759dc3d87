use crate::vecmath::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Magnitude clamp applied to the separation steering vector.
pub const SEPARATION_STEER_LIMIT: f64 = 1.25;
/// Magnitude clamp applied to the alignment steering vector.
pub const ALIGNMENT_STEER_LIMIT: f64 = 1.0;
/// Magnitude clamp applied to the cohesion steering vector.
pub const COHESION_STEER_LIMIT: f64 = 0.85;
/// Gain applied to the summed acceleration every tick.
pub const RESPONSE_DAMPING: f64 = 0.3;
/// Neighbors closer than this count as coincident for separation. Keeps `1/d²` finite.
pub const COINCIDENCE_EPS: f64 = 1e-9;

/// The three user-adjustable rule weights.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factors {
    pub alignment: f64,
    pub cohesion: f64,
    pub separation: f64,
}

impl Factors {
    pub const fn new(alignment: f64, cohesion: f64, separation: f64) -> Self {
        Factors { alignment, cohesion, separation }
    }
}

impl Default for Factors {
    fn default() -> Self {
        Factors::new(4.0, 3.0, 7.0)
    }
}

// Overlay text, one weight per line.
impl fmt::Display for Factors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A: {:.2}\nC: {:.2}\nS: {:.2}", self.alignment, self.cohesion, self.separation)
    }
}

/// What separation does with a neighbor at exactly the same position.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoincidencePolicy {
    /// The coincident neighbor does not count toward separation this tick.
    Skip,
    /// Distances are clamped up to this value. Coincident pairs split along the x axis,
    /// the lower id toward +x.
    MinDistance(f64),
}

impl Default for CoincidencePolicy {
    fn default() -> Self {
        CoincidencePolicy::Skip
    }
}

/// Flocking tunables read by the simulation every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlockConfig {
    pub factors: Factors,
    pub enable_center_attraction: bool,
    /// Percent of the offset to `center` added to acceleration each tick.
    pub center_attraction: f64,
    pub center: Vector2,

    // Perception radii
    pub separation_perception: f64,
    pub alignment_perception: f64,
    pub cohesion_perception: f64,

    // Speed clamp
    pub min_speed: f64,
    pub max_speed: f64,

    pub coincidence: CoincidencePolicy,
}

impl Default for FlockConfig {
    fn default() -> Self {
        FlockConfig {
            factors: Factors::default(),
            enable_center_attraction: true,
            center_attraction: 0.2,
            center: Vector2::zero(),
            separation_perception: 70.0,
            alignment_perception: 250.0,
            cohesion_perception: 200.0,
            min_speed: 20.0,
            max_speed: 300.0,
            coincidence: CoincidencePolicy::Skip,
        }
    }
}

impl FlockConfig {
    /// Weights of the classic variant, without the pull toward the center.
    pub fn classic() -> Self {
        FlockConfig {
            factors: Factors::new(1.0, 1.0, 1.5),
            enable_center_attraction: false,
            ..FlockConfig::default()
        }
    }

    /// The largest radius any rule senses at. Sizes grid cells.
    pub fn max_perception(&self) -> f64 {
        self.separation_perception
            .max(self.alignment_perception)
            .max(self.cohesion_perception)
    }

    /// Center attraction weight actually applied, zero when the term is disabled.
    pub fn effective_center_attraction(&self) -> f64 {
        if self.enable_center_attraction {
            self.center_attraction
        } else {
            0.0
        }
    }
}
