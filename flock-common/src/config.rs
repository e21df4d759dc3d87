use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::{CoincidencePolicy, Factors, FlockConfig};
use crate::vecmath::{Vector2, WorldBounds};
use std::path::Path;

// Viewport the initial flock is scattered over, centered on the origin
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
}

// Initial population, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FlockSetup {
    pub num_boids: u32,
    #[serde(default = "default_sprite_variants")]
    pub sprite_variants: u32,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RulePreset {
    /// Strong separation with a weak pull toward the origin.
    Primary,
    /// Reynolds-style weights, no center attraction.
    Classic,
}

// Rule weights and radii. Anything left out falls back to the preset.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct RulesConfig {
    #[serde(default)]
    pub preset: Option<RulePreset>,
    pub separation_factor: Option<f64>,
    pub alignment_factor: Option<f64>,
    pub cohesion_factor: Option<f64>,
    pub center_attraction: Option<f64>,
    pub enable_center_attraction: Option<bool>,
    pub separation_perception: Option<f64>,
    pub alignment_perception: Option<f64>,
    pub cohesion_perception: Option<f64>,
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub coincidence: Option<CoincidencePolicy>,
}

// Fixed-step timing for the headless run
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    /// Integration step passed to every tick.
    pub dt: f64,
    pub total_steps: u64,
    #[serde(default = "default_record_interval_steps")]
    pub record_interval_steps: u64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NeighborStrategy {
    /// Every agent against every other agent.
    #[default]
    BruteForce,
    /// Uniform grid sized to the largest perception radius. Same results, fewer distance checks.
    Grid,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NeighborConfig {
    #[serde(default)]
    pub strategy: NeighborStrategy,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        NeighborConfig {
            strategy: NeighborStrategy::BruteForce,
            parallel: default_parallel(),
        }
    }
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_positions: bool,
    pub save_stats: bool,
    #[serde(default)]
    pub save_agents_in_snapshot: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

/// Scripted input, applied before the tick numbered `step` runs.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlEvent {
    Spawn {
        step: u64,
        position: Vector2,
        #[serde(default)]
        velocity: Option<Vector2>,
        #[serde(default)]
        sprite_index: Option<u32>,
    },
    SetFactors {
        step: u64,
        alignment: f64,
        cohesion: f64,
        separation: f64,
    },
}

impl ControlEvent {
    pub fn step(&self) -> u64 {
        match self {
            ControlEvent::Spawn { step, .. } | ControlEvent::SetFactors { step, .. } => *step,
        }
    }
}

// Default functions
fn default_sprite_variants() -> u32 {
    1
}

fn default_record_interval_steps() -> u64 {
    1
}

fn default_parallel() -> bool {
    true
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub flock: FlockSetup,
    #[serde(default)]
    pub rules: RulesConfig,
    pub timing: TimingConfig,
    #[serde(default)]
    pub neighbors: NeighborConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub events: Vec<ControlEvent>,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.world.width > 0.0 && self.world.height > 0.0) {
            anyhow::bail!("world width and height must be positive.");
        }
        if self.flock.sprite_variants == 0 {
            anyhow::bail!("sprite_variants must be greater than 0.");
        }
        if !(self.timing.dt > 0.0) || !self.timing.dt.is_finite() {
            anyhow::bail!("dt must be a positive finite number.");
        }

        let params = self.flock_config();
        if params.min_speed < 0.0 || params.min_speed > params.max_speed {
            anyhow::bail!(
                "speed range [{}, {}] is invalid; need 0 <= min_speed <= max_speed.",
                params.min_speed,
                params.max_speed
            );
        }
        for (name, radius) in [
            ("separation_perception", params.separation_perception),
            ("alignment_perception", params.alignment_perception),
            ("cohesion_perception", params.cohesion_perception),
        ] {
            if radius < 0.0 || !radius.is_finite() {
                anyhow::bail!("{} must be a non-negative finite radius.", name);
            }
        }
        if let CoincidencePolicy::MinDistance(eps) = params.coincidence {
            if !(eps > 0.0) {
                anyhow::bail!("coincidence min_distance must be positive.");
            }
        }
        Ok(())
    }

    /// Converts the configuration into the tunables the simulation reads every tick.
    pub fn flock_config(&self) -> FlockConfig {
        let rules = &self.rules;
        let base = match rules.preset.unwrap_or(RulePreset::Primary) {
            RulePreset::Primary => FlockConfig::default(),
            RulePreset::Classic => FlockConfig::classic(),
        };

        FlockConfig {
            factors: Factors {
                alignment: rules.alignment_factor.unwrap_or(base.factors.alignment),
                cohesion: rules.cohesion_factor.unwrap_or(base.factors.cohesion),
                separation: rules.separation_factor.unwrap_or(base.factors.separation),
            },
            enable_center_attraction: rules
                .enable_center_attraction
                .unwrap_or(base.enable_center_attraction),
            center_attraction: rules.center_attraction.unwrap_or(base.center_attraction),
            center: base.center,
            separation_perception: rules.separation_perception.unwrap_or(base.separation_perception),
            alignment_perception: rules.alignment_perception.unwrap_or(base.alignment_perception),
            cohesion_perception: rules.cohesion_perception.unwrap_or(base.cohesion_perception),
            min_speed: rules.min_speed.unwrap_or(base.min_speed),
            max_speed: rules.max_speed.unwrap_or(base.max_speed),
            coincidence: rules.coincidence.unwrap_or(base.coincidence),
        }
    }

    /// Spawn area for the initial flock.
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::centered(self.world.width, self.world.height)
    }
}
