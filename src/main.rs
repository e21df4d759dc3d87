use anyhow::Result;
use clap::Parser;
use flock_common::SimulationConfig;
use flock_engine::output::{write_final_positions, write_snapshots};
use flock_engine::FlockSimulation;
use log::{debug, info, trace, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Headless flocking run: loads a config, advances the flock and writes snapshots.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of boids (overrides flock.num_boids)
    #[arg(long)]
    boids: Option<u32>,

    /// Number of ticks to run (overrides timing.total_steps)
    #[arg(long)]
    steps: Option<u64>,

    /// RNG seed for initial placement (overrides flock.seed)
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    separation_factor: Option<f64>,

    #[arg(long)]
    alignment_factor: Option<f64>,

    #[arg(long)]
    cohesion_factor: Option<f64>,

    /// Pull toward the origin, in percent of the offset per tick
    #[arg(long)]
    center_attraction: Option<f64>,
}

impl Args {
    fn apply_overrides(&self, config: &mut SimulationConfig) -> Result<()> {
        if let Some(boids) = self.boids {
            config.flock.num_boids = boids;
        }
        if let Some(steps) = self.steps {
            config.timing.total_steps = steps;
        }
        if let Some(seed) = self.seed {
            config.flock.seed = seed;
        }
        let rules = &mut config.rules;
        rules.separation_factor = self.separation_factor.or(rules.separation_factor);
        rules.alignment_factor = self.alignment_factor.or(rules.alignment_factor);
        rules.cohesion_factor = self.cohesion_factor.or(rules.cohesion_factor);
        if self.center_attraction.is_some() {
            rules.center_attraction = self.center_attraction;
            rules.enable_center_attraction = Some(true);
        }
        config.validate()
    }
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting flocking engine...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    args.apply_overrides(&mut config)?;

    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // --- Initialize Simulation ---
    let mut sim = FlockSimulation::from_config(&config)?;
    debug!("Flock parameters: {:#?}", sim.config()); // More detailed params at debug level
    info!("Rule weights:\n{}", sim.factors());

    // --- Simulation Loop ---
    let dt = config.timing.dt;
    let total_steps = config.timing.total_steps;
    let mut record_interval_steps = config.timing.record_interval_steps;
    if record_interval_steps == 0 {
        warn!("Record interval is 0 steps. Recording every step.");
        record_interval_steps = 1;
    }
    let with_agents = config.output.save_agents_in_snapshot;

    let mut events = config.events.clone();
    events.sort_by_key(|e| e.step());
    let mut next_event = 0;

    info!("Starting simulation loop for {} steps (dt = {})...", total_steps, dt);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    sim.record_snapshot(with_agents);

    for step in 0..total_steps {
        while next_event < events.len() && events[next_event].step() <= sim.current_step() {
            sim.apply_event(&events[next_event])?;
            next_event += 1;
        }

        let step_start_time = Instant::now();
        sim.step(dt);
        let step_duration = step_start_time.elapsed();

        let current_time = Instant::now();
        let should_print_status = current_time.duration_since(previous_print_time).as_secs_f64() >= 5.0;
        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step + 1 == total_steps;

        if is_record_step || is_last_step {
            sim.record_snapshot(with_agents);
        }

        if should_print_status || is_last_step {
            info!(
                "Step [{}/{}] (t = {:.3}) | Agents: {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                sim.elapsed(),
                sim.len(),
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }
    if next_event < events.len() {
        warn!("{} scripted events were scheduled past the last step and never ran.", events.len() - next_event);
    }

    let total_duration = start_time.elapsed();
    info!("Simulation finished in {:.3} seconds.", total_duration.as_secs_f64());

    // --- Save Recorded Data ---
    if config.output.save_stats {
        write_snapshots(sim.get_recorded_snapshots(), &config.output)?;
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if config.output.save_positions {
        let path = PathBuf::from(format!("{}_final_positions.csv", config.output.base_filename));
        write_final_positions(sim.agents(), &path)?;
        info!("Final positions saved to {}", path.display());
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
