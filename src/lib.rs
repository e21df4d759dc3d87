//! Flocking simulation core: agents steered by separation, alignment and cohesion,
//! with a weak pull toward a fixed center, advanced one tick at a time.

pub mod control;
pub mod flock_state;
pub mod grid;
pub mod output;
pub mod rules;
pub mod simulation;

#[cfg(test)]
mod tests;

pub use control::FactorControl;
pub use rules::Steering;
pub use simulation::FlockSimulation;
