//! Behavioral tests for the flock as a whole: speed clamp, isolation, symmetry,
//! determinism and the reference scenarios.

use crate::simulation::FlockSimulation;
use flock_common::{FlockConfig, NeighborStrategy, Vector2, WorldBounds};

const DT: f64 = 0.01;
const EPS: f64 = 1e-9;

fn random_flock(count: usize, seed: u64) -> FlockSimulation {
    FlockSimulation::initialize(count, WorldBounds::centered(1920.0, 1080.0), 16, FlockConfig::default(), seed)
        .expect("valid bounds")
}

fn pair_at_rest() -> FlockSimulation {
    let mut sim = FlockSimulation::new(FlockConfig::default(), 0);
    sim.add_agent(Vector2::new(0.0, 0.0), Vector2::zero(), 0);
    sim.add_agent(Vector2::new(10.0, 0.0), Vector2::zero(), 1);
    sim
}

// ---- Invariants ----

#[test]
fn test_speed_stays_within_clamp_every_step() {
    let mut sim = random_flock(120, 11);
    let (min, max) = (sim.config().min_speed, sim.config().max_speed);
    for _ in 0..200 {
        sim.step(DT);
        for agent in sim.agents() {
            let speed = agent.speed();
            assert!(speed >= min - EPS && speed <= max + EPS, "speed {} out of range", speed);
        }
    }
}

#[test]
fn test_acceleration_is_reset_after_step() {
    let mut sim = random_flock(40, 5);
    sim.step(DT);
    assert!(sim.agents().iter().all(|a| a.acceleration == Vector2::zero()));
}

#[test]
fn test_position_advances_by_previous_velocity() {
    let mut sim = random_flock(30, 8);
    let before: Vec<_> = sim.agents().iter().map(|a| (a.position, a.velocity)).collect();
    sim.step(DT);
    for (agent, (p, v)) in sim.agents().iter().zip(before) {
        assert_eq!(agent.position, p + v.scaled(DT));
    }
    assert!((sim.elapsed() - DT).abs() < EPS);
}

// ---- Rule properties ----

#[test]
fn test_isolated_agent_gets_only_the_damped_center_pull() {
    let mut sim = FlockSimulation::new(FlockConfig::default(), 0);
    let id = sim.add_agent(Vector2::new(400.0, -300.0), Vector2::new(50.0, 0.0), 0);
    sim.evaluate_rules();
    let expected = Vector2::new(-400.0, 300.0).scaled(0.2 / 100.0).scaled(0.3);
    let acc = sim.agent(id).unwrap().acceleration;
    assert!((acc - expected).len() < EPS);

    let mut classic = FlockSimulation::new(FlockConfig::classic(), 0);
    let id = classic.add_agent(Vector2::new(400.0, -300.0), Vector2::new(50.0, 0.0), 0);
    classic.evaluate_rules();
    assert_eq!(classic.agent(id).unwrap().acceleration, Vector2::zero());
}

#[test]
fn test_separation_is_antisymmetric() {
    let sim = pair_at_rest();
    let a = sim.steering_of(0).unwrap();
    let b = sim.steering_of(1).unwrap();
    assert_eq!(a.separation_neighbors, 1);
    assert!(a.separation.x < 0.0);
    assert_eq!(b.separation, -a.separation);
    assert!(sim.steering_of(2).is_none());
}

#[test]
fn test_cohesion_points_toward_centroid() {
    let mut sim = FlockSimulation::new(FlockConfig::default(), 0);
    for p in [(0.0, 0.0), (100.0, 20.0), (-40.0, 120.0), (80.0, -60.0)] {
        sim.add_agent(Vector2::new(p.0, p.1), Vector2::zero(), 0);
    }
    let s = sim.steering_of(0).unwrap();
    assert_eq!(s.cohesion_neighbors, 3);
    let centroid = Vector2::new(140.0 / 3.0, 80.0 / 3.0);
    let toward = centroid.unit().unwrap();
    let got = s.cohesion.unit().unwrap();
    assert!((got - toward).len() < 1e-9);
}

#[test]
fn test_nearly_coincident_pair_keeps_speed_clamp() {
    let mut sim = FlockSimulation::new(FlockConfig::default(), 0);
    sim.add_agent(Vector2::new(0.0, 0.0), Vector2::new(50.0, 0.0), 0);
    sim.add_agent(Vector2::new(1e-160, 1e-160), Vector2::new(50.0, 0.0), 0);
    let (min, max) = (sim.config().min_speed, sim.config().max_speed);
    for _ in 0..3 {
        sim.step(DT);
        for agent in sim.agents() {
            let speed = agent.speed();
            assert!(speed >= min - EPS && speed <= max + EPS, "speed {} out of range", speed);
        }
    }
}

// ---- Determinism ----

#[test]
fn test_same_seed_same_trajectory() {
    let mut a = random_flock(80, 1234);
    let mut b = random_flock(80, 1234);
    for _ in 0..150 {
        a.step(DT);
        b.step(DT);
    }
    assert_eq!(a.agents(), b.agents());
}

#[test]
fn test_grid_matches_brute_force() {
    let mut brute = random_flock(150, 77);
    let mut grid = random_flock(150, 77).with_neighbor_strategy(NeighborStrategy::Grid);
    for _ in 0..100 {
        brute.step(DT);
        grid.step(DT);
    }
    assert_eq!(brute.agents(), grid.agents());
}

#[test]
fn test_parallel_matches_sequential() {
    let mut sequential = random_flock(150, 31);
    let mut parallel = random_flock(150, 31).with_parallel(true);
    let mut parallel_grid = random_flock(150, 31)
        .with_parallel(true)
        .with_neighbor_strategy(NeighborStrategy::Grid);
    for _ in 0..100 {
        sequential.step(DT);
        parallel.step(DT);
        parallel_grid.step(DT);
    }
    assert_eq!(sequential.agents(), parallel.agents());
    assert_eq!(sequential.agents(), parallel_grid.agents());
}

#[test]
fn test_result_does_not_depend_on_insertion_order() {
    let positions = [(0.0, 0.0), (30.0, 5.0), (-20.0, 40.0)];
    let velocities = [(25.0, 0.0), (0.0, 25.0), (-25.0, 10.0)];

    let mut forward = FlockSimulation::new(FlockConfig::default(), 0);
    for (p, v) in positions.iter().zip(&velocities) {
        forward.add_agent(Vector2::new(p.0, p.1), Vector2::new(v.0, v.1), 0);
    }
    let mut reversed = FlockSimulation::new(FlockConfig::default(), 0);
    for (p, v) in positions.iter().zip(&velocities).rev() {
        reversed.add_agent(Vector2::new(p.0, p.1), Vector2::new(v.0, v.1), 0);
    }
    forward.step(DT);
    reversed.step(DT);

    for (i, agent) in forward.agents().iter().enumerate() {
        let twin = &reversed.agents()[positions.len() - 1 - i];
        assert!((agent.position - twin.position).len() < 1e-9);
        assert!((agent.velocity - twin.velocity).len() < 1e-9);
    }
}

// ---- Reference scenarios ----

#[test]
fn test_pair_at_rest_repels() {
    let mut sim = pair_at_rest();
    sim.step(DT);
    let min = sim.config().min_speed;
    let (a, b) = (&sim.agents()[0], &sim.agents()[1]);
    assert!(a.velocity.x < 0.0);
    assert!(b.velocity.x > 0.0);
    assert!(a.speed() >= min - EPS);
    assert!(b.speed() >= min - EPS);
}

#[test]
fn test_lone_agent_keeps_velocity_without_steering() {
    let config = FlockConfig {
        enable_center_attraction: false,
        ..FlockConfig::default()
    };
    let mut sim = FlockSimulation::new(config, 0);
    sim.set_factors(0.0, 0.0, 0.0);
    let id = sim.add_agent(Vector2::new(0.0, 0.0), Vector2::new(250.0, 0.0), 0);
    sim.step(DT);
    let agent = sim.agent(id).unwrap();
    assert_eq!(agent.velocity, Vector2::new(250.0, 0.0));
    assert_eq!(agent.position, Vector2::new(2.5, 0.0));
}

#[test]
fn test_zero_factors_leave_only_the_center_term() {
    let mut sim = random_flock(60, 21);
    sim.set_factors(0.0, 0.0, 0.0);
    sim.evaluate_rules();
    for agent in sim.agents() {
        let expected = Vector2::zero()
            .sub(agent.position)
            .scaled(0.2 / 100.0)
            .scaled(0.3);
        assert_eq!(agent.acceleration, expected);
    }

    let mut no_center = random_flock(60, 21);
    no_center.config_mut().enable_center_attraction = false;
    no_center.set_factors(0.0, 0.0, 0.0);
    no_center.evaluate_rules();
    assert!(no_center.agents().iter().all(|a| a.acceleration == Vector2::zero()));
}

// ---- Runtime control ----

#[test]
fn test_factor_control_applies_at_next_tick() {
    let mut sim = random_flock(10, 2);
    let handle = sim.control_handle();
    handle.request(flock_common::Factors::new(0.5, 0.25, 9.0));
    assert_eq!(sim.factors(), flock_common::Factors::default());
    sim.step(DT);
    assert_eq!(sim.factors(), flock_common::Factors::new(0.5, 0.25, 9.0));
    assert!(!handle.has_pending());
}

#[test]
fn test_spawned_agent_joins_the_flock() {
    let mut sim = pair_at_rest();
    let id = sim.add_agent(Vector2::new(5.0, 30.0), Vector2::new(0.0, 40.0), 3);
    assert_eq!(sim.len(), 3);
    let s = sim.steering_of(0).unwrap();
    assert_eq!(s.separation_neighbors, 2);
    sim.step(DT);
    let spawned = sim.agent(id).unwrap();
    assert_eq!(spawned.sprite_index, 3);
    assert_eq!(spawned.acceleration, Vector2::zero());
}

#[test]
fn test_scripted_events() {
    use flock_common::ControlEvent;
    let mut sim = pair_at_rest();
    sim.apply_event(&ControlEvent::SetFactors { step: 0, alignment: 1.0, cohesion: 2.0, separation: 3.0 })
        .unwrap();
    assert_eq!(sim.factors(), flock_common::Factors::new(1.0, 2.0, 3.0));
    sim.apply_event(&ControlEvent::Spawn {
        step: 0,
        position: Vector2::new(-50.0, 0.0),
        velocity: None,
        sprite_index: None,
    })
    .unwrap();
    assert_eq!(sim.len(), 3);
}

#[test]
fn test_non_finite_state_does_not_panic() {
    let mut sim = random_flock(20, 4).with_neighbor_strategy(NeighborStrategy::Grid);
    sim.add_agent(Vector2::new(f64::NAN, 0.0), Vector2::new(30.0, 0.0), 0);
    sim.set_factors(f64::INFINITY, 1.0, 1.0);
    for _ in 0..5 {
        sim.step(DT);
    }
    sim.step(f64::NAN);
    assert_eq!(sim.current_step(), 6);
}

#[test]
fn test_recorded_snapshots() {
    let mut sim = random_flock(25, 9);
    sim.record_snapshot(false);
    sim.step(DT);
    sim.record_snapshot(true);
    let snaps = sim.get_recorded_snapshots();
    assert_eq!(snaps.len(), 2);
    assert_eq!(snaps[0].step, 0);
    assert_eq!(snaps[1].step, 1);
    assert!(snaps[0].agents.is_none());
    assert_eq!(snaps[1].agents.as_ref().map(Vec::len), Some(25));
    assert!(snaps[1].mean_speed >= 20.0 - EPS);
}
