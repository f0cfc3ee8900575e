use std::sync::Arc;

use approx::assert_relative_eq;
use ultraviolet::DVec3;

use crate::arrangement::{BodySpec, ExplicitBodies, RandomCloud, RandomCloudParams};
use crate::config::{CollisionModel, GravityModel, PhysicsConfiguration};
use crate::error::{ConfigError, SimulationError};
use crate::forces::GRAVITATIONAL_CONSTANT;
use crate::kernel::{NativeKernel, ReferenceKernel};
use crate::simulation::Simulation;

fn explicit(specs: Vec<BodySpec>) -> ExplicitBodies {
    ExplicitBodies::new(specs, 1.5, false).unwrap()
}

fn at(name: &str, mass: f64, radius: f64, x: f64, vx: f64) -> BodySpec {
    BodySpec::new(name, mass, radius, DVec3::new(x, 0.0, 0.0), DVec3::new(vx, 0.0, 0.0))
}

fn cloud(seed: u64) -> RandomCloud {
    let params = RandomCloudParams {
        count: 60,
        ..RandomCloudParams::default()
    };
    RandomCloud::new(params, Some(seed)).unwrap()
}

#[test]
fn test_single_step_matches_symplectic_euler() {
    let big = 1.0e20;
    let d = 1.0e5;
    let dt = 2.0;
    let arrangement = explicit(vec![at("probe", 1.0, 0.0, 0.0, 0.0), at("mass", big, 0.0, d, 0.0)]);
    let physics = PhysicsConfiguration::new(dt, GravityModel::NewtonPointlike, CollisionModel::None);
    let mut sim = Simulation::new(arrangement, physics).unwrap();

    sim.leap(1).unwrap();

    let probe = &sim.bodies()[0];
    let expected_v = dt * GRAVITATIONAL_CONSTANT * big / (d * d);
    assert_relative_eq!(probe.velocity.x, expected_v, max_relative = 1e-12);
    assert_relative_eq!(probe.position.x, dt * expected_v, max_relative = 1e-12);
    assert_eq!(sim.num_steps_performed(), 1);
    assert_eq!(sim.t(), dt);
}

#[test]
fn test_failure_halts_and_keeps_state() {
    let arrangement = explicit(vec![at("a", 1.0, 0.0, 5.0, 0.0), at("b", 1.0, 0.0, 5.0, 0.0)]);
    let mut sim = Simulation::new(arrangement, PhysicsConfiguration::default()).unwrap();
    let before = sim.bodies().to_vec();

    assert!(!sim.try_leap(5));
    assert!(sim.has_error());
    assert_eq!(sim.num_steps_performed(), 0);
    assert_eq!(sim.bodies(), &before[..]);
    assert!(sim.latest_error_message().unwrap().contains("non-finite"));

    assert!(matches!(sim.leap(1), Err(SimulationError::Halted { .. })));
    assert!(!sim.try_leap(1));
}

#[test]
fn test_leap_reports_step_failure() {
    let arrangement = explicit(vec![at("a", 1.0, 0.0, 0.0, 0.0), at("b", 1.0, 0.0, 0.0, 0.0)]);
    let mut sim = Simulation::new(arrangement, PhysicsConfiguration::default()).unwrap();

    match sim.leap(3) {
        Err(SimulationError::Step { step, .. }) => assert_eq!(step, 1),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_drag_never_bounces() {
    let arrangement = explicit(vec![at("a", 1.0e12, 1.0, 0.0, 1.0), at("b", 1.0e12, 1.0, 1.0, -1.0)]);
    let physics = PhysicsConfiguration::new(10.0, GravityModel::None, CollisionModel::Drag)
        .with_drag_coefficient(5.0);
    let mut sim = Simulation::new(arrangement, physics).unwrap();

    sim.leap(1).unwrap();
    let (a, b) = (&sim.bodies()[0], &sim.bodies()[1]);
    assert_relative_eq!(a.velocity.x, 0.0, epsilon = 1e-12);
    assert_relative_eq!(b.velocity.x, 0.0, epsilon = 1e-12);
    assert_relative_eq!(sim.total_momentum().x, 0.0, epsilon = 1e-3);

    sim.leap(5).unwrap();
    let (a, b) = (&sim.bodies()[0], &sim.bodies()[1]);
    assert!(a.velocity.x - b.velocity.x >= -1e-12);
}

#[test]
fn test_combine_merges_after_step() {
    let arrangement = explicit(vec![
        at("one", 1.0, 1.5, 0.0, 0.0),
        at("two", 2.0, 1.5, 1.0, 0.0),
        at("three", 3.0, 1.5, 2.0, 0.0),
    ]);
    let physics = PhysicsConfiguration::new(1.0, GravityModel::None, CollisionModel::Combine);
    let mut sim = Simulation::new(arrangement, physics).unwrap();

    sim.leap(1).unwrap();

    let existing: Vec<_> = sim.existing_bodies().collect();
    assert_eq!(existing.len(), 1);
    assert_eq!(existing[0].name, "three");
    assert_relative_eq!(existing[0].mass, 6.0);
    assert_relative_eq!(existing[0].position.x, 4.0 / 3.0, epsilon = 1e-12);
    assert_eq!(sim.bodies().len(), 3);
}

#[test]
fn test_massless_merge_fails_the_step() {
    let arrangement = explicit(vec![at("a", 0.0, 1.0, 0.0, 1.0), at("b", 0.0, 1.0, 1.0, 0.0)]);
    let physics = PhysicsConfiguration::new(1.0, GravityModel::NewtonLinearAfterTouching, CollisionModel::Combine);
    let mut sim = Simulation::new(arrangement, physics).unwrap();
    let before = sim.bodies().to_vec();

    assert!(matches!(sim.leap(1), Err(SimulationError::Collision { step: 1, .. })));
    assert_eq!(sim.bodies(), &before[..]);
    assert_eq!(sim.num_steps_performed(), 0);
}

#[test]
fn test_invalid_physics_is_rejected() {
    let physics = PhysicsConfiguration::new(0.0, GravityModel::NewtonPointlike, CollisionModel::None);
    let err = Simulation::new(cloud(1), physics).unwrap_err();
    assert_eq!(err, SimulationError::Config(ConfigError::StepTime(0.0)));

    let mut sim = Simulation::new(cloud(1), PhysicsConfiguration::default()).unwrap();
    let bad = PhysicsConfiguration::default().with_drag_coefficient(f64::NAN);
    assert!(sim.set_physics(bad).is_err());
    assert_eq!(sim.physics(), &PhysicsConfiguration::default());
}

#[test]
fn test_kernel_paths_agree() {
    let physics = PhysicsConfiguration::new(60.0, GravityModel::NewtonPointlike, CollisionModel::None);
    let mut pure = Simulation::new(cloud(3), physics).unwrap();
    let mut reference = Simulation::new(cloud(3), physics)
        .unwrap()
        .with_kernel(Arc::new(ReferenceKernel));
    let mut native = Simulation::new(cloud(3), physics)
        .unwrap()
        .with_kernel(Arc::new(NativeKernel::builtin()));

    pure.leap(20).unwrap();
    reference.leap(20).unwrap();
    native.leap(20).unwrap();

    assert_eq!(pure.bodies(), reference.bodies());
    for (a, b) in pure.bodies().iter().zip(native.bodies()) {
        let scale = a.position.mag().max(1.0);
        assert_relative_eq!((a.position - b.position).mag() / scale, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_unavailable_kernel_falls_back() {
    let physics = PhysicsConfiguration::new(60.0, GravityModel::NewtonPointlike, CollisionModel::None);
    let mut pure = Simulation::new(cloud(4), physics).unwrap();
    let mut missing = Simulation::new(cloud(4), physics)
        .unwrap()
        .with_kernel(Arc::new(NativeKernel::new(None)));

    pure.leap(10).unwrap();
    missing.leap(10).unwrap();

    assert_eq!(pure.bodies(), missing.bodies());
}

#[test]
fn test_rayon_matches_sequential() {
    let physics = PhysicsConfiguration::new(60.0, GravityModel::NewtonBuoyant, CollisionModel::Combine);
    let mut sequential = Simulation::new(cloud(5), physics).unwrap();
    let mut parallel = Simulation::new(cloud(5), physics).unwrap();
    parallel.set_use_rayon(true);

    sequential.leap(25).unwrap();
    parallel.leap(25).unwrap();

    assert_eq!(sequential.bodies(), parallel.bodies());
}

#[test]
fn test_summaries() {
    let physics = PhysicsConfiguration::new(2.0, GravityModel::NewtonBuoyant, CollisionModel::Drag);
    let mut sim = Simulation::new(cloud(9), physics).unwrap();
    sim.leap(3).unwrap();

    let config = sim.config_lines();
    assert_eq!(config[0], "arrangement: random-cloud");
    assert!(config.iter().any(|l| l.contains("seed: 9")));
    assert!(config.iter().any(|l| l.contains("gravity model: newton-buoyant")));
    assert!(config.iter().any(|l| l.contains("drag coefficient")));

    let state = sim.state_lines();
    assert_eq!(state[0], "step: 3");
    assert_eq!(state[1], "t: 6 s");
    assert_eq!(sim.seed(), Some(9));
}

#[test]
fn test_combine_far_from_origin() {
    let arrangement = explicit(vec![
        at("a", 1.0, 1.0e30, 1.0e39, 0.0),
        at("b", 1.0, 1.0e30, 1.0e39 + 1.0e30, 0.0),
        at("c", 1.0, 1.0e30, -1.0e39, 0.0),
    ]);
    let physics = PhysicsConfiguration::new(1.0, GravityModel::None, CollisionModel::Combine);
    let mut sim = Simulation::new(arrangement, physics).unwrap();

    sim.leap(1).unwrap();

    let names: Vec<_> = sim.existing_bodies().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["a", "c"]);
    assert_relative_eq!(sim.bodies()[0].mass, 2.0);
}

#[test]
fn test_failed_bounce_cap_halts() {
    // subnormal masses overflow the reduced-mass term
    let arrangement = explicit(vec![at("a", 1.0e-320, 1.0, 0.0, 1.0), at("b", 1.0e-320, 1.0, 1.0, -1.0)]);
    let physics = PhysicsConfiguration::new(1.0, GravityModel::None, CollisionModel::Drag);
    let mut sim = Simulation::new(arrangement, physics).unwrap();
    let before = sim.bodies().to_vec();

    assert!(!sim.try_leap(1));
    assert_eq!(sim.num_steps_performed(), 0);
    assert_eq!(sim.bodies(), &before[..]);
    assert!(sim.latest_error_message().unwrap().contains("bounce cap"));
}

#[test]
fn test_system_totals() {
    let arrangement = explicit(vec![at("a", 1.0, 0.0, -1.0, 2.0), at("b", 3.0, 0.0, 3.0, 0.0)]);
    let physics = PhysicsConfiguration::new(1.0, GravityModel::None, CollisionModel::None);
    let mut sim = Simulation::new(arrangement, physics).unwrap();

    assert_eq!(sim.center_of_mass(), Some(DVec3::new(2.0, 0.0, 0.0)));
    assert_eq!(sim.total_mass(), 4.0);
    assert_eq!(sim.kinetic_energy(), 2.0);

    sim.leap(2).unwrap();
    assert_eq!(sim.initial_bodies()[0].position.x, -1.0);
    assert_eq!(sim.bodies()[0].position.x, 3.0);
}
