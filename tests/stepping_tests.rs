mod common;

use approx::assert_relative_eq;
use bc_sim::{
    BodyId, DynamicsMode, HighGainController, IntegrationMode, ReferenceMotion, SimError,
    SimulationBody, SimulationConfig, Simulator, WorldError,
};
use common::{arm, cube, RecordingWorld};

const DT: f64 = 0.001;

fn ramp(frames: usize) -> ReferenceMotion {
    ReferenceMotion::new(
        1.0 / DT,
        (0..frames).map(|k| vec![0.1 + 0.01 * k as f64]).collect(),
    )
}

fn sim_with_mode(mode: DynamicsMode) -> Simulator {
    let mut config = SimulationConfig::default();
    config.set_dynamics_mode(mode);
    Simulator::new(config, DT).unwrap()
}

#[test]
fn test_step_before_initialization_fails() {
    let mut sim = sim_with_mode(DynamicsMode::ForwardDynamics);
    assert!(matches!(sim.step(), Err(SimError::NotInitialized)));
    assert!(!sim.is_running());
}

#[test]
fn test_invalid_time_step_is_rejected() {
    assert!(matches!(
        Simulator::new(SimulationConfig::default(), 0.0),
        Err(SimError::InvalidTimeStep(_))
    ));
    let mut sim = sim_with_mode(DynamicsMode::ForwardDynamics);
    assert!(sim.set_time_step(f64::NAN).is_err());
    assert_eq!(sim.time_step(), DT);
}

#[test]
fn test_free_cube_falls_under_gravity() {
    let mut sim = sim_with_mode(DynamicsMode::ForwardDynamics);
    let g = sim.config().gravity().z;
    sim.initialize_simulation(vec![SimulationBody::new(BodyId(1), cube("cube", 1.0))])
        .unwrap();

    let steps = 100;
    for _ in 0..steps {
        sim.step().unwrap();
    }

    // semi-implicit Euler: z_n = z_0 + g dt² n(n+1)/2
    let n = steps as f64;
    let expected = 1.0 + g * DT * DT * n * (n + 1.0) / 2.0;
    let root = sim.body(BodyId(1)).unwrap().root();
    assert_relative_eq!(root.pose.position.z, expected, epsilon = 1e-9);
    assert_relative_eq!(root.v.z, g * n * DT, epsilon = 1e-9);
    assert_relative_eq!(sim.current_time(), 0.1, epsilon = 1e-12);
    assert_eq!(sim.step_count(), 100);
    assert!(sim.collisions().is_empty());
}

#[test]
fn test_runge_kutta_matches_closed_form() {
    let mut config = SimulationConfig::default();
    config.set_integration_mode(IntegrationMode::RungeKutta);
    let g = config.gravity().z;
    let mut sim = Simulator::new(config, DT).unwrap();
    sim.initialize_simulation(vec![SimulationBody::new(BodyId(1), cube("cube", 2.0))])
        .unwrap();
    for _ in 0..200 {
        sim.step().unwrap();
    }
    let t = sim.current_time();
    let z = sim.body(BodyId(1)).unwrap().root().pose.position.z;
    assert_relative_eq!(z, 2.0 + 0.5 * g * t * t, epsilon = 1e-9);
}

#[test]
fn test_cube_reports_ground_collisions() {
    let mut sim = sim_with_mode(DynamicsMode::ForwardDynamics);
    sim.initialize_simulation(vec![SimulationBody::new(BodyId(1), cube("cube", 0.0))])
        .unwrap();
    sim.step().unwrap();

    let handle = sim.handle(BodyId(1)).unwrap();
    let collisions = sim.collisions();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].body, handle);
    assert_eq!(collisions[0].link, 0);
    assert!(collisions[0].force.z >= 0.0);
}

#[test]
fn test_non_finite_state_aborts_the_run() {
    let mut sim = sim_with_mode(DynamicsMode::ForwardDynamics);
    sim.initialize_simulation(vec![SimulationBody::new(BodyId(1), cube("cube", 1.0))])
        .unwrap();
    sim.step().unwrap();

    sim.body_mut(BodyId(1)).unwrap().root_mut().pose.position.z = f64::NAN;
    assert!(matches!(
        sim.step(),
        Err(SimError::World(WorldError::Diverged { .. }))
    ));
    assert!(!sim.is_running());
    assert!(matches!(sim.step(), Err(SimError::RunAborted)));

    // a fresh run recovers
    sim.initialize_simulation(vec![SimulationBody::new(BodyId(1), cube("cube", 1.0))])
        .unwrap();
    sim.step().unwrap();
}

#[test]
fn test_world_failure_stops_further_steps() {
    let mut sim =
        Simulator::with_world(RecordingWorld::default(), SimulationConfig::default(), DT).unwrap();
    sim.initialize_simulation(vec![SimulationBody::new(BodyId(1), cube("cube", 1.0))])
        .unwrap();
    sim.step().unwrap();

    sim.world_mut().fail_next_advance = true;
    assert!(sim.step().is_err());
    assert!(matches!(sim.step(), Err(SimError::RunAborted)));
    assert_eq!(sim.world().advances, 1);
    assert_eq!(sim.step_count(), 1);
}

#[test]
fn test_huge_time_step_steps_without_a_budget() {
    let mut sim =
        Simulator::with_world(RecordingWorld::default(), SimulationConfig::default(), 1e20)
            .unwrap();
    sim.initialize_simulation(vec![SimulationBody::new(BodyId(1), cube("cube", 1.0))])
        .unwrap();
    sim.step().unwrap();
    assert_eq!(sim.world().advances, 1);
    assert_eq!(sim.world().time_step, 1e20);
}

#[test]
fn test_invalid_reference_motions_exclude_their_bodies() {
    let mut sim = sim_with_mode(DynamicsMode::ForwardDynamics);
    sim.initialize_simulation(vec![
        SimulationBody::new(BodyId(1), arm("empty"))
            .with_controller(HighGainController::new("nothing", ReferenceMotion::new(1000.0, vec![]))),
        SimulationBody::new(BodyId(2), arm("slow"))
            .with_controller(HighGainController::new("slow", ReferenceMotion::new(500.0, vec![vec![0.0]]))),
        SimulationBody::new(BodyId(3), arm("good"))
            .with_controller(HighGainController::new("ramp", ramp(10))),
    ])
    .unwrap();

    assert_eq!(sim.num_bodies(), 1);
    assert!(sim.handle(BodyId(1)).is_none());
    assert!(sim.handle(BodyId(2)).is_none());
    assert!(sim.handle(BodyId(3)).is_some());

    let messages = sim.controller_messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("Reference motion is empty."));
    assert!(messages[1].contains("is different from the world frame rate"));
    assert!(sim.is_running());
}

#[test]
fn test_playback_starts_at_first_frame() {
    let id = BodyId(1);
    let mut sim = sim_with_mode(DynamicsMode::Kinematics);
    let motion = ramp(10);
    sim.initialize_simulation(vec![SimulationBody::new(id, arm("servo"))
        .with_controller(HighGainController::new("ramp", motion.clone()))])
        .unwrap();

    sim.step().unwrap();
    assert_relative_eq!(sim.body(id).unwrap().links[1].q, motion.frame(0)[0]);
    sim.step().unwrap();
    assert_relative_eq!(sim.body(id).unwrap().links[1].q, motion.frame(1)[0]);
}

#[test]
fn test_high_gain_dynamics_tracks_reference() {
    let id = BodyId(1);
    let mut sim = sim_with_mode(DynamicsMode::HighGainDynamics);
    let motion = ramp(20);
    sim.initialize_simulation(vec![SimulationBody::new(id, arm("servo"))
        .with_controller(HighGainController::new("ramp", motion.clone()))])
        .unwrap();

    // the first frame has no predecessor, so its acceleration overshoots
    sim.step().unwrap();
    for step in 2..=10 {
        sim.step().unwrap();
        let q = sim.body(id).unwrap().links[1].q;
        assert_relative_eq!(q, motion.frame(step)[0], epsilon = 1e-9);
    }
}

#[test]
fn test_parallel_and_sequential_integration_agree() {
    let bodies = || {
        (0..8)
            .map(|i| SimulationBody::new(BodyId(i), cube("cube", 0.5 + 0.1 * i as f64)))
            .collect::<Vec<_>>()
    };
    let mut parallel = sim_with_mode(DynamicsMode::ForwardDynamics);
    let mut sequential = sim_with_mode(DynamicsMode::ForwardDynamics);
    sequential.world_mut().set_parallel_enabled(false);
    parallel.initialize_simulation(bodies()).unwrap();
    sequential.initialize_simulation(bodies()).unwrap();

    for _ in 0..300 {
        parallel.step().unwrap();
        sequential.step().unwrap();
    }
    for i in 0..8 {
        let a = parallel.body(BodyId(i)).unwrap().root().pose.position;
        let b = sequential.body(BodyId(i)).unwrap().root().pose.position;
        assert_eq!(a, b);
    }
}

#[test]
fn test_finalize_returns_to_idle() {
    let mut sim = sim_with_mode(DynamicsMode::ForwardDynamics);
    sim.initialize_simulation(vec![SimulationBody::new(BodyId(1), cube("cube", 1.0))])
        .unwrap();
    sim.step().unwrap();
    sim.finalize_simulation();

    assert!(!sim.is_running());
    assert_eq!(sim.num_bodies(), 0);
    assert!(sim.body(BodyId(1)).is_none());
    assert!(matches!(sim.step(), Err(SimError::NotInitialized)));
}
