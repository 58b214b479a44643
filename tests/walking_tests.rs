mod common;

use bc_sim::{
    BodyId, DQuat, DynamicsMode, Multibody, SimulationBody, SimulationConfig, Simulator,
    WalkState,
};
use common::{arm, bend_leg, biped};

const BEND: f64 = 0.3;

fn walking_sim(walking: bool, bodies: Vec<SimulationBody>) -> Simulator {
    let mut config = SimulationConfig::default();
    config.set_dynamics_mode(DynamicsMode::Kinematics);
    config.set_kinematic_walking(walking);
    let mut sim = Simulator::new(config, 0.001).unwrap();
    sim.initialize_simulation(bodies).unwrap();
    sim
}

fn feet_heights(body: &Multibody) -> Vec<f64> {
    body.feet
        .iter()
        .map(|&foot| body.links[foot].pose.position.z)
        .collect()
}

fn assert_support_is_lowest(sim: &Simulator, id: BodyId) {
    let body = sim.body(id).unwrap();
    let walk = sim.walk_state(id).unwrap();
    let support_z = body.links[walk.support_link(body)].pose.position.z;
    for z in feet_heights(body) {
        assert!(support_z <= z + 1e-12, "support {support_z} above foot {z}");
    }
    assert!((walk.support_height() - support_z).abs() < 1e-12);
}

#[test]
fn test_tie_goes_to_first_foot() {
    let mut body = biped("walker");
    body.calc_forward_kinematics(false, false);
    let walk = WalkState::new(&body).unwrap();
    assert_eq!(walk.support_foot(), 0);
    assert_eq!(walk.support_link(&body), 3);
    assert!(walk.support_height().abs() < 1e-12);
    assert_eq!(walk.traversal().root(), 3);
}

#[test]
fn test_initial_support_is_lowest_foot() {
    let mut body = biped("walker");
    bend_leg(&mut body, 0, BEND);
    body.calc_forward_kinematics(false, false);
    let walk = WalkState::new(&body).unwrap();
    assert_eq!(walk.support_foot(), 1);
}

#[test]
fn test_bodies_without_feet_do_not_walk() {
    let mut body = arm("arm");
    body.calc_forward_kinematics(false, false);
    assert!(WalkState::new(&body).is_none());
}

#[test]
fn test_lifting_the_swing_leg_keeps_support() {
    let id = BodyId(1);
    let mut sim = walking_sim(true, vec![SimulationBody::new(id, biped("walker"))]);
    sim.step().unwrap();
    assert_eq!(sim.walk_state(id).unwrap().support_foot(), 0);

    bend_leg(sim.body_mut(id).unwrap(), 1, BEND);
    sim.step().unwrap();

    let body = sim.body(id).unwrap();
    assert_eq!(sim.walk_state(id).unwrap().support_foot(), 0);
    let heights = feet_heights(body);
    assert!(heights[0].abs() < 1e-12);
    assert!((heights[1] - 0.8 * (1.0 - BEND.cos())).abs() < 1e-9);
    // pelvis stays where the straight support leg holds it
    assert!((body.root().pose.position.z - 0.8).abs() < 1e-9);
    assert_support_is_lowest(&sim, id);
}

#[test]
fn test_alternating_legs_switch_support_without_jumps() {
    let id = BodyId(1);
    let mut sim = walking_sim(true, vec![SimulationBody::new(id, biped("walker"))]);
    sim.step().unwrap();

    let mut expected_support = 0;
    for cycle in 0..6 {
        let bent = expected_support;
        let straight = 1 - bent;
        let previous_height = sim.walk_state(id).unwrap().support_height();
        {
            let body = sim.body_mut(id).unwrap();
            bend_leg(body, straight, 0.0);
            bend_leg(body, bent, BEND);
        }
        sim.step().unwrap();

        expected_support = straight;
        let walk = sim.walk_state(id).unwrap();
        assert_eq!(walk.support_foot(), expected_support, "cycle {cycle}");

        let body = sim.body(id).unwrap();
        let support_z = body.links[walk.support_link(body)].pose.position.z;
        assert!(
            (support_z - previous_height).abs() < 1e-12,
            "cycle {cycle}: support moved from {previous_height} to {support_z}"
        );
        // straight support leg holds the pelvis 0.8 above the ground
        assert!((body.root().pose.position.z - 0.8).abs() < 1e-9);
        assert_support_is_lowest(&sim, id);
    }
}

#[test]
fn test_kinematics_mode_advances_time() {
    let mut sim = walking_sim(true, vec![SimulationBody::new(BodyId(1), biped("walker"))]);
    for _ in 0..10 {
        sim.step().unwrap();
    }
    assert!((sim.current_time() - 0.01).abs() < 1e-12);
    assert_eq!(sim.step_count(), 10);
}

#[test]
fn test_walking_off_uses_root_kinematics() {
    let id = BodyId(1);
    let mut sim = walking_sim(false, vec![SimulationBody::new(id, biped("walker"))]);
    assert!(sim.walk_state(id).is_none());

    bend_leg(sim.body_mut(id).unwrap(), 0, BEND);
    sim.step().unwrap();

    // pelvis fixed, the bent foot rises
    let body = sim.body(id).unwrap();
    assert!((body.root().pose.position.z - 0.8).abs() < 1e-12);
    assert!(feet_heights(body)[0] > 0.0);
}

#[test]
fn test_non_legged_body_falls_back_to_forward_kinematics() {
    let legged = BodyId(1);
    let plain = BodyId(2);
    let mut sim = walking_sim(
        true,
        vec![
            SimulationBody::new(legged, biped("walker")),
            SimulationBody::new(plain, arm("arm")),
        ],
    );
    assert!(sim.walk_state(legged).is_some());
    assert!(sim.walk_state(plain).is_none());

    sim.body_mut(plain).unwrap().links[1].q = 0.5;
    sim.step().unwrap();

    let body = sim.body(plain).unwrap();
    assert!(body.links[1]
        .pose
        .rotation
        .abs_diff_eq(DQuat::from_rotation_y(0.5), 1e-12));
}
