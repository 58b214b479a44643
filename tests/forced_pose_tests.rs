mod common;

use std::thread;

use bc_sim::{
    BodyId, DQuat, ForcedPoseHandle, SimulationBody, SimulationConfig, Simulator, Transform,
};
use common::{biped, cube};
use glam::DVec3;

fn running_sim() -> Simulator {
    let mut walker = biped("walker");
    walker.root_mut().pose.position.z += 1.0;
    let mut sim = Simulator::new(SimulationConfig::default(), 0.001).unwrap();
    sim.initialize_simulation(vec![
        SimulationBody::new(BodyId(1), cube("cube", 1.0)),
        SimulationBody::new(BodyId(2), walker),
    ])
    .unwrap();
    sim
}

#[test]
fn test_forced_pose_handle_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ForcedPoseHandle>();
}

#[test]
fn test_last_request_wins_and_velocity_is_zeroed() {
    let mut sim = running_sim();
    for _ in 0..20 {
        sim.step().unwrap();
    }
    assert!(sim.body(BodyId(1)).unwrap().root().v.z < 0.0);

    let first = Transform::from_position(DVec3::new(5.0, 0.0, 3.0));
    let last = Transform::new(
        DVec3::new(-1.0, 2.0, 2.0),
        DQuat::from_rotation_z(0.5),
    );
    assert!(sim.set_forced_body_pose(BodyId(1), first));
    assert!(sim.set_forced_body_pose(BodyId(1), last));
    sim.step().unwrap();

    let root = sim.body(BodyId(1)).unwrap().root();
    assert_eq!(root.pose.position, last.position);
    assert!(root.pose.rotation.abs_diff_eq(last.rotation, 1e-12));
    assert_eq!(root.v, DVec3::ZERO);
    assert_eq!(root.w, DVec3::ZERO);
    assert!(sim.forced_pose_handle().pending().is_none());
}

#[test]
fn test_forced_pose_moves_the_whole_body() {
    let mut sim = running_sim();
    let pose = Transform::from_position(DVec3::new(1.0, 0.0, 2.0));
    assert!(sim.set_forced_body_pose(BodyId(2), pose));
    sim.step().unwrap();

    let body = sim.body(BodyId(2)).unwrap();
    assert_eq!(body.root().pose.position, pose.position);
    // legs are straight: feet hang 0.8 below the pelvis
    for &foot in &body.feet {
        assert!((body.links[foot].pose.position.z - 1.2).abs() < 1e-9);
    }
}

#[test]
fn test_request_for_unknown_body_is_ignored() {
    let mut sim = running_sim();
    assert!(!sim.set_forced_body_pose(BodyId(99), Transform::default()));
    assert!(!sim.forced_pose_handle().is_armed());

    let before = sim.body(BodyId(1)).unwrap().root().pose.position;
    sim.step().unwrap();
    let after = sim.body(BodyId(1)).unwrap().root().pose.position;
    assert!(after.z < before.z);
}

#[test]
fn test_cancel_disarms_the_hook() {
    let mut sim = running_sim();
    let handle = sim.forced_pose_handle();
    assert!(handle.request(BodyId(1), Transform::from_position(DVec3::new(0.0, 0.0, 4.0))));
    sim.clear_forced_body_poses();
    assert!(!handle.is_armed());

    sim.step().unwrap();
    let z = sim.body(BodyId(1)).unwrap().root().pose.position.z;
    assert!(z < 1.0);
}

#[test]
fn test_pose_is_injected_once_per_request() {
    let mut sim = running_sim();
    sim.set_forced_body_pose(BodyId(1), Transform::from_position(DVec3::new(0.0, 0.0, 2.0)));
    sim.step().unwrap();
    sim.step().unwrap();

    // second step integrates freely from the injected pose
    let root = sim.body(BodyId(1)).unwrap().root();
    assert!(root.pose.position.z < 2.0);
    assert!(root.v.z < 0.0);
}

#[test]
fn test_requests_from_other_threads() {
    let mut sim = running_sim();
    let target = Transform::from_position(DVec3::new(0.5, 0.5, 3.0));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let handle = sim.forced_pose_handle();
            thread::spawn(move || handle.request(BodyId(2), target))
        })
        .collect();
    for worker in workers {
        assert!(worker.join().unwrap());
    }

    sim.step().unwrap();
    assert_eq!(sim.body(BodyId(2)).unwrap().root().pose.position, target.position);
}

#[test]
fn test_finalize_clears_membership() {
    let mut sim = running_sim();
    let handle = sim.forced_pose_handle();
    sim.finalize_simulation();
    assert!(!handle.request(BodyId(1), Transform::default()));
    assert!(!handle.is_armed());
}
