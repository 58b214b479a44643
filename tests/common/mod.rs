#![allow(dead_code)]

use bc_sim::{
    Collision, DynamicsWorld, EntityId, ForwardDynamicsDelegate, IntegrationMode, JointType,
    Link, MassProperties, Multibody, SolverMode, SolverParameters, WorldError,
};
use glam::DVec3;

/// Pelvis on a free joint with two hip/knee/ankle legs; feet are the ankles
/// (links 3 and 6), both on the ground.
pub fn biped(name: &str) -> Multibody {
    let mut mb = Multibody::new(name);
    mb.add_link(
        Link::new("pelvis", None, JointType::Free)
            .with_mass(MassProperties::solid_box(DVec3::new(0.1, 0.15, 0.1), 10.0)),
    );
    let mut feet = Vec::new();
    for side in [0.1, -0.1] {
        let hip = mb.add_link(
            Link::new("hip", Some(0), JointType::Revolute { axis: DVec3::Y })
                .with_offset(DVec3::new(0.0, side, 0.0)),
        );
        let knee = mb.add_link(
            Link::new("knee", Some(hip), JointType::Revolute { axis: DVec3::Y })
                .with_offset(DVec3::new(0.0, 0.0, -0.4)),
        );
        feet.push(mb.add_link(
            Link::new("ankle", Some(knee), JointType::Revolute { axis: DVec3::Y })
                .with_offset(DVec3::new(0.0, 0.0, -0.4)),
        ));
    }
    mb.set_feet(feet);
    mb.root_mut().pose.position = DVec3::new(0.0, 0.0, 0.8);
    mb
}

/// Bends one leg (0 = left, 1 = right) keeping the foot parallel to the pelvis.
pub fn bend_leg(body: &mut Multibody, leg: usize, angle: f64) {
    let hip = 1 + leg * 3;
    body.links[hip].q = angle;
    body.links[hip + 1].q = -2.0 * angle;
    body.links[hip + 2].q = angle;
}

/// Single free box.
pub fn cube(name: &str, height: f64) -> Multibody {
    let mut mb = Multibody::new(name);
    mb.add_link(
        Link::new("box", None, JointType::Free)
            .with_mass(MassProperties::solid_box(DVec3::splat(0.05), 1.0)),
    );
    mb.root_mut().pose.position.z = height;
    mb
}

/// Fixed base with one revolute joint about Y.
pub fn arm(name: &str) -> Multibody {
    let mut mb = Multibody::new(name);
    mb.add_link(Link::new("base", None, JointType::Fixed));
    mb.add_link(
        Link::new("arm", Some(0), JointType::Revolute { axis: DVec3::Y })
            .with_offset(DVec3::new(0.0, 0.0, 1.0))
            .with_mass(MassProperties::solid_box(DVec3::new(0.25, 0.02, 0.02), 1.0)
                .with_com(DVec3::new(0.25, 0.0, 0.0))),
    );
    mb
}

/// World that only records what the engine asks of it.
#[derive(Default)]
pub struct RecordingWorld {
    pub bodies: Vec<Multibody>,
    pub delegates: Vec<ForwardDynamicsDelegate>,
    pub params: SolverParameters,
    pub gravity: DVec3,
    pub method: Option<IntegrationMode>,
    pub time_step: f64,
    pub time: f64,
    pub initialized: bool,
    pub force_clears: usize,
    pub advances: usize,
    pub fail_next_advance: bool,
    collisions: Vec<Collision>,
}

impl DynamicsWorld for RecordingWorld {
    fn solver_defaults(&self) -> SolverParameters {
        SolverParameters::default()
    }

    fn set_integration_method(&mut self, method: IntegrationMode) {
        self.method = Some(method);
    }

    fn set_gravity(&mut self, gravity: DVec3) {
        self.gravity = gravity;
    }

    fn set_time_step(&mut self, time_step: f64) {
        self.time_step = time_step;
    }

    fn time_step(&self) -> f64 {
        self.time_step
    }

    fn set_current_time(&mut self, time: f64) {
        self.time = time;
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_solver_backend(&mut self, backend: SolverMode) {
        self.params.backend = backend;
    }

    fn set_friction(&mut self, static_friction: f64, slip_friction: f64) {
        self.params.static_friction = static_friction;
        self.params.slip_friction = slip_friction;
    }

    fn set_contact_culling_distance(&mut self, distance: f64) {
        self.params.contact_culling_distance = distance;
    }

    fn set_contact_culling_depth(&mut self, depth: f64) {
        self.params.contact_culling_depth = depth;
    }

    fn set_coefficient_of_restitution(&mut self, restitution: f64) {
        self.params.coefficient_of_restitution = restitution;
    }

    fn set_error_criterion(&mut self, criterion: f64) {
        self.params.error_criterion = criterion;
    }

    fn set_max_iterations(&mut self, iterations: u32) {
        self.params.max_iterations = iterations;
    }

    fn set_contact_correction(&mut self, depth: f64, velocity_ratio: f64) {
        self.params.contact_correction_depth = depth;
        self.params.contact_correction_velocity_ratio = velocity_ratio;
    }

    fn set_2d_mode(&mut self, on: bool) {
        self.params.is_2d_mode = on;
    }

    fn set_penalty_coefficients(&mut self, kp: f64, kv: f64, size_ratio: f64) {
        self.params.penalty_kp_coef = kp;
        self.params.penalty_kv_coef = kv;
        self.params.penalty_size_ratio = size_ratio;
    }

    fn clear_bodies(&mut self) {
        self.bodies.clear();
        self.delegates.clear();
    }

    fn add_body(
        &mut self,
        body: Multibody,
        delegate: ForwardDynamicsDelegate,
    ) -> Result<EntityId, WorldError> {
        self.bodies.push(body);
        self.delegates.push(delegate);
        Ok(EntityId::from_index(self.bodies.len() as u32 - 1))
    }

    fn body(&self, id: EntityId) -> Option<&Multibody> {
        self.bodies.get(id.index())
    }

    fn body_mut(&mut self, id: EntityId) -> Option<&mut Multibody> {
        self.bodies.get_mut(id.index())
    }

    fn delegate(&self, id: EntityId) -> Option<ForwardDynamicsDelegate> {
        self.delegates.get(id.index()).copied()
    }

    fn clear_external_forces(&mut self) {
        self.force_clears += 1;
        for body in &mut self.bodies {
            body.clear_external_forces();
        }
    }

    fn initialize(&mut self) {
        self.initialized = true;
    }

    fn advance_one_step(&mut self) -> Result<(), WorldError> {
        if std::mem::take(&mut self.fail_next_advance) {
            return Err(WorldError::Diverged {
                name: "recorded".into(),
                time: self.time,
            });
        }
        self.advances += 1;
        self.time += self.time_step;
        Ok(())
    }

    fn collisions(&self) -> &[Collision] {
        &self.collisions
    }
}
