//! The dynamics world the stepping engine drives.
//!
//! [`DynamicsWorld`] is the narrow contract the engine consumes: run-scoped
//! setters, body registration and a per-step advance. [`ArticulatedWorld`] is
//! the bundled implementation: articulated-body forward dynamics over a flat
//! ground plane with penalty contacts.

pub mod collision_manager;
pub mod dynamics_manager;

pub use collision_manager::{Collision, CollisionManager, GroundContact};
pub use dynamics_manager::{DynamicsManager, ForwardDynamicsDelegate};

use glam::DVec3;
use std::time::{Duration, Instant};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    config::{IntegrationMode, SolverMode, DEFAULT_TIME_STEP},
    core::articulations::Multibody,
    dynamics::solver::SolverParameters,
    error::WorldError,
    utils::{
        allocator::{Arena, EntityId},
        logging::ScopedTimer,
        profiling::{PhaseTimer, WorldProfile},
    },
};

/// Contract between the stepping engine and the solver/integrator it drives.
///
/// Setters are called once per run from `initialize_simulation`;
/// `advance_one_step` once per step.
pub trait DynamicsWorld: Send {
    /// Built-in solver defaults, used to seed a fresh configuration.
    fn solver_defaults(&self) -> SolverParameters;

    fn set_integration_method(&mut self, method: IntegrationMode);
    fn set_gravity(&mut self, gravity: DVec3);
    fn set_time_step(&mut self, time_step: f64);
    fn time_step(&self) -> f64;
    fn set_current_time(&mut self, time: f64);
    fn current_time(&self) -> f64;

    fn set_solver_backend(&mut self, backend: SolverMode);
    fn set_friction(&mut self, static_friction: f64, slip_friction: f64);
    fn set_contact_culling_distance(&mut self, distance: f64);
    fn set_contact_culling_depth(&mut self, depth: f64);
    fn set_coefficient_of_restitution(&mut self, restitution: f64);
    fn set_error_criterion(&mut self, criterion: f64);
    fn set_max_iterations(&mut self, iterations: u32);
    fn set_contact_correction(&mut self, depth: f64, velocity_ratio: f64);
    fn set_2d_mode(&mut self, on: bool);
    fn set_penalty_coefficients(&mut self, kp: f64, kv: f64, size_ratio: f64);

    fn clear_bodies(&mut self);
    /// Takes ownership of `body` and returns its handle for this run.
    fn add_body(
        &mut self,
        body: Multibody,
        delegate: ForwardDynamicsDelegate,
    ) -> Result<EntityId, WorldError>;
    fn body(&self, id: EntityId) -> Option<&Multibody>;
    fn body_mut(&mut self, id: EntityId) -> Option<&mut Multibody>;
    fn delegate(&self, id: EntityId) -> Option<ForwardDynamicsDelegate>;

    fn clear_external_forces(&mut self);
    /// Finishes run setup once every body and parameter is in place.
    fn initialize(&mut self);
    fn advance_one_step(&mut self) -> Result<(), WorldError>;
    /// Collisions found during the last step.
    fn collisions(&self) -> &[Collision];
}

struct WorldBody {
    id: EntityId,
    body: Multibody,
    delegate: ForwardDynamicsDelegate,
}

/// Articulated bodies over a ground plane at z = 0.
pub struct ArticulatedWorld {
    bodies: Arena<WorldBody>,
    dynamics: DynamicsManager,
    collision: CollisionManager,
    current_time: f64,
    parallel_enabled: bool,
    profile: WorldProfile,
}

impl Default for ArticulatedWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticulatedWorld {
    pub fn new() -> Self {
        Self {
            bodies: Arena::new(),
            dynamics: DynamicsManager::new(),
            collision: CollisionManager::new(),
            current_time: 0.0,
            parallel_enabled: cfg!(feature = "parallel"),
            profile: WorldProfile::default(),
        }
    }

    /// Enables or disables parallel integration of bodies. Has no effect
    /// without the `parallel` feature.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled;
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    pub fn gravity(&self) -> DVec3 {
        self.dynamics.gravity
    }

    pub fn integration_method(&self) -> IntegrationMode {
        self.dynamics.integrator.method
    }

    pub fn solver_parameters(&self) -> &SolverParameters {
        &self.dynamics.params
    }

    pub fn set_ground_height(&mut self, height: f64) {
        self.dynamics.ground_height = height;
        self.collision.ground_height = height;
    }

    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn profile(&self) -> &WorldProfile {
        &self.profile
    }

    fn detect_collisions(&mut self) {
        let _timer = PhaseTimer::new(&mut self.profile.collision_time);
        self.collision.clear();
        let params = &self.dynamics.params;
        for wb in self.bodies.iter() {
            let contacts = self.collision.detect(&wb.body, params);
            if !contacts.is_empty() {
                self.collision.record(wb.id, &wb.body, &contacts, params);
            }
        }
        self.profile.contact_count = self.collision.collisions().len();
    }

    /// Force-solve time is summed over bodies, so with parallel integration
    /// it may exceed the wall time of the phase.
    fn integrate_bodies(&mut self) {
        let started = Instant::now();
        let force_time = self.advance_bodies();
        self.profile.force_solve_time += force_time;
        self.profile.forward_dynamics_time += started.elapsed().saturating_sub(force_time);
    }

    fn advance_bodies(&mut self) -> Duration {
        let dynamics = &self.dynamics;

        #[cfg(feature = "parallel")]
        if self.parallel_enabled {
            return self
                .bodies
                .par_iter_mut()
                .map(|wb| dynamics.advance(&mut wb.body, wb.delegate))
                .sum();
        }

        self.bodies
            .iter_mut()
            .map(|wb| dynamics.advance(&mut wb.body, wb.delegate))
            .sum()
    }

    fn check_divergence(&self) -> Result<(), WorldError> {
        match self.bodies.iter().find(|wb| !wb.body.is_finite()) {
            Some(wb) => Err(WorldError::Diverged {
                name: wb.body.name.clone(),
                time: self.current_time,
            }),
            None => Ok(()),
        }
    }
}

impl DynamicsWorld for ArticulatedWorld {
    fn solver_defaults(&self) -> SolverParameters {
        SolverParameters::default()
    }

    fn set_integration_method(&mut self, method: IntegrationMode) {
        self.dynamics.integrator.method = method;
    }

    fn set_gravity(&mut self, gravity: DVec3) {
        self.dynamics.gravity = gravity;
    }

    fn set_time_step(&mut self, time_step: f64) {
        self.dynamics.integrator.dt = if time_step > 0.0 {
            time_step
        } else {
            DEFAULT_TIME_STEP
        };
    }

    fn time_step(&self) -> f64 {
        self.dynamics.integrator.dt
    }

    fn set_current_time(&mut self, time: f64) {
        self.current_time = time;
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_solver_backend(&mut self, backend: SolverMode) {
        self.dynamics.params.backend = backend;
    }

    fn set_friction(&mut self, static_friction: f64, slip_friction: f64) {
        self.dynamics.params.static_friction = static_friction;
        self.dynamics.params.slip_friction = slip_friction;
    }

    fn set_contact_culling_distance(&mut self, distance: f64) {
        self.dynamics.params.contact_culling_distance = distance;
    }

    fn set_contact_culling_depth(&mut self, depth: f64) {
        self.dynamics.params.contact_culling_depth = depth;
    }

    fn set_coefficient_of_restitution(&mut self, restitution: f64) {
        self.dynamics.params.coefficient_of_restitution = restitution;
    }

    fn set_error_criterion(&mut self, criterion: f64) {
        self.dynamics.params.error_criterion = criterion;
    }

    fn set_max_iterations(&mut self, iterations: u32) {
        self.dynamics.params.max_iterations = iterations;
    }

    fn set_contact_correction(&mut self, depth: f64, velocity_ratio: f64) {
        self.dynamics.params.contact_correction_depth = depth;
        self.dynamics.params.contact_correction_velocity_ratio = velocity_ratio;
    }

    fn set_2d_mode(&mut self, on: bool) {
        self.dynamics.params.is_2d_mode = on;
    }

    fn set_penalty_coefficients(&mut self, kp: f64, kv: f64, size_ratio: f64) {
        self.dynamics.params.penalty_kp_coef = kp;
        self.dynamics.params.penalty_kv_coef = kv;
        self.dynamics.params.penalty_size_ratio = size_ratio;
    }

    fn clear_bodies(&mut self) {
        if self.profile.step_count > 0 {
            self.profile.report();
        }
        self.profile.reset();
        self.bodies.clear();
        self.collision.clear();
    }

    fn add_body(
        &mut self,
        body: Multibody,
        delegate: ForwardDynamicsDelegate,
    ) -> Result<EntityId, WorldError> {
        body.validate().map_err(|reason| WorldError::MalformedBody {
            name: body.name.clone(),
            reason,
        })?;
        let id = self.bodies.insert(WorldBody {
            id: EntityId::default(),
            body,
            delegate,
        });
        if let Some(stored) = self.bodies.get_mut(id) {
            stored.id = id;
        }
        Ok(id)
    }

    fn body(&self, id: EntityId) -> Option<&Multibody> {
        self.bodies.get(id).map(|wb| &wb.body)
    }

    fn body_mut(&mut self, id: EntityId) -> Option<&mut Multibody> {
        self.bodies.get_mut(id).map(|wb| &mut wb.body)
    }

    fn delegate(&self, id: EntityId) -> Option<ForwardDynamicsDelegate> {
        self.bodies.get(id).map(|wb| wb.delegate)
    }

    fn clear_external_forces(&mut self) {
        for wb in self.bodies.iter_mut() {
            wb.body.clear_external_forces();
        }
    }

    fn initialize(&mut self) {
        for wb in self.bodies.iter_mut() {
            wb.body.calc_forward_kinematics(true, true);
        }
        self.collision.clear();
        self.profile.reset();
        log::debug!(
            "world initialized: {} bodies, dt = {}s, {:?} integration, {} backend",
            self.bodies.len(),
            self.dynamics.integrator.dt,
            self.dynamics.integrator.method,
            self.dynamics.params.backend.symbol()
        );
    }

    fn advance_one_step(&mut self) -> Result<(), WorldError> {
        let _timer = ScopedTimer::new("world::advance");
        self.detect_collisions();
        self.integrate_bodies();
        self.current_time += self.dynamics.integrator.dt;
        self.profile.step_count += 1;
        self.check_divergence()
    }

    fn collisions(&self) -> &[Collision] {
        self.collision.collisions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::articulations::{JointType, Link};
    use crate::core::types::MassProperties;

    fn cube(height: f64) -> Multibody {
        let mut mb = Multibody::new("cube");
        mb.add_link(
            Link::new("root", None, JointType::Free)
                .with_mass(MassProperties::solid_box(DVec3::splat(0.05), 1.0)),
        );
        mb.root_mut().pose.position.z = height;
        mb
    }

    #[test]
    fn handles_from_a_cleared_world_do_not_resolve() {
        let mut world = ArticulatedWorld::new();
        let id = world
            .add_body(cube(1.0), ForwardDynamicsDelegate::ForwardDynamics)
            .unwrap();
        world.clear_bodies();
        assert!(world.body(id).is_none());
    }

    #[test]
    fn malformed_body_is_rejected() {
        let mut world = ArticulatedWorld::new();
        let err = world
            .add_body(Multibody::new("empty"), ForwardDynamicsDelegate::ForwardDynamics)
            .unwrap_err();
        assert!(matches!(err, WorldError::MalformedBody { .. }));
    }

    #[test]
    fn resting_cube_reports_ground_collision() {
        let mut world = ArticulatedWorld::new();
        world.set_time_step(0.001);
        let id = world
            .add_body(cube(0.0), ForwardDynamicsDelegate::ForwardDynamics)
            .unwrap();
        world.initialize();
        world.advance_one_step().unwrap();
        assert_eq!(world.collisions().len(), 1);
        assert_eq!(world.collisions()[0].body, id);
        assert_eq!(world.profile().step_count, 1);
    }

    #[test]
    fn contact_step_accounts_force_solve_time() {
        let mut world = ArticulatedWorld::new();
        world.set_time_step(0.001);
        world
            .add_body(cube(0.0), ForwardDynamicsDelegate::ForwardDynamics)
            .unwrap();
        world.initialize();
        world.advance_one_step().unwrap();
        let profile = *world.profile();
        assert!(profile.force_solve_time > Duration::ZERO);
        assert!(profile.total_time() >= profile.force_solve_time);
        assert_eq!(profile.contact_count, 1);

        world.clear_bodies();
        assert_eq!(world.profile().step_count, 0);
        assert_eq!(world.profile().force_solve_time, Duration::ZERO);
    }

    #[test]
    fn cube_settles_on_the_ground() {
        let mut world = ArticulatedWorld::new();
        world.set_time_step(0.001);
        world.set_parallel_enabled(false);
        let id = world
            .add_body(cube(0.05), ForwardDynamicsDelegate::ForwardDynamics)
            .unwrap();
        world.initialize();
        for _ in 0..2000 {
            world.advance_one_step().unwrap();
        }
        let root = world.body(id).unwrap().root();
        assert!(root.pose.position.z < 0.0 && root.pose.position.z > -0.01);
        assert!(root.v.length() < 1e-2);
    }
}
