//! The stepping engine: run setup, per-step mode dispatch, forced poses and
//! kinematic walking.

mod forced_pose;
mod registry;
mod walk;

pub use forced_pose::{apply_forced_pose, ForcedPoseHandle, ForcedPoseRequest};
pub use registry::{reset_body, select_delegate};
pub use walk::WalkState;

use std::time::Duration;

use registry::BodyRegistry;

use crate::{
    config::{DynamicsMode, SimulationConfig},
    core::{
        articulations::Multibody,
        body::{BodyId, SimulationBody},
        controller::ControllerContext,
        types::Transform,
    },
    error::{Result, SimError},
    utils::{allocator::EntityId, logging::ScopedTimer},
    world::{ArticulatedWorld, Collision, DynamicsWorld, ForwardDynamicsDelegate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
    /// A step failed; only re-initialization clears this.
    Aborted,
}

/// Settings a run was started with. Configuration edits made during the run
/// apply at the next initialization.
#[derive(Debug, Clone, Copy)]
struct RunSettings {
    mode: DynamicsMode,
    walking: bool,
}

/// Drives a [`DynamicsWorld`] through a simulation run.
pub struct Simulator<W: DynamicsWorld = ArticulatedWorld> {
    config: SimulationConfig,
    world: W,
    time_step: f64,
    registry: BodyRegistry,
    forced_pose: ForcedPoseHandle,
    run: RunSettings,
    state: RunState,
    clear_forces_before_step: bool,
    step_count: u64,
    controller_messages: Vec<String>,
}

impl Simulator<ArticulatedWorld> {
    /// Creates a simulator over the bundled [`ArticulatedWorld`].
    pub fn new(config: SimulationConfig, time_step: f64) -> Result<Self> {
        Self::with_world(ArticulatedWorld::new(), config, time_step)
    }
}

fn check_time_step(time_step: f64) -> Result<f64> {
    if time_step.is_finite() && time_step > 0.0 {
        Ok(time_step)
    } else {
        Err(SimError::InvalidTimeStep(time_step))
    }
}

impl<W: DynamicsWorld> Simulator<W> {
    pub fn with_world(world: W, config: SimulationConfig, time_step: f64) -> Result<Self> {
        Ok(Self {
            run: RunSettings {
                mode: config.dynamics_mode(),
                walking: config.kinematic_walking(),
            },
            config,
            world,
            time_step: check_time_step(time_step)?,
            registry: BodyRegistry::default(),
            forced_pose: ForcedPoseHandle::default(),
            state: RunState::Idle,
            clear_forces_before_step: false,
            step_count: 0,
            controller_messages: Vec::new(),
        })
    }

    /// A configuration seeded from the world's own solver defaults.
    pub fn default_config(&self) -> SimulationConfig {
        SimulationConfig::from_solver_defaults(&self.world.solver_defaults())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Mutable configuration. Edits take effect at the next
    /// [`initialize_simulation`](Self::initialize_simulation).
    pub fn config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn set_time_step(&mut self, time_step: f64) -> Result<()> {
        self.time_step = check_time_step(time_step)?;
        Ok(())
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Dynamics mode of the current run.
    pub fn run_mode(&self) -> DynamicsMode {
        self.run.mode
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn current_time(&self) -> f64 {
        self.world.current_time()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn collisions(&self) -> &[Collision] {
        self.world.collisions()
    }

    pub fn num_bodies(&self) -> usize {
        self.registry.len()
    }

    /// World handle of a registered body.
    pub fn handle(&self, id: BodyId) -> Option<EntityId> {
        self.registry.handle(id)
    }

    pub fn body(&self, id: BodyId) -> Option<&Multibody> {
        self.world.body(self.registry.handle(id)?)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Multibody> {
        let handle = self.registry.handle(id)?;
        self.world.body_mut(handle)
    }

    pub fn delegate(&self, id: BodyId) -> Option<ForwardDynamicsDelegate> {
        self.world.delegate(self.registry.handle(id)?)
    }

    pub fn walk_state(&self, id: BodyId) -> Option<&WalkState> {
        self.registry.get(id)?.walk.as_ref()
    }

    /// Messages of controllers that failed to start in the current run.
    pub fn controller_messages(&self) -> &[String] {
        &self.controller_messages
    }

    /// Handle for issuing forced poses, possibly from another thread.
    pub fn forced_pose_handle(&self) -> ForcedPoseHandle {
        self.forced_pose.clone()
    }

    pub fn set_forced_body_pose(&self, id: BodyId, pose: Transform) -> bool {
        self.forced_pose.request(id, pose)
    }

    pub fn clear_forced_body_poses(&self) {
        self.forced_pose.cancel();
    }

    /// Sets up a run: pushes the configuration into the world, starts the
    /// controllers and registers every body whose controller started.
    pub fn initialize_simulation(&mut self, bodies: Vec<SimulationBody>) -> Result<()> {
        let _timer = ScopedTimer::new("simulator::initialize");
        let time_step = check_time_step(self.time_step)?;
        let config = &self.config;

        self.state = RunState::Idle;
        self.step_count = 0;
        self.controller_messages.clear();
        self.run = RunSettings {
            mode: config.dynamics_mode(),
            walking: config.kinematic_walking(),
        };

        let world = &mut self.world;
        world.set_integration_method(config.integration_mode());
        world.set_gravity(config.gravity());
        world.set_time_step(time_step);
        world.set_current_time(0.0);
        world.set_solver_backend(config.solver_mode());
        world.set_error_criterion(config.error_criterion().value());
        world.set_max_iterations(config.max_num_iterations());
        world.set_contact_correction(
            config.contact_correction_depth().value(),
            config.contact_correction_velocity_ratio().value(),
        );
        self.clear_forces_before_step = true;

        world.clear_bodies();
        let context = ControllerContext { time_step };
        let mut admitted = Vec::with_capacity(bodies.len());
        for mut sim_body in bodies {
            if let Some(controller) = sim_body.controller.as_mut() {
                if let Err(source) = controller.start(&sim_body.body, &context) {
                    let failure = SimError::ControllerStart {
                        body: sim_body.id,
                        source,
                    };
                    log::warn!("{failure}");
                    self.controller_messages.push(failure.to_string());
                    continue;
                }
            }
            admitted.push(sim_body);
        }
        self.registry
            .initialize(world, admitted, self.run.mode, self.run.walking)?;

        world.set_friction(config.static_friction(), config.slip_friction());
        world.set_contact_culling_distance(config.contact_culling_distance().value());
        world.set_contact_culling_depth(config.contact_culling_depth().value());
        world.set_coefficient_of_restitution(config.restitution());
        world.set_2d_mode(config.is_2d_mode());
        world.set_penalty_coefficients(
            config.penalty_kp_coef(),
            config.penalty_kv_coef(),
            config.penalty_size_ratio(),
        );
        world.initialize();

        self.forced_pose.set_members(self.registry.ids());
        self.state = RunState::Running;
        log::info!(
            "simulation initialized: {} bodies, {}, dt = {time_step}s",
            self.registry.len(),
            self.run.mode.symbol()
        );
        Ok(())
    }

    /// Advances the run by one time step.
    pub fn step(&mut self) -> Result<()> {
        match self.state {
            RunState::Idle => return Err(SimError::NotInitialized),
            RunState::Aborted => return Err(SimError::RunAborted),
            RunState::Running => {}
        }
        let _timer = match Duration::try_from_secs_f64(self.time_step) {
            Ok(budget) => ScopedTimer::with_budget("simulator::step", budget),
            Err(_) => ScopedTimer::new("simulator::step"),
        };

        if self.clear_forces_before_step {
            self.world.clear_external_forces();
        }
        self.drive_controllers_output();

        if self.run.mode == DynamicsMode::Kinematics {
            self.step_kinematics();
            let time = self.world.current_time() + self.time_step;
            self.world.set_current_time(time);
        } else if let Err(err) = self.world.advance_one_step() {
            self.state = RunState::Aborted;
            log::error!("step {} failed: {err}", self.step_count);
            return Err(err.into());
        }

        self.advance_controllers();
        self.run_forced_pose_hook();
        self.step_count += 1;
        Ok(())
    }

    /// Tears the run down: controllers stopped, bodies dropped, forced poses
    /// cancelled.
    pub fn finalize_simulation(&mut self) {
        if self.state == RunState::Idle && self.registry.is_empty() {
            return;
        }
        log::info!(
            "simulation finalized after {} steps at t = {:.6}s",
            self.step_count,
            self.world.current_time()
        );
        self.registry.clear();
        self.world.clear_bodies();
        self.forced_pose.cancel();
        self.forced_pose.set_members(std::iter::empty());
        self.clear_forces_before_step = false;
        self.state = RunState::Idle;
    }

    fn drive_controllers_output(&mut self) {
        let world = &mut self.world;
        for rb in self.registry.iter_mut() {
            let (Some(controller), Some(body)) = (rb.controller.as_mut(), world.body_mut(rb.handle))
            else {
                continue;
            };
            controller.input(body);
            controller.output(body);
        }
    }

    fn advance_controllers(&mut self) {
        for rb in self.registry.iter_mut() {
            let Some(controller) = rb.controller.as_mut() else {
                continue;
            };
            if !controller.control() && !rb.controller_done {
                rb.controller_done = true;
                log::debug!("{} finished; holding its last output", controller.name());
            }
        }
    }

    fn step_kinematics(&mut self) {
        let walking = self.run.walking;
        let world = &mut self.world;
        for rb in self.registry.iter_mut() {
            let Some(body) = world.body_mut(rb.handle) else {
                continue;
            };
            match rb.walk.as_mut() {
                Some(walk) if walking => {
                    walk.step(body);
                }
                _ => body.calc_forward_kinematics(true, true),
            }
        }
    }

    fn run_forced_pose_hook(&mut self) {
        let Some(request) = self.forced_pose.take() else {
            return;
        };
        let Some(body) = self
            .registry
            .handle(request.body)
            .and_then(|handle| self.world.body_mut(handle))
        else {
            return;
        };
        apply_forced_pose(body, request.pose);
        log::trace!("forced pose applied to {:?}", request.body);
    }
}

impl<W: DynamicsWorld> Drop for Simulator<W> {
    fn drop(&mut self) {
        self.registry.clear();
    }
}
