//! Simulation configuration: mode selections, solver tuning and defaults.

mod archive;
mod properties;

pub use archive::{Archive, ArchiveValue};
pub use properties::{Property, PropertyBound};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::dynamics::solver::SolverParameters;
use crate::utils::numeric::FloatingNumber;

/// Standard gravity (m/s²).
pub const DEFAULT_GRAVITY_ACCELERATION: f64 = 9.80665;

/// Default gravity vector applied in the world (Z-up).
pub const DEFAULT_GRAVITY: [f64; 3] = [0.0, 0.0, -DEFAULT_GRAVITY_ACCELERATION];

/// Default world timestep (in seconds).
pub const DEFAULT_TIME_STEP: f64 = 0.001;

/// How joint motion is produced during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DynamicsMode {
    #[default]
    ForwardDynamics,
    HighGainDynamics,
    Kinematics,
}

impl DynamicsMode {
    pub const ALL: [Self; 3] = [
        Self::ForwardDynamics,
        Self::HighGainDynamics,
        Self::Kinematics,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::ForwardDynamics => "Forward dynamics",
            Self::HighGainDynamics => "High-gain dynamics",
            Self::Kinematics => "Kinematics",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.symbol() == symbol)
    }
}

/// Numeric integrator used by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntegrationMode {
    #[default]
    Euler,
    RungeKutta,
}

impl IntegrationMode {
    pub const ALL: [Self; 2] = [Self::Euler, Self::RungeKutta];

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Euler => "Euler",
            Self::RungeKutta => "Runge Kutta",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.symbol() == symbol)
    }
}

/// Contact-solving backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverMode {
    #[default]
    GaussSeidel,
    Siconos,
    /// Placeholder slot for a backend that is not available yet.
    Reserved,
}

impl SolverMode {
    pub const ALL: [Self; 3] = [Self::GaussSeidel, Self::Siconos, Self::Reserved];

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::GaussSeidel => "GaussSeidel",
            Self::Siconos => "Siconos",
            Self::Reserved => "QMR(TBD)",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.symbol() == symbol)
    }
}

/// All selections and tuning values of a simulation run.
///
/// Values are plain data; cloning duplicates the configuration verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    dynamics_mode: DynamicsMode,
    integration_mode: IntegrationMode,
    solver_mode: SolverMode,
    gravity: DVec3,
    static_friction: f64,
    slip_friction: f64,
    contact_culling_distance: FloatingNumber,
    contact_culling_depth: FloatingNumber,
    error_criterion: FloatingNumber,
    max_num_iterations: u32,
    contact_correction_depth: FloatingNumber,
    contact_correction_velocity_ratio: FloatingNumber,
    restitution: f64,
    is_2d_mode: bool,
    kinematic_walking: bool,
    penalty_kp_coef: f64,
    penalty_kv_coef: f64,
    penalty_size_ratio: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::from_solver_defaults(&SolverParameters::default())
    }
}

impl SimulationConfig {
    /// Seeds every solver-backed value from the solver's own defaults.
    pub fn from_solver_defaults(defaults: &SolverParameters) -> Self {
        Self {
            dynamics_mode: DynamicsMode::ForwardDynamics,
            integration_mode: IntegrationMode::Euler,
            solver_mode: defaults.backend,
            gravity: DVec3::from_array(DEFAULT_GRAVITY),
            static_friction: defaults.static_friction,
            slip_friction: defaults.slip_friction,
            contact_culling_distance: defaults.contact_culling_distance.into(),
            contact_culling_depth: defaults.contact_culling_depth.into(),
            error_criterion: defaults.error_criterion.into(),
            max_num_iterations: defaults.max_iterations,
            contact_correction_depth: defaults.contact_correction_depth.into(),
            contact_correction_velocity_ratio: defaults.contact_correction_velocity_ratio.into(),
            restitution: defaults.coefficient_of_restitution,
            is_2d_mode: false,
            kinematic_walking: false,
            penalty_kp_coef: defaults.penalty_kp_coef,
            penalty_kv_coef: defaults.penalty_kv_coef,
            penalty_size_ratio: defaults.penalty_size_ratio,
        }
    }

    /// Solver parameters derived from this configuration.
    pub fn solver_parameters(&self) -> SolverParameters {
        SolverParameters {
            backend: self.solver_mode,
            static_friction: self.static_friction,
            slip_friction: self.slip_friction,
            contact_culling_distance: self.contact_culling_distance.value(),
            contact_culling_depth: self.contact_culling_depth.value(),
            coefficient_of_restitution: self.restitution,
            error_criterion: self.error_criterion.value(),
            max_iterations: self.max_num_iterations,
            contact_correction_depth: self.contact_correction_depth.value(),
            contact_correction_velocity_ratio: self.contact_correction_velocity_ratio.value(),
            penalty_kp_coef: self.penalty_kp_coef,
            penalty_kv_coef: self.penalty_kv_coef,
            penalty_size_ratio: self.penalty_size_ratio,
            is_2d_mode: self.is_2d_mode,
        }
    }

    pub fn dynamics_mode(&self) -> DynamicsMode {
        self.dynamics_mode
    }

    pub fn set_dynamics_mode(&mut self, mode: DynamicsMode) {
        self.dynamics_mode = mode;
    }

    pub fn integration_mode(&self) -> IntegrationMode {
        self.integration_mode
    }

    pub fn set_integration_mode(&mut self, mode: IntegrationMode) {
        self.integration_mode = mode;
    }

    pub fn solver_mode(&self) -> SolverMode {
        self.solver_mode
    }

    pub fn set_solver_mode(&mut self, mode: SolverMode) {
        self.solver_mode = mode;
    }

    pub fn gravity(&self) -> DVec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: DVec3) {
        self.gravity = gravity;
    }

    pub fn static_friction(&self) -> f64 {
        self.static_friction
    }

    pub fn set_static_friction(&mut self, value: f64) {
        self.static_friction = value;
    }

    pub fn slip_friction(&self) -> f64 {
        self.slip_friction
    }

    pub fn set_slip_friction(&mut self, value: f64) {
        self.slip_friction = value;
    }

    pub fn contact_culling_distance(&self) -> &FloatingNumber {
        &self.contact_culling_distance
    }

    pub fn set_contact_culling_distance(&mut self, value: f64) {
        self.contact_culling_distance.set_value(value);
    }

    pub fn contact_culling_depth(&self) -> &FloatingNumber {
        &self.contact_culling_depth
    }

    pub fn set_contact_culling_depth(&mut self, value: f64) {
        self.contact_culling_depth.set_value(value);
    }

    pub fn error_criterion(&self) -> &FloatingNumber {
        &self.error_criterion
    }

    pub fn set_error_criterion(&mut self, value: f64) {
        self.error_criterion.set_value(value);
    }

    pub fn max_num_iterations(&self) -> u32 {
        self.max_num_iterations
    }

    pub fn set_max_num_iterations(&mut self, value: u32) {
        self.max_num_iterations = value;
    }

    pub fn contact_correction_depth(&self) -> &FloatingNumber {
        &self.contact_correction_depth
    }

    pub fn set_contact_correction_depth(&mut self, value: f64) {
        self.contact_correction_depth.set_value(value);
    }

    pub fn contact_correction_velocity_ratio(&self) -> &FloatingNumber {
        &self.contact_correction_velocity_ratio
    }

    pub fn set_contact_correction_velocity_ratio(&mut self, value: f64) {
        self.contact_correction_velocity_ratio.set_value(value);
    }

    /// Coefficient of restitution.
    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    pub fn set_restitution(&mut self, value: f64) {
        self.restitution = value;
    }

    pub fn is_2d_mode(&self) -> bool {
        self.is_2d_mode
    }

    pub fn set_2d_mode(&mut self, on: bool) {
        self.is_2d_mode = on;
    }

    pub fn kinematic_walking(&self) -> bool {
        self.kinematic_walking
    }

    pub fn set_kinematic_walking(&mut self, on: bool) {
        self.kinematic_walking = on;
    }

    pub fn penalty_kp_coef(&self) -> f64 {
        self.penalty_kp_coef
    }

    pub fn set_penalty_kp_coef(&mut self, value: f64) {
        self.penalty_kp_coef = value;
    }

    pub fn penalty_kv_coef(&self) -> f64 {
        self.penalty_kv_coef
    }

    pub fn set_penalty_kv_coef(&mut self, value: f64) {
        self.penalty_kv_coef = value;
    }

    pub fn penalty_size_ratio(&self) -> f64 {
        self.penalty_size_ratio
    }

    pub fn set_penalty_size_ratio(&mut self, value: f64) {
        self.penalty_size_ratio = value;
    }
}
