//! Parameters of the constraint/contact force solver.

use serde::{Deserialize, Serialize};

use crate::config::SolverMode;

pub const DEFAULT_STATIC_FRICTION: f64 = 1.0;
pub const DEFAULT_SLIP_FRICTION: f64 = 0.5;
pub const DEFAULT_CONTACT_CULLING_DISTANCE: f64 = 0.005;
pub const DEFAULT_CONTACT_CULLING_DEPTH: f64 = 0.05;
pub const DEFAULT_COEFFICIENT_OF_RESTITUTION: f64 = 0.0;
pub const DEFAULT_ERROR_CRITERION: f64 = 1.0e-3;
pub const DEFAULT_MAX_ITERATIONS: u32 = 500;
pub const DEFAULT_CONTACT_CORRECTION_DEPTH: f64 = 1.0e-4;
pub const DEFAULT_CONTACT_CORRECTION_VELOCITY_RATIO: f64 = 1.0;
/// Penalty stiffness per kilogram of body mass (N/m/kg).
pub const DEFAULT_PENALTY_KP_COEF: f64 = 1.0e4;
/// Penalty damping per kilogram of body mass (N·s/m/kg).
pub const DEFAULT_PENALTY_KV_COEF: f64 = 2.0e2;
pub const DEFAULT_PENALTY_SIZE_RATIO: f64 = 1.0;

/// Every tunable the contact solver exposes, with its built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverParameters {
    pub backend: SolverMode,
    pub static_friction: f64,
    pub slip_friction: f64,
    pub contact_culling_distance: f64,
    pub contact_culling_depth: f64,
    pub coefficient_of_restitution: f64,
    pub error_criterion: f64,
    pub max_iterations: u32,
    pub contact_correction_depth: f64,
    pub contact_correction_velocity_ratio: f64,
    pub penalty_kp_coef: f64,
    pub penalty_kv_coef: f64,
    pub penalty_size_ratio: f64,
    pub is_2d_mode: bool,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            backend: SolverMode::GaussSeidel,
            static_friction: DEFAULT_STATIC_FRICTION,
            slip_friction: DEFAULT_SLIP_FRICTION,
            contact_culling_distance: DEFAULT_CONTACT_CULLING_DISTANCE,
            contact_culling_depth: DEFAULT_CONTACT_CULLING_DEPTH,
            coefficient_of_restitution: DEFAULT_COEFFICIENT_OF_RESTITUTION,
            error_criterion: DEFAULT_ERROR_CRITERION,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            contact_correction_depth: DEFAULT_CONTACT_CORRECTION_DEPTH,
            contact_correction_velocity_ratio: DEFAULT_CONTACT_CORRECTION_VELOCITY_RATIO,
            penalty_kp_coef: DEFAULT_PENALTY_KP_COEF,
            penalty_kv_coef: DEFAULT_PENALTY_KV_COEF,
            penalty_size_ratio: DEFAULT_PENALTY_SIZE_RATIO,
            is_2d_mode: false,
        }
    }
}
