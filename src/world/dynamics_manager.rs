use glam::DVec3;
use std::time::{Duration, Instant};

use super::collision_manager::{contact_wrenches, detect_ground_contacts};
use crate::config::{IntegrationMode, DEFAULT_GRAVITY, DEFAULT_TIME_STEP};
use crate::core::articulations::Multibody;
use crate::dynamics::{aba::ABASolver, integrator::Integrator, solver::SolverParameters};

/// How the world computes joint motion of a registered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardDynamicsDelegate {
    /// Joint accelerations follow from torques and inertia.
    #[default]
    ForwardDynamics,
    /// Every joint follows the trajectory stamped by its controller; only the
    /// root is integrated from forces.
    HighGain,
}

impl ForwardDynamicsDelegate {
    pub fn is_high_gain(&self) -> bool {
        matches!(self, Self::HighGain)
    }
}

/// Gravity, solver parameters and the integrator shared by every body.
#[derive(Debug, Clone)]
pub struct DynamicsManager {
    pub integrator: Integrator,
    pub gravity: DVec3,
    pub params: SolverParameters,
    pub ground_height: f64,
}

impl Default for DynamicsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicsManager {
    pub fn new() -> Self {
        Self {
            integrator: Integrator::new(DEFAULT_TIME_STEP, IntegrationMode::Euler),
            gravity: DVec3::from_array(DEFAULT_GRAVITY),
            params: SolverParameters::default(),
            ground_height: 0.0,
        }
    }

    /// Advances one body by a time step. Contact forces are re-evaluated at
    /// every integrator stage; the time spent on them is returned.
    pub fn advance(&self, body: &mut Multibody, delegate: ForwardDynamicsDelegate) -> Duration {
        let prescribed = delegate.is_high_gain();
        let mass = body.total_mass();
        let mut force_time = Duration::ZERO;
        self.integrator.step(body, |state| {
            let started = Instant::now();
            let contacts = detect_ground_contacts(state, self.ground_height, &self.params);
            let wrenches = contact_wrenches(state.num_links(), &contacts, mass, &self.params);
            force_time += started.elapsed();
            ABASolver::solve(state, self.gravity, &wrenches, prescribed)
        });
        if self.params.is_2d_mode {
            constrain_to_plane(body);
        }
        force_time
    }
}

/// Removes root motion leaving the x-z plane.
fn constrain_to_plane(body: &mut Multibody) {
    if !body.has_floating_root() {
        return;
    }
    let root = body.root_mut();
    root.v.y = 0.0;
    root.dv.y = 0.0;
    root.w.x = 0.0;
    root.w.z = 0.0;
    root.dw.x = 0.0;
    root.dw.z = 0.0;
    body.calc_forward_kinematics(true, true);
}
