//! Simulation dynamics modules: articulated-body accelerations, integration and
//! solver parameters.

pub mod aba;
pub mod integrator;
pub mod solver;

pub use aba::{ABASolver, Accelerations};
pub use integrator::Integrator;
pub use solver::SolverParameters;
