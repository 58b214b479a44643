//! Core types describing articulated bodies, their controllers and kinematic traversals.

pub mod articulations;
pub mod body;
pub mod controller;
pub mod traversal;
pub mod types;

pub use articulations::{JointType, Link, Multibody};
pub use body::{BodyId, SimulationBody};
pub use controller::{
    Controller, ControllerContext, ControllerKind, HighGainController, ReferenceMotion,
};
pub use traversal::LinkTraversal;
pub use types::{MassProperties, Transform};
