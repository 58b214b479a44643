//! bc_sim – stepping engine for articulated rigid-body simulation.
//!
//! The crate advances articulated mechanisms through time in one of three
//! dynamics modes (forward dynamics, high-gain servo dynamics, pure
//! kinematics). The [`Simulator`] registers bodies into a [`DynamicsWorld`],
//! dispatches every step by mode, injects externally forced poses from other
//! threads and, in kinematics mode, walks legged bodies on their lowest foot.
//! [`ArticulatedWorld`] is the bundled world: articulated-body dynamics over
//! a penalty-contact ground plane.

pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod simulator;
pub mod utils;
pub mod world;

pub use glam::{DMat3, DQuat, DVec3};

pub use config::{
    Archive, ArchiveValue, DynamicsMode, IntegrationMode, Property, PropertyBound,
    SimulationConfig, SolverMode,
};
pub use self::core::{
    articulations::{JointType, Link, Multibody},
    body::{BodyId, SimulationBody},
    controller::{
        Controller, ControllerContext, ControllerKind, HighGainController, ReferenceMotion,
    },
    traversal::LinkTraversal,
    types::{MassProperties, Transform},
};
pub use dynamics::{ABASolver, Integrator, SolverParameters};
pub use error::{ControllerError, Result, SimError, WorldError};
pub use simulator::{ForcedPoseHandle, ForcedPoseRequest, Simulator, WalkState};
pub use utils::allocator::{Arena, EntityId, GenerationalId};
pub use utils::numeric::FloatingNumber;
pub use world::{ArticulatedWorld, Collision, DynamicsWorld, ForwardDynamicsDelegate};
