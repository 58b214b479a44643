//! Error types for the stepping engine and its collaborators.

use thiserror::Error;

use crate::core::body::BodyId;
use crate::utils::allocator::EntityId;

/// Failures reported by a [`DynamicsWorld`](crate::world::DynamicsWorld).
#[derive(Debug, Error)]
pub enum WorldError {
    /// A body could not be registered (empty link tree, broken parent order).
    #[error("malformed body `{name}`: {reason}")]
    MalformedBody { name: String, reason: String },

    /// A handle did not resolve to a body of the current run.
    #[error("unknown body handle {0:?}")]
    UnknownHandle(EntityId),

    /// The integrated state is no longer finite.
    #[error("integration diverged for body `{name}` at t = {time:.6}s")]
    Diverged { name: String, time: f64 },
}

/// Precondition violations raised when a controller is started.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error("Reference motion is empty.")]
    EmptyReferenceMotion,

    #[error("The frame rate of the reference motion ({0} fps) is not a positive number.")]
    InvalidFrameRate(f64),

    #[error(
        "The frame rate of the reference motion ({motion_rate} fps) is different from the world frame rate ({world_rate} fps)."
    )]
    FrameRateMismatch { motion_rate: f64, world_rate: f64 },
}

/// Errors surfaced by the [`Simulator`](crate::simulator::Simulator).
#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation has not been initialized")]
    NotInitialized,

    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    /// An earlier step failed; the run must be re-initialized.
    #[error("run aborted after a failed step")]
    RunAborted,

    #[error("controller of body {body:?} failed to start: {source}")]
    ControllerStart {
        body: BodyId,
        #[source]
        source: ControllerError,
    },

    #[error(transparent)]
    World(#[from] WorldError),
}

/// Convenient Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SimError>;
