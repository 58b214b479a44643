//! Controller abstraction attached to simulated bodies, and the high-gain
//! reference-motion controller.

use crate::core::articulations::Multibody;
use crate::error::ControllerError;

/// Tolerance between the reference frame rate and the world rate.
pub const FRAME_RATE_TOLERANCE: f64 = 1.0e-6;

/// Capability tag the registry queries to pick a dynamics delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerKind {
    /// Drives joints through torques; the body follows forward dynamics.
    #[default]
    Torque,
    /// Dictates joint positions directly (position servo).
    HighGain,
}

/// What a controller learns about the run when it is started.
#[derive(Debug, Clone, Copy)]
pub struct ControllerContext {
    pub time_step: f64,
}

/// A per-body controller driven once per simulation step.
///
/// The engine calls `input` and `output` before the dynamics step and
/// `control` after it.
pub trait Controller: Send {
    fn name(&self) -> &str;

    fn kind(&self) -> ControllerKind {
        ControllerKind::Torque
    }

    fn start(&mut self, body: &Multibody, ctx: &ControllerContext) -> Result<(), ControllerError>;

    fn input(&mut self, _body: &Multibody) {}

    /// Advances internal state. Returns false once the controller has
    /// nothing further to do.
    fn control(&mut self) -> bool;

    fn output(&mut self, body: &mut Multibody);

    fn stop(&mut self) {}
}

/// A time-indexed sequence of joint-position frames.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMotion {
    pub frame_rate: f64,
    pub frames: Vec<Vec<f64>>,
}

impl ReferenceMotion {
    pub fn new(frame_rate: f64, frames: Vec<Vec<f64>>) -> Self {
        Self { frame_rate, frames }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of joint channels, taken as the shortest frame.
    pub fn num_parts(&self) -> usize {
        self.frames.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn time_step(&self) -> f64 {
        1.0 / self.frame_rate
    }

    pub fn frame(&self, index: usize) -> &[f64] {
        &self.frames[index]
    }
}

/// Replays a [`ReferenceMotion`] by stamping joint position, velocity and
/// acceleration on every step.
#[derive(Debug, Clone)]
pub struct HighGainController {
    name: String,
    motion: ReferenceMotion,
    current_frame: usize,
    last_frame: usize,
    joints: Vec<usize>,
}

impl HighGainController {
    pub fn new(motion_name: &str, motion: ReferenceMotion) -> Self {
        Self {
            name: format!("HighGain Controller with {motion_name}"),
            motion,
            current_frame: 0,
            last_frame: 0,
            joints: Vec::new(),
        }
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn motion(&self) -> &ReferenceMotion {
        &self.motion
    }
}

impl Controller for HighGainController {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ControllerKind {
        ControllerKind::HighGain
    }

    fn start(&mut self, body: &Multibody, ctx: &ControllerContext) -> Result<(), ControllerError> {
        if self.motion.num_frames() == 0 {
            return Err(ControllerError::EmptyReferenceMotion);
        }
        let rate = self.motion.frame_rate;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ControllerError::InvalidFrameRate(rate));
        }
        let world_rate = 1.0 / ctx.time_step;
        if (rate - world_rate).abs() > FRAME_RATE_TOLERANCE {
            return Err(ControllerError::FrameRateMismatch {
                motion_rate: rate,
                world_rate,
            });
        }

        self.current_frame = 0;
        self.last_frame = self.motion.num_frames() - 1;
        let num_joints = self.motion.num_parts();
        self.joints = body.joint_indices().into_iter().take(num_joints).collect();
        log::debug!(
            "{}: {} frames at {} fps driving {} joints",
            self.name,
            self.motion.num_frames(),
            self.motion.frame_rate,
            self.joints.len()
        );
        Ok(())
    }

    fn control(&mut self) -> bool {
        if self.current_frame >= self.last_frame {
            self.current_frame = self.last_frame;
            return false;
        }
        self.current_frame += 1;
        true
    }

    fn output(&mut self, body: &mut Multibody) {
        let prev = self.current_frame.saturating_sub(1);
        let next = (self.current_frame + 1).min(self.last_frame);
        let q0 = self.motion.frame(prev);
        let q1 = self.motion.frame(self.current_frame);
        let q2 = self.motion.frame(next);

        let dt = self.motion.time_step();
        let dt2 = dt * dt;
        for (part, &link_idx) in self.joints.iter().enumerate() {
            let link = &mut body.links[link_idx];
            link.q = q1[part];
            link.dq = (q2[part] - q1[part]) / dt;
            link.ddq = (q2[part] - 2.0 * q1[part] + q0[part]) / dt2;
        }
    }
}
