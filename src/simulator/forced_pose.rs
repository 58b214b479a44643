//! Single-slot mailbox for stamping a body pose between steps.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::core::articulations::Multibody;
use crate::core::body::BodyId;
use crate::core::types::Transform;
use crate::utils::spatial::SpatialVec;

/// Target pose for the root link of one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForcedPoseRequest {
    pub body: BodyId,
    pub pose: Transform,
}

#[derive(Debug, Default)]
struct Channel {
    slot: Mutex<Option<ForcedPoseRequest>>,
    armed: AtomicBool,
    members: RwLock<HashSet<BodyId>>,
}

/// Cloneable, thread-safe handle to the forced-pose channel of a simulator.
///
/// Producers call [`request`](Self::request) from any thread; the simulator
/// consumes the request after its next dynamics step.
#[derive(Debug, Clone, Default)]
pub struct ForcedPoseHandle {
    inner: Arc<Channel>,
}

impl ForcedPoseHandle {
    /// Stores `pose` for `body`, replacing any unconsumed request, and arms
    /// the post-step hook. Bodies outside the current run are ignored and
    /// leave the hook untouched; the return value tells which happened.
    pub fn request(&self, body: BodyId, pose: Transform) -> bool {
        if !self.inner.members.read().contains(&body) {
            log::debug!("forced pose for {body:?} ignored: body is not part of the run");
            return false;
        }
        *self.inner.slot.lock() = Some(ForcedPoseRequest { body, pose });
        if !self.inner.armed.swap(true, Ordering::AcqRel) {
            log::trace!("forced pose hook armed");
        }
        true
    }

    /// Disarms the hook. Later steps inject nothing until the next request.
    pub fn cancel(&self) {
        if self.inner.armed.swap(false, Ordering::AcqRel) {
            log::trace!("forced pose hook disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::Acquire)
    }

    /// The unconsumed request, if any.
    pub fn pending(&self) -> Option<ForcedPoseRequest> {
        *self.inner.slot.lock()
    }

    pub(crate) fn set_members(&self, members: impl IntoIterator<Item = BodyId>) {
        let mut current = self.inner.members.write();
        current.clear();
        current.extend(members);
    }

    /// Empties the slot. Returns `None` when disarmed or nothing is pending.
    pub(crate) fn take(&self) -> Option<ForcedPoseRequest> {
        if !self.is_armed() {
            return None;
        }
        self.inner.slot.lock().take()
    }
}

/// Teleports the root link: pose replaced, root velocities zeroed, link
/// kinematics recomputed.
pub fn apply_forced_pose(body: &mut Multibody, pose: Transform) {
    if body.links.is_empty() {
        return;
    }
    let root = body.root_mut();
    root.pose = pose;
    root.v = glam::DVec3::ZERO;
    root.w = glam::DVec3::ZERO;
    body.spatial_velocity = SpatialVec::ZERO;
    body.calc_spatial_forward_kinematics();
}
