//! Kinematic walking: forward kinematics rooted at a support foot that
//! follows whichever foot is lowest.

use crate::core::articulations::Multibody;
use crate::core::traversal::LinkTraversal;

/// Support-foot bookkeeping of one legged body.
#[derive(Debug, Clone)]
pub struct WalkState {
    /// Index into the body's foot list.
    support_foot: usize,
    support_height: f64,
    traversal: LinkTraversal,
}

fn foot_height(body: &Multibody, foot: usize) -> f64 {
    body.links[body.feet[foot]].pose.position.z
}

impl WalkState {
    /// Picks the lowest foot as support. `None` for bodies without feet.
    ///
    /// Exact ties go to the lowest foot index.
    pub fn new(body: &Multibody) -> Option<Self> {
        if !body.is_legged() {
            return None;
        }
        let mut support_foot = 0;
        for foot in 1..body.feet.len() {
            if foot_height(body, foot) < foot_height(body, support_foot) {
                support_foot = foot;
            }
        }
        Some(Self {
            support_foot,
            support_height: foot_height(body, support_foot),
            traversal: LinkTraversal::find(body, body.feet[support_foot], true, true),
        })
    }

    pub fn support_foot(&self) -> usize {
        self.support_foot
    }

    /// Link index of the support foot.
    pub fn support_link(&self, body: &Multibody) -> usize {
        body.feet[self.support_foot]
    }

    /// Support-foot height at the last switch decision.
    pub fn support_height(&self) -> f64 {
        self.support_height
    }

    pub fn traversal(&self) -> &LinkTraversal {
        &self.traversal
    }

    /// Runs one step of kinematics. Returns true when the support foot
    /// changed.
    pub fn step(&mut self, body: &mut Multibody) -> bool {
        self.traversal.calc_forward_kinematics(body, true, true);

        let current = self.support_foot;
        let mut next = current;
        for foot in 0..body.feet.len() {
            if foot != current && foot_height(body, foot) < foot_height(body, next) {
                next = foot;
            }
        }

        if next == current {
            self.support_height = foot_height(body, current);
            return false;
        }

        // new support takes over at the outgoing height so the body does not jump
        let height = foot_height(body, current);
        let link = body.feet[next];
        body.links[link].pose.position.z = height;
        self.support_foot = next;
        self.support_height = height;
        self.traversal = LinkTraversal::find(body, link, true, true);
        self.traversal.calc_forward_kinematics(body, true, true);
        log::trace!(
            "{}: support foot {} -> {} at z = {height:.6}",
            body.name,
            current,
            next
        );
        true
    }
}
