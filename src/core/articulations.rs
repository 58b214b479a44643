use super::types::{MassProperties, Transform};
use crate::utils::spatial::SpatialVec;
use glam::{DQuat, DVec3};

/// Type of joint connecting a link to its parent in reduced coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointType {
    /// 1-DOF rotational joint about `axis` (link frame).
    Revolute { axis: DVec3 },
    /// 1-DOF translational joint along `axis` (link frame).
    Prismatic { axis: DVec3 },
    /// 0-DOF rigid connection. On the root link: welded to the world.
    Fixed,
    /// Floating root. Only meaningful on link 0; the root pose and velocity
    /// carry its six degrees of freedom.
    Free,
}

impl JointType {
    /// Returns the number of joint-space degrees of freedom.
    pub fn dofs(&self) -> usize {
        match self {
            JointType::Revolute { .. } | JointType::Prismatic { .. } => 1,
            JointType::Fixed | JointType::Free => 0,
        }
    }

    /// Local transform across the joint for joint coordinate `q`.
    pub fn transform(&self, q: f64) -> Transform {
        match self {
            JointType::Revolute { axis } => Transform {
                rotation: DQuat::from_axis_angle(*axis, q),
                ..Transform::default()
            },
            JointType::Prismatic { axis } => Transform::from_position(*axis * q),
            JointType::Fixed | JointType::Free => Transform::default(),
        }
    }
}

/// A single node in the articulated body tree, with its joint state.
#[derive(Debug, Clone)]
pub struct Link {
    pub name: String,
    /// Index of the parent link. None if this is the root link.
    pub parent_idx: Option<usize>,
    /// The joint connecting this link to its parent.
    pub joint_type: JointType,
    /// Static transform from parent link frame to this link's joint frame (at q=0).
    pub parent_to_joint: Transform,
    pub mass_properties: MassProperties,

    /// Joint position, velocity, acceleration and actuation torque/force.
    pub q: f64,
    pub dq: f64,
    pub ddq: f64,
    pub u: f64,

    /// World pose of the link frame.
    pub pose: Transform,
    /// World linear velocity of the link origin.
    pub v: DVec3,
    /// World angular velocity.
    pub w: DVec3,
    pub dv: DVec3,
    pub dw: DVec3,

    /// Accumulated external force and moment about the world origin.
    pub f_ext: DVec3,
    pub tau_ext: DVec3,
}

impl Link {
    pub fn new(name: &str, parent: Option<usize>, joint: JointType) -> Self {
        Self {
            name: name.into(),
            parent_idx: parent,
            joint_type: joint,
            parent_to_joint: Transform::default(),
            mass_properties: MassProperties::default(),
            q: 0.0,
            dq: 0.0,
            ddq: 0.0,
            u: 0.0,
            pose: Transform::default(),
            v: DVec3::ZERO,
            w: DVec3::ZERO,
            dv: DVec3::ZERO,
            dw: DVec3::ZERO,
            f_ext: DVec3::ZERO,
            tau_ext: DVec3::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: DVec3) -> Self {
        self.parent_to_joint = Transform::from_position(offset);
        self
    }

    pub fn with_mass(mut self, props: MassProperties) -> Self {
        self.mass_properties = props;
        self
    }

    /// Transform from the parent link frame to this link frame at the current `q`.
    pub fn relative_transform(&self) -> Transform {
        self.parent_to_joint.combine(&self.joint_type.transform(self.q))
    }

    /// World-frame joint axis, given the link's current pose.
    pub fn world_axis(&self) -> DVec3 {
        match self.joint_type {
            JointType::Revolute { axis } | JointType::Prismatic { axis } => {
                self.pose.rotation * axis
            }
            JointType::Fixed | JointType::Free => DVec3::ZERO,
        }
    }

    /// External wrench as a spatial force at the world origin.
    pub fn external_wrench(&self) -> SpatialVec {
        SpatialVec::new(self.tau_ext, self.f_ext)
    }

    fn joint_motion(&self) -> JointMotion {
        let s = self.world_axis();
        match self.joint_type {
            JointType::Revolute { .. } => JointMotion {
                ang_rate: s * self.dq,
                ang_acc: s * self.ddq,
                ..JointMotion::default()
            },
            JointType::Prismatic { .. } => JointMotion {
                lin_rate: s * self.dq,
                lin_acc: s * self.ddq,
                ..JointMotion::default()
            },
            JointType::Fixed | JointType::Free => JointMotion::default(),
        }
    }
}

/// World-frame rates contributed by a single joint.
#[derive(Debug, Default, Clone, Copy)]
struct JointMotion {
    ang_rate: DVec3,
    lin_rate: DVec3,
    ang_acc: DVec3,
    lin_acc: DVec3,
}

/// A tree of links forming one articulated mechanism.
#[derive(Debug, Clone)]
pub struct Multibody {
    pub name: String,
    /// Links ordered such that a parent always appears before its children.
    pub links: Vec<Link>,
    /// Indices of foot links. A body with feet is considered legged.
    pub feet: Vec<usize>,
    /// Spatial velocity of the root expressed at the world origin.
    pub spatial_velocity: SpatialVec,
    pub spatial_acceleration: SpatialVec,
}

impl Multibody {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            links: Vec::new(),
            feet: Vec::new(),
            spatial_velocity: SpatialVec::ZERO,
            spatial_acceleration: SpatialVec::ZERO,
        }
    }

    /// Adds a link and returns its index.
    pub fn add_link(&mut self, link: Link) -> usize {
        let idx = self.links.len();
        self.links.push(link);
        idx
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn root(&self) -> &Link {
        &self.links[0]
    }

    pub fn root_mut(&mut self) -> &mut Link {
        &mut self.links[0]
    }

    pub fn has_floating_root(&self) -> bool {
        self.links
            .first()
            .is_some_and(|root| root.joint_type == JointType::Free)
    }

    /// Link indices of actuated joints, in link order.
    pub fn joint_indices(&self) -> Vec<usize> {
        self.links
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, link)| link.joint_type.dofs() > 0)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn num_joints(&self) -> usize {
        self.joint_indices().len()
    }

    pub fn set_feet(&mut self, feet: Vec<usize>) {
        self.feet = feet;
    }

    pub fn is_legged(&self) -> bool {
        !self.feet.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.links.iter().map(|l| l.mass_properties.mass).sum()
    }

    /// Children of each link, derived from the parent indices.
    pub fn children(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.links.len()];
        for (idx, link) in self.links.iter().enumerate() {
            if let Some(parent) = link.parent_idx {
                if parent < children.len() {
                    children[parent].push(idx);
                }
            }
        }
        children
    }

    /// Checks the structural invariants the kinematics rely on.
    pub fn validate(&self) -> Result<(), String> {
        if self.links.is_empty() {
            return Err("body has no links".into());
        }
        if self.links[0].parent_idx.is_some() {
            return Err("root link must not have a parent".into());
        }
        for (idx, link) in self.links.iter().enumerate().skip(1) {
            match link.parent_idx {
                Some(parent) if parent < idx => {}
                Some(parent) => {
                    return Err(format!(
                        "link `{}` ({idx}) appears before its parent ({parent})",
                        link.name
                    ))
                }
                None => return Err(format!("link `{}` ({idx}) has no parent", link.name)),
            }
            if link.joint_type == JointType::Free {
                return Err(format!("link `{}` uses a free joint below the root", link.name));
            }
        }
        if let Some(&foot) = self.feet.iter().find(|&&f| f >= self.links.len()) {
            return Err(format!("foot index {foot} is out of range"));
        }
        Ok(())
    }

    /// Zeroes root motion, joint velocities, accelerations and torques.
    pub fn reset_kinetic_state(&mut self) {
        if let Some(root) = self.links.first_mut() {
            root.v = DVec3::ZERO;
            root.w = DVec3::ZERO;
            root.dv = DVec3::ZERO;
            root.dw = DVec3::ZERO;
        }
        self.spatial_velocity = SpatialVec::ZERO;
        self.spatial_acceleration = SpatialVec::ZERO;
        for link in &mut self.links {
            link.u = 0.0;
            link.dq = 0.0;
            link.ddq = 0.0;
        }
    }

    /// Accumulates `force` applied at world point `point` on link `idx`.
    pub fn apply_force_at(&mut self, idx: usize, force: DVec3, point: DVec3) {
        if let Some(link) = self.links.get_mut(idx) {
            link.f_ext += force;
            link.tau_ext += point.cross(force);
        }
    }

    pub fn clear_external_forces(&mut self) {
        for link in &mut self.links {
            link.f_ext = DVec3::ZERO;
            link.tau_ext = DVec3::ZERO;
        }
    }

    pub fn has_external_forces(&self) -> bool {
        self.links
            .iter()
            .any(|l| l.f_ext != DVec3::ZERO || l.tau_ext != DVec3::ZERO)
    }

    /// Recomputes every link pose from the root pose and joint positions,
    /// optionally propagating velocities and accelerations.
    pub fn calc_forward_kinematics(&mut self, calc_velocity: bool, calc_acceleration: bool) {
        for idx in 1..self.links.len() {
            self.propagate_to_child(idx, calc_velocity, calc_acceleration);
        }
        if calc_velocity {
            self.update_spatial_velocity();
        }
        if calc_acceleration {
            self.update_spatial_acceleration();
        }
    }

    /// Forward kinematics with velocities, keeping the root spatial velocity
    /// consistent with its linear and angular velocity.
    pub fn calc_spatial_forward_kinematics(&mut self) {
        self.calc_forward_kinematics(true, false);
    }

    /// Computes link `child` from its parent's state.
    pub(crate) fn propagate_to_child(&mut self, child: usize, calc_v: bool, calc_a: bool) {
        let Some(parent) = self.links[child].parent_idx else {
            return;
        };
        let parent_pose = self.links[parent].pose;
        let (pv, pw, pdv, pdw) = {
            let p = &self.links[parent];
            (p.v, p.w, p.dv, p.dw)
        };

        let link = &mut self.links[child];
        link.pose = parent_pose.combine(&link.relative_transform());
        if !(calc_v || calc_a) {
            return;
        }

        let m = link.joint_motion();
        let r = link.pose.position - parent_pose.position;
        if calc_v {
            link.w = pw + m.ang_rate;
            link.v = pv + pw.cross(r) + m.lin_rate;
        }
        if calc_a {
            link.dw = pdw + pw.cross(m.ang_rate) + m.ang_acc;
            link.dv = pdv + pdw.cross(r) + pw.cross(pw.cross(r)) + 2.0 * pw.cross(m.lin_rate)
                + m.lin_acc;
        }
    }

    /// Computes the parent of link `child` from the child's state, inverting
    /// the joint. Used by traversals rooted below the root link.
    pub(crate) fn propagate_to_parent(&mut self, child: usize, calc_v: bool, calc_a: bool) {
        let Some(parent) = self.links[child].parent_idx else {
            return;
        };
        let c = &self.links[child];
        let child_pose = c.pose;
        let (cv, cw, cdv, cdw) = (c.v, c.w, c.dv, c.dw);
        let rel_inv = c.relative_transform().inverse();
        let m = c.joint_motion();

        let link = &mut self.links[parent];
        link.pose = child_pose.combine(&rel_inv);
        if !(calc_v || calc_a) {
            return;
        }

        let r = child_pose.position - link.pose.position;
        let pw = cw - m.ang_rate;
        if calc_v {
            link.w = pw;
            link.v = cv - pw.cross(r) - m.lin_rate;
        }
        if calc_a {
            let pdw = cdw - pw.cross(m.ang_rate) - m.ang_acc;
            link.dw = pdw;
            link.dv = cdv - pdw.cross(r) - pw.cross(pw.cross(r)) - 2.0 * pw.cross(m.lin_rate)
                - m.lin_acc;
        }
    }

    pub(crate) fn update_spatial_velocity(&mut self) {
        let root = &self.links[0];
        self.spatial_velocity = SpatialVec::new(root.w, root.v - root.w.cross(root.pose.position));
    }

    pub(crate) fn update_spatial_acceleration(&mut self) {
        let root = &self.links[0];
        let p = root.pose.position;
        // d/dt (v - w x p) = dv - dw x p - w x v
        self.spatial_acceleration =
            SpatialVec::new(root.dw, root.dv - root.dw.cross(p) - root.w.cross(root.v));
    }

    /// True when every pose and rate is finite.
    pub fn is_finite(&self) -> bool {
        self.links.iter().all(|l| {
            l.pose.is_finite()
                && l.v.is_finite()
                && l.w.is_finite()
                && l.q.is_finite()
                && l.dq.is_finite()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn two_link_arm() -> Multibody {
        let mut mb = Multibody::new("arm");
        mb.add_link(Link::new("base", None, JointType::Fixed));
        mb.add_link(
            Link::new("upper", Some(0), JointType::Revolute { axis: DVec3::Z })
                .with_offset(DVec3::X),
        );
        mb.add_link(Link::new("lower", Some(1), JointType::Fixed).with_offset(DVec3::X));
        mb
    }

    #[test]
    fn revolute_joint_rotates_child_chain() {
        let mut mb = two_link_arm();
        mb.links[1].q = FRAC_PI_2;
        mb.calc_forward_kinematics(false, false);
        let tip = mb.links[2].pose.position;
        assert!((tip - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn joint_velocity_propagates_to_tip() {
        let mut mb = two_link_arm();
        mb.links[1].dq = 2.0;
        mb.calc_forward_kinematics(true, true);
        assert!((mb.links[2].w - DVec3::Z * 2.0).length() < 1e-12);
        // tip at (2,0,0), pivot at (1,0,0): v = w x r = 2z x x = 2y
        assert!((mb.links[2].v - DVec3::Y * 2.0).length() < 1e-12);
        // centripetal acceleration towards the pivot
        assert!((mb.links[2].dv - DVec3::new(-4.0, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn parent_propagation_inverts_child_propagation() {
        let mut mb = two_link_arm();
        mb.links[1].q = 0.4;
        mb.links[1].dq = -1.5;
        mb.links[1].ddq = 0.3;
        mb.links[0].w = DVec3::new(0.1, 0.2, 0.3);
        mb.calc_forward_kinematics(true, true);
        let expected = mb.links[0].clone();

        mb.links[0].pose = Transform::default();
        mb.links[0].v = DVec3::splat(9.0);
        mb.propagate_to_parent(1, true, true);

        let root = &mb.links[0];
        assert!((root.pose.position - expected.pose.position).length() < 1e-12);
        assert!((root.w - expected.w).length() < 1e-12);
        assert!((root.v - expected.v).length() < 1e-12);
        assert!((root.dw - expected.dw).length() < 1e-12);
        assert!((root.dv - expected.dv).length() < 1e-12);
    }

    #[test]
    fn validate_rejects_out_of_order_links() {
        let mut mb = Multibody::new("broken");
        mb.add_link(Link::new("root", None, JointType::Free));
        mb.add_link(Link::new("a", Some(2), JointType::Fixed));
        mb.add_link(Link::new("b", Some(0), JointType::Fixed));
        assert!(mb.validate().is_err());
    }

    #[test]
    fn external_forces_accumulate_and_clear() {
        let mut mb = two_link_arm();
        mb.apply_force_at(2, DVec3::Z, DVec3::X * 2.0);
        assert!(mb.has_external_forces());
        assert!((mb.links[2].tau_ext - DVec3::new(0.0, -2.0, 0.0)).length() < 1e-12);
        mb.clear_external_forces();
        assert!(!mb.has_external_forces());
    }
}
