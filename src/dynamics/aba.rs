use crate::core::articulations::{JointType, Multibody};
use crate::utils::spatial::{SpatialInertia, SpatialMat, SpatialVec};
use glam::{DMat3, DVec3};

/// Accelerations produced by one articulated-body pass.
#[derive(Debug, Clone, Default)]
pub struct Accelerations {
    /// Spatial acceleration of the root, expressed at the world origin.
    pub root: SpatialVec,
    /// Joint accelerations indexed by link.
    pub ddq: Vec<f64>,
}

impl Accelerations {
    /// Classical linear and angular acceleration of the root link origin.
    pub fn root_classical(&self, body: &Multibody) -> (DVec3, DVec3) {
        let root = body.root();
        let dw = self.root.ang;
        let dv = self.root.lin + dw.cross(root.pose.position) + root.w.cross(root.v);
        (dv, dw)
    }
}

pub struct ABASolver;

impl ABASolver {
    /// Featherstone's articulated-body algorithm in world coordinates.
    ///
    /// Link poses and velocities must be current. `extra` holds additional
    /// per-link wrenches at the world origin (contact forces); accumulated
    /// external forces on the links are included automatically. With
    /// `prescribed` set, joint accelerations are taken from the links instead
    /// of being solved for (hybrid dynamics for high-gain bodies).
    pub fn solve(
        mb: &Multibody,
        gravity: DVec3,
        extra: &[SpatialVec],
        prescribed: bool,
    ) -> Accelerations {
        let n = mb.links.len();
        if n == 0 {
            return Accelerations::default();
        }

        let mut s = vec![None; n];
        let mut c = vec![SpatialVec::default(); n];
        let mut i_a = vec![SpatialMat::default(); n];
        let mut p_a = vec![SpatialVec::default(); n];

        let mut u_vec = vec![SpatialVec::default(); n];
        let mut d_inv = vec![0.0; n];
        let mut force_u = vec![0.0; n];

        // --- Pass 1: velocities, bias forces ---
        for i in 0..n {
            let link = &mb.links[i];
            let p = link.pose.position;
            let v = SpatialVec::new(link.w, link.v - link.w.cross(p));

            s[i] = match link.joint_type {
                JointType::Revolute { .. } => {
                    let axis = link.world_axis();
                    Some(SpatialVec::new(axis, p.cross(axis)))
                }
                JointType::Prismatic { .. } => {
                    Some(SpatialVec::new(DVec3::ZERO, link.world_axis()))
                }
                JointType::Fixed | JointType::Free => None,
            };
            if let (Some(si), Some(_)) = (s[i], link.parent_idx) {
                c[i] = v.cross_motion(&(si * link.dq));
            }

            let props = &link.mass_properties;
            let rot = DMat3::from_quat(link.pose.rotation);
            let com = link.pose.transform_point(props.com);
            let i_link = SpatialInertia::new(props.mass, com, rot * props.inertia * rot.transpose())
                .to_mat();
            let weight = gravity * props.mass;
            let f_gravity = SpatialVec::new(com.cross(weight), weight);
            let f_extra = extra.get(i).copied().unwrap_or_default();

            i_a[i] = i_link;
            p_a[i] = v.cross_force(&i_link.mul_vec(v))
                - f_gravity
                - f_extra
                - link.external_wrench();
        }

        // --- Pass 2: inward ---
        for i in (1..n).rev() {
            let link = &mb.links[i];
            let Some(parent) = link.parent_idx else {
                continue;
            };

            let (i_reduced, p_reduced) = match s[i] {
                Some(si) if !prescribed => {
                    let u_i = i_a[i].mul_vec(si);
                    u_vec[i] = u_i;
                    let d = si.dot(&u_i);
                    let di = if d.abs() > 1e-12 { 1.0 / d } else { 0.0 };
                    d_inv[i] = di;
                    force_u[i] = link.u - si.dot(&p_a[i]);

                    let i_red = i_a[i] - SpatialMat::outer_product(u_i) * di;
                    let p_red = p_a[i] + i_red.mul_vec(c[i]) + u_i * (di * force_u[i]);
                    (i_red, p_red)
                }
                Some(si) => (i_a[i], p_a[i] + i_a[i].mul_vec(c[i] + si * link.ddq)),
                None => (i_a[i], p_a[i] + i_a[i].mul_vec(c[i])),
            };

            i_a[parent] = i_a[parent] + i_reduced;
            p_a[parent] = p_a[parent] + p_reduced;
        }

        // --- Pass 3: outward ---
        let mut a = vec![SpatialVec::default(); n];
        if mb.has_floating_root() {
            a[0] = i_a[0].solve(p_a[0] * -1.0).unwrap_or_default();
        }
        let mut ddq = vec![0.0; n];
        for i in 1..n {
            let link = &mb.links[i];
            let Some(parent) = link.parent_idx else {
                continue;
            };
            let a_hat = a[parent] + c[i];
            a[i] = match s[i] {
                Some(si) if !prescribed => {
                    let acc = d_inv[i] * (force_u[i] - u_vec[i].dot(&a_hat));
                    ddq[i] = acc;
                    a_hat + si * acc
                }
                Some(si) => {
                    ddq[i] = link.ddq;
                    a_hat + si * link.ddq
                }
                None => a_hat,
            };
        }

        Accelerations { root: a[0], ddq }
    }
}
