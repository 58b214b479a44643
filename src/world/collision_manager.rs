//! Ground-plane contact detection and penalty forces.

use glam::DVec3;
use serde::Serialize;

use crate::core::articulations::Multibody;
use crate::dynamics::solver::SolverParameters;
use crate::utils::allocator::EntityId;
use crate::utils::spatial::SpatialVec;

/// A link origin touching, or within culling distance of, the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    pub link: usize,
    pub point: DVec3,
    /// Penetration below the plane; negative while still above it.
    pub depth: f64,
    /// Velocity of the contact point.
    pub velocity: DVec3,
}

/// A reported link/ground collision of the last step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Collision {
    pub body: EntityId,
    pub link: usize,
    pub point: DVec3,
    pub normal: DVec3,
    pub depth: f64,
    /// Contact force applied to the link.
    pub force: DVec3,
}

#[derive(Debug, Clone, Default)]
pub struct CollisionManager {
    pub ground_height: f64,
    collisions: Vec<Collision>,
}

impl CollisionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.collisions.clear();
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn detect(&self, body: &Multibody, params: &SolverParameters) -> Vec<GroundContact> {
        detect_ground_contacts(body, self.ground_height, params)
    }

    /// Records the contacts of `body` together with the forces they produce.
    pub fn record(
        &mut self,
        id: EntityId,
        body: &Multibody,
        contacts: &[GroundContact],
        params: &SolverParameters,
    ) {
        let mass = body.total_mass();
        for contact in contacts {
            self.collisions.push(Collision {
                body: id,
                link: contact.link,
                point: contact.point,
                normal: DVec3::Z,
                depth: contact.depth,
                force: penalty_force(contact, mass, params),
            });
        }
    }
}

/// Link origins closer to the plane than the culling distance.
pub fn detect_ground_contacts(
    body: &Multibody,
    ground_height: f64,
    params: &SolverParameters,
) -> Vec<GroundContact> {
    body.links
        .iter()
        .enumerate()
        .filter_map(|(idx, link)| {
            let point = link.pose.position;
            let depth = ground_height - point.z;
            (-depth < params.contact_culling_distance).then_some(GroundContact {
                link: idx,
                point,
                depth,
                velocity: link.v,
            })
        })
        .collect()
}

/// Penalty force on a contact: spring-damper along the normal, viscous
/// friction capped by the static cone and replaced by slip friction beyond it.
///
/// Stiffness and damping scale with the body mass so one set of
/// coefficients fits bodies of any size. Penetration beyond the culling
/// depth is clamped.
pub fn penalty_force(contact: &GroundContact, body_mass: f64, params: &SolverParameters) -> DVec3 {
    if contact.depth <= 0.0 {
        return DVec3::ZERO;
    }
    let depth = contact.depth.min(params.contact_culling_depth);
    let scale = body_mass * params.penalty_size_ratio;
    let k = params.penalty_kp_coef * scale;
    let c = params.penalty_kv_coef * scale;

    let vn = contact.velocity.z;
    let damping = if vn > 0.0 {
        c * (1.0 - params.coefficient_of_restitution).max(0.0)
    } else {
        c
    };
    let correction = params.contact_correction_velocity_ratio
        * (depth - params.contact_correction_depth).max(0.0);
    let normal = (k * depth + damping * (correction - vn)).max(0.0);

    let mut vt = DVec3::new(contact.velocity.x, contact.velocity.y, 0.0);
    if params.is_2d_mode {
        vt.y = 0.0;
    }
    let mut friction = -vt * c;
    let limit = params.static_friction * normal;
    let speed = vt.length();
    if friction.length() > limit && speed > f64::EPSILON {
        friction = -vt / speed * params.slip_friction * normal;
    }

    DVec3::new(friction.x, friction.y, normal)
}

/// Per-link wrenches at the world origin for the given contacts.
pub fn contact_wrenches(
    num_links: usize,
    contacts: &[GroundContact],
    body_mass: f64,
    params: &SolverParameters,
) -> Vec<SpatialVec> {
    let mut wrenches = vec![SpatialVec::ZERO; num_links];
    for contact in contacts {
        let force = penalty_force(contact, body_mass, params);
        if let Some(w) = wrenches.get_mut(contact.link) {
            *w = *w + SpatialVec::new(contact.point.cross(force), force);
        }
    }
    wrenches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(depth: f64, velocity: DVec3) -> GroundContact {
        GroundContact {
            link: 0,
            point: DVec3::new(0.0, 0.0, -depth),
            depth,
            velocity,
        }
    }

    #[test]
    fn separated_contact_produces_no_force() {
        let params = SolverParameters::default();
        let f = penalty_force(&contact(-0.001, DVec3::ZERO), 1.0, &params);
        assert_eq!(f, DVec3::ZERO);
    }

    #[test]
    fn normal_force_grows_with_depth() {
        let params = SolverParameters::default();
        let shallow = penalty_force(&contact(0.001, DVec3::ZERO), 1.0, &params);
        let deep = penalty_force(&contact(0.01, DVec3::ZERO), 1.0, &params);
        assert!(deep.z > shallow.z && shallow.z > 0.0);
    }

    #[test]
    fn sliding_friction_is_bounded_by_slip_coefficient() {
        let params = SolverParameters::default();
        let f = penalty_force(&contact(0.01, DVec3::new(5.0, 0.0, 0.0)), 1.0, &params);
        assert!(f.x < 0.0);
        assert!((f.x.abs() - params.slip_friction * f.z).abs() < 1e-9);
    }

    #[test]
    fn culling_distance_limits_detection() {
        use crate::core::articulations::{JointType, Link};
        let mut body = Multibody::new("probe");
        body.add_link(Link::new("root", None, JointType::Free));
        body.root_mut().pose.position.z = 0.004;
        let params = SolverParameters::default();
        assert_eq!(detect_ground_contacts(&body, 0.0, &params).len(), 1);
        body.root_mut().pose.position.z = 0.006;
        assert!(detect_ground_contacts(&body, 0.0, &params).is_empty());
    }
}
