use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Rigid placement of a link or body: position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec3,
    pub rotation: DQuat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn new(position: DVec3, rotation: DQuat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Applies another transform on top of this one, returning the composition.
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * other.position,
            rotation: (self.rotation * other.rotation).normalize(),
        }
    }

    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.inverse();
        Transform {
            position: -(rotation * self.position),
            rotation,
        }
    }

    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.position + self.rotation * point
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

/// Mass, center of mass (link frame) and rotational inertia about the center of mass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f64,
    pub com: DVec3,
    pub inertia: DMat3,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            com: DVec3::ZERO,
            inertia: DMat3::IDENTITY,
        }
    }
}

impl MassProperties {
    pub fn solid_box(half_extents: DVec3, mass: f64) -> Self {
        Self {
            mass,
            com: DVec3::ZERO,
            inertia: DMat3::for_solid_box(half_extents, mass),
        }
    }

    pub fn solid_sphere(radius: f64, mass: f64) -> Self {
        Self {
            mass,
            com: DVec3::ZERO,
            inertia: DMat3::for_solid_sphere(radius, mass),
        }
    }

    pub fn with_com(mut self, com: DVec3) -> Self {
        self.com = com;
        self
    }
}

/// Helper methods for inertia calculations.
pub trait InertiaTensorExt {
    fn for_solid_box(half_extents: DVec3, mass: f64) -> DMat3;
    fn for_solid_sphere(radius: f64, mass: f64) -> DMat3;
}

impl InertiaTensorExt for DMat3 {
    fn for_solid_box(half_extents: DVec3, mass: f64) -> DMat3 {
        let lx = half_extents.x * 2.0;
        let ly = half_extents.y * 2.0;
        let lz = half_extents.z * 2.0;
        let factor = mass / 12.0;
        DMat3::from_diagonal(DVec3::new(
            factor * (ly * ly + lz * lz),
            factor * (lx * lx + lz * lz),
            factor * (lx * lx + ly * ly),
        ))
    }

    fn for_solid_sphere(radius: f64, mass: f64) -> DMat3 {
        let value = 0.4 * mass * radius * radius;
        DMat3::from_diagonal(DVec3::splat(value))
    }
}
