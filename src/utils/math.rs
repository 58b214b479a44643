//! Additional math helpers layered on top of `glam`.

use glam::{DQuat, DVec3};

/// Converts angular velocity vector (radians/sec) into a quaternion delta.
pub fn angular_velocity_to_quat(angular: DVec3, dt: f64) -> DQuat {
    let angle = angular.length() * dt;
    if angle.abs() < 1e-12 {
        return DQuat::IDENTITY;
    }
    let axis = angular.normalize();
    DQuat::from_axis_angle(axis, angle)
}

/// Rotates `rotation` by the world-frame angular velocity over `dt`.
pub fn integrate_rotation(rotation: DQuat, angular: DVec3, dt: f64) -> DQuat {
    (angular_velocity_to_quat(angular, dt) * rotation).normalize()
}
