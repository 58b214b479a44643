//! Plücker spatial algebra. Everything is expressed in the world frame at the
//! world origin, so no frame transforms are needed between links.

use glam::{DMat3, DVec3};

/// Six-component motion or force vector.
///
/// As a motion, `ang` is the angular velocity and `lin` the velocity of the
/// body point passing through the origin. As a force, `ang` is the moment
/// about the origin and `lin` the resultant force.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpatialVec {
    pub ang: DVec3,
    pub lin: DVec3,
}

impl SpatialVec {
    pub const ZERO: Self = Self {
        ang: DVec3::ZERO,
        lin: DVec3::ZERO,
    };

    pub fn new(ang: DVec3, lin: DVec3) -> Self {
        Self { ang, lin }
    }

    pub fn dot(&self, other: &SpatialVec) -> f64 {
        self.ang.dot(other.ang) + self.lin.dot(other.lin)
    }

    /// `self ×m other`, the rate of change of a motion vector carried by `self`.
    pub fn cross_motion(&self, other: &SpatialVec) -> SpatialVec {
        SpatialVec {
            ang: self.ang.cross(other.ang),
            lin: self.ang.cross(other.lin) + self.lin.cross(other.ang),
        }
    }

    /// `self ×f other`, the dual of [`cross_motion`](Self::cross_motion).
    pub fn cross_force(&self, other: &SpatialVec) -> SpatialVec {
        SpatialVec {
            ang: self.ang.cross(other.ang) + self.lin.cross(other.lin),
            lin: self.ang.cross(other.lin),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.ang.is_finite() && self.lin.is_finite()
    }
}

impl std::ops::Add for SpatialVec {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            ang: self.ang + other.ang,
            lin: self.lin + other.lin,
        }
    }
}

impl std::ops::Sub for SpatialVec {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            ang: self.ang - other.ang,
            lin: self.lin - other.lin,
        }
    }
}

impl std::ops::Mul<f64> for SpatialVec {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            ang: self.ang * rhs,
            lin: self.lin * rhs,
        }
    }
}

/// 6×6 operator stored as `[[m00, m01], [m10, m11]]` 3×3 blocks (angular first).
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialMat {
    pub m00: DMat3,
    pub m01: DMat3,
    pub m10: DMat3,
    pub m11: DMat3,
}

impl SpatialMat {
    pub fn mul_vec(&self, v: SpatialVec) -> SpatialVec {
        SpatialVec {
            ang: self.m00 * v.ang + self.m01 * v.lin,
            lin: self.m10 * v.ang + self.m11 * v.lin,
        }
    }

    /// Solves `self * x = rhs` by Gaussian elimination with partial pivoting.
    /// Returns `None` when the matrix is singular.
    pub fn solve(&self, rhs: SpatialVec) -> Option<SpatialVec> {
        let mut a = [[0.0_f64; 7]; 6];
        let blocks = [[self.m00, self.m01], [self.m10, self.m11]];
        let b = [rhs.ang.to_array(), rhs.lin.to_array()];
        for (bi, row_blocks) in blocks.iter().enumerate() {
            for r in 0..3 {
                let row = &mut a[bi * 3 + r];
                for (bj, block) in row_blocks.iter().enumerate() {
                    for c in 0..3 {
                        row[bj * 3 + c] = block.col(c)[r];
                    }
                }
                row[6] = b[bi][r];
            }
        }

        for col in 0..6 {
            let pivot = (col..6)
                .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
                .unwrap_or(col);
            if a[pivot][col].abs() < 1e-12 {
                return None;
            }
            a.swap(col, pivot);
            for row in (col + 1)..6 {
                let factor = a[row][col] / a[col][col];
                for k in col..7 {
                    a[row][k] -= factor * a[col][k];
                }
            }
        }

        let mut x = [0.0_f64; 6];
        for row in (0..6).rev() {
            let tail: f64 = ((row + 1)..6).map(|k| a[row][k] * x[k]).sum();
            x[row] = (a[row][6] - tail) / a[row][row];
        }
        Some(SpatialVec::new(
            DVec3::new(x[0], x[1], x[2]),
            DVec3::new(x[3], x[4], x[5]),
        ))
    }

    /// `v vᵀ`.
    pub fn outer_product(v: SpatialVec) -> Self {
        Self {
            m00: outer_vec3(v.ang, v.ang),
            m01: outer_vec3(v.ang, v.lin),
            m10: outer_vec3(v.lin, v.ang),
            m11: outer_vec3(v.lin, v.lin),
        }
    }
}

fn outer_vec3(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

impl std::ops::Add for SpatialMat {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            m00: self.m00 + other.m00,
            m01: self.m01 + other.m01,
            m10: self.m10 + other.m10,
            m11: self.m11 + other.m11,
        }
    }
}

impl std::ops::Sub for SpatialMat {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            m00: self.m00 - other.m00,
            m01: self.m01 - other.m01,
            m10: self.m10 - other.m10,
            m11: self.m11 - other.m11,
        }
    }
}

impl std::ops::Mul<f64> for SpatialMat {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            m00: self.m00 * rhs,
            m01: self.m01 * rhs,
            m10: self.m10 * rhs,
            m11: self.m11 * rhs,
        }
    }
}

/// Rigid-body inertia about the world origin.
#[derive(Debug, Clone, Copy)]
pub struct SpatialInertia {
    pub mass: f64,
    /// World position of the centre of mass.
    pub com: DVec3,
    /// Rotational inertia at the center of mass.
    pub inertia: DMat3,
}

impl SpatialInertia {
    pub fn new(mass: f64, com: DVec3, inertia: DMat3) -> Self {
        Self { mass, com, inertia }
    }

    pub fn to_mat(&self) -> SpatialMat {
        let m = self.mass;
        let c = self.com;
        let c_skew = DMat3::from_cols(
            DVec3::new(0.0, c.z, -c.y),
            DVec3::new(-c.z, 0.0, c.x),
            DVec3::new(c.y, -c.x, 0.0),
        );
        let mc_skew = c_skew * m;

        // parallel axis: I_o = I_c - m [c]x [c]x
        let i_origin = self.inertia - c_skew * c_skew * m;

        SpatialMat {
            m00: i_origin,
            m01: mc_skew,
            m10: mc_skew.transpose(),
            m11: DMat3::IDENTITY * m,
        }
    }
}
