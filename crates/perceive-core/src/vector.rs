use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;

/// A point or direction in world space.
///
/// Y is the vertical axis. Horizontal rotations turn about +Y, clockwise when
/// seen from above, so a +90° turn takes +Z (forward) to +X (right).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction. Returns zero for near-zero input.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len < EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / len)
    }

    /// All three components are finite (no NaN or infinity).
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Unsigned angle between two vectors in degrees, in [0, 180].
    /// Zero when either vector is degenerate.
    pub fn angle_degrees(self, other: Self) -> f32 {
        let denom = (self.length_squared() * other.length_squared()).sqrt();
        if denom < EPSILON {
            return 0.0;
        }
        let cos = (self.dot(other) / denom).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }

    /// Rotate about the vertical axis by `degrees`.
    pub fn rotate_y(self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            x: self.x * cos + self.z * sin,
            y: self.y,
            z: -self.x * sin + self.z * cos,
        }
    }

    /// Component-wise comparison within `tol`.
    pub fn approx_eq(self, other: Self, tol: f32) -> bool {
        (self.x - other.x).abs() <= tol
            && (self.y - other.y).abs() <= tol
            && (self.z - other.z).abs() <= tol
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_length_and_distance() {
        let v = Vec3::new(3.0, 0.0, 4.0);
        assert_abs_diff_eq!(v.length(), 5.0);
        assert_abs_diff_eq!(Vec3::ZERO.distance(v), 5.0);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        let n = Vec3::new(0.0, 0.0, 7.0).normalize();
        assert!(n.approx_eq(Vec3::FORWARD, 1e-6));
    }

    #[test]
    fn test_angle_degrees() {
        assert_abs_diff_eq!(Vec3::FORWARD.angle_degrees(Vec3::RIGHT), 90.0, epsilon = 1e-4);
        assert_abs_diff_eq!(
            Vec3::FORWARD.angle_degrees(Vec3::new(5.0, 0.0, 5.0)),
            45.0,
            epsilon = 1e-3
        );
        assert_abs_diff_eq!(Vec3::FORWARD.angle_degrees(-Vec3::FORWARD), 180.0, epsilon = 1e-4);
    }

    #[test]
    fn test_angle_with_degenerate_vector() {
        assert_eq!(Vec3::ZERO.angle_degrees(Vec3::FORWARD), 0.0);
    }

    #[test]
    fn test_rotate_y_quarter_turn() {
        // Forward turned right by 90° points along +X
        let r = Vec3::FORWARD.rotate_y(90.0);
        assert!(r.approx_eq(Vec3::RIGHT, 1e-6), "got {r:?}");

        let back = r.rotate_y(-90.0);
        assert!(back.approx_eq(Vec3::FORWARD, 1e-6));
    }

    #[test]
    fn test_rotate_y_keeps_height() {
        let v = Vec3::new(1.0, 2.0, 3.0).rotate_y(137.0);
        assert_abs_diff_eq!(v.y, 2.0);
        assert_abs_diff_eq!(v.length(), Vec3::new(1.0, 2.0, 3.0).length(), epsilon = 1e-5);
    }

    #[test]
    fn test_is_finite() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Vec3::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(!Vec3::new(0.0, f32::INFINITY, 0.0).is_finite());
    }
}
