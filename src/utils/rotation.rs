// src/utils/rotation.rs

use nalgebra::{Quaternion, Vector3};

/// Rotate `v` about `axis` by `angle` radians (Rodrigues' formula)
///
/// `axis` must already be a unit vector. It is used as given, so a
/// non-unit axis produces a scaled, non-rigid result.
pub fn rotate(v: &Vector3<f64>, axis: &Vector3<f64>, angle: f64) -> Vector3<f64> {
    let (st, ct) = angle.sin_cos();
    v * ct + axis.cross(v) * st + axis * (axis.dot(v) * (1.0 - ct))
}

/// Rotate `v` by the quaternion `q = (s, u)`
///
/// Expands `q v q⁻¹` as `(s² − |u|²) v + 2s (u × v) + 2 (u · v) u`.
/// For the inverse rotation pass `conjugate(q)`.
pub fn apply_quaternion(q: &Quaternion<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    let s = q.w;
    let u = q.imag();
    v * (s * s - u.dot(&u)) + u.cross(v) * (2.0 * s) + u * (2.0 * u.dot(v))
}

pub fn conjugate(q: &Quaternion<f64>) -> Quaternion<f64> {
    Quaternion::new(q.w, -q.i, -q.j, -q.k)
}

/// Identity orientation, `(1, 0, 0, 0)`
pub fn identity() -> Quaternion<f64> {
    Quaternion::new(1.0, 0.0, 0.0, 0.0)
}

/// Unit quaternion for a rotation of `angle` radians about the unit vector `axis`
pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Quaternion<f64> {
    let (s, c) = (angle / 2.0).sin_cos();
    Quaternion::new(c, axis.x * s, axis.y * s, axis.z * s)
}
