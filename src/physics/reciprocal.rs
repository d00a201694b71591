// src/physics/reciprocal.rs
use super::error::{KSpaceError, Result};
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Reciprocal lattice vectors with magnitude equal to angular wave number
///
/// Formula: g1 = 2pi * (a2 x a3) / (a1 . (a2 x a3)), cyclic for g2 and g3,
/// so that `g_i . a_j = 2pi * delta_ij`.
pub fn reciprocal_basis(
    a1: &Vector3<f64>,
    a2: &Vector3<f64>,
    a3: &Vector3<f64>,
) -> Result<[Vector3<f64>; 3]> {
    let scale = a1.norm() * a2.norm() * a3.norm();
    let tol = 1e-12 * scale;

    let a2xa3 = a2.cross(a3);
    let a3xa1 = a3.cross(a1);
    let a1xa2 = a1.cross(a2);

    let v1 = a1.dot(&a2xa3);
    let v2 = a2.dot(&a3xa1);
    let v3 = a3.dot(&a1xa2);

    if scale == 0.0 || v1.abs() <= tol || v2.abs() <= tol || v3.abs() <= tol {
        return Err(KSpaceError::DegenerateGeometry(format!(
            "cell is singular (triple product {:e})",
            v1
        )));
    }

    Ok([
        a2xa3 * (2.0 * PI / v1),
        a3xa1 * (2.0 * PI / v2),
        a1xa2 * (2.0 * PI / v3),
    ])
}
