// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

/// Build a box matrix from its rows
///
/// The COLUMNS of the returned matrix are the lattice vectors, so
/// `rows[0] = [a1x, a2x, a3x]`, `rows[1] = [a1y, a2y, a3y]`, ...
pub fn matrix_from_rows(rows: [[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::from_row_slice(&[
        rows[0][0], rows[0][1], rows[0][2],
        rows[1][0], rows[1][1], rows[1][2],
        rows[2][0], rows[2][1], rows[2][2],
    ])
}

pub fn matrix_to_rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

/// Scaled real-space lattice vectors `a_i = scale * column_i`
pub fn lattice_vectors(box_matrix: &Matrix3<f64>, scale: f64) -> [Vector3<f64>; 3] {
    [
        box_matrix.column(0) * scale,
        box_matrix.column(1) * scale,
        box_matrix.column(2) * scale,
    ]
}

/// Normalized sinc, `sin(pi x) / (pi x)`, with `sinc(0) = 1`
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Evenly spaced samples over `[start, stop]`, both ends included
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_lattice_vectors() {
        // Hexagonal-ish cell, columns a1 = (4,0,0), a2 = (2,3.46,0), a3 = (0,0,5)
        let m = matrix_from_rows([[4.0, 2.0, 0.0], [0.0, 3.46, 0.0], [0.0, 0.0, 5.0]]);
        let [a1, a2, a3] = lattice_vectors(&m, 2.0);

        assert!((a1 - Vector3::new(8.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((a2 - Vector3::new(4.0, 6.92, 0.0)).norm() < 1e-12);
        assert!((a3 - Vector3::new(0.0, 0.0, 10.0)).norm() < 1e-12);
    }

    #[test]
    fn test_rows_roundtrip() {
        let rows = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.5]];
        assert_eq!(matrix_to_rows(&matrix_from_rows(rows)), rows);
    }

    #[test]
    fn test_sinc() {
        assert_eq!(sinc(0.0), 1.0);
        assert!(sinc(1.0).abs() < 1e-15);
        assert!((sinc(0.5) - 2.0 / PI).abs() < 1e-15);
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(-2.0, 2.0, 5);
        assert_eq!(v, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
    }
}
