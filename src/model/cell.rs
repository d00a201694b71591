// src/model/cell.rs
use crate::utils::linalg::{lattice_vectors, matrix_from_rows, matrix_to_rows};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Real-space unit cell
///
/// `box_matrix` holds the lattice vectors as COLUMNS, in input units.
/// `scale` converts input units to physical length (e.g. nm per unit).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(with = "rows")]
    pub box_matrix: Matrix3<f64>,
    pub scale: f64,
}

impl Cell {
    pub fn new(box_matrix: Matrix3<f64>, scale: f64) -> Self {
        Self { box_matrix, scale }
    }

    pub fn cubic(edge: f64) -> Self {
        Self::new(Matrix3::identity() * edge, 1.0)
    }

    /// Scaled lattice vectors `a1, a2, a3`
    pub fn vectors(&self) -> [Vector3<f64>; 3] {
        lattice_vectors(&self.box_matrix, self.scale)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::cubic(1.0)
    }
}

// Stored as three rows so the JSON reads like the matrix it is.
mod rows {
    use super::{matrix_from_rows, matrix_to_rows, Matrix3};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(m: &Matrix3<f64>, s: S) -> Result<S::Ok, S::Error> {
        matrix_to_rows(m).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Matrix3<f64>, D::Error> {
        let rows = <[[f64; 3]; 3]>::deserialize(d)?;
        Ok(matrix_from_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_are_scaled_columns() {
        let cell = Cell::new(matrix_from_rows([[2.0, 1.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.0]]), 0.5);
        let [a1, a2, a3] = cell.vectors();
        assert_eq!(a1, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(a2, Vector3::new(0.5, 1.0, 0.0));
        assert_eq!(a3, Vector3::new(0.0, 0.0, 1.5));
    }

    #[test]
    fn test_json_uses_rows() {
        let cell = Cell::cubic(2.0);
        let json = serde_json::to_string(&cell).unwrap();
        assert_eq!(json, r#"{"box_matrix":[[2.0,0.0,0.0],[0.0,2.0,0.0],[0.0,0.0,2.0]],"scale":1.0}"#);
        let back: Cell = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cell);
    }
}
