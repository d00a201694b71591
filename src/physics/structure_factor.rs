// src/physics/structure_factor.rs

use super::error::{KSpaceError, Result};
use crate::utils::linalg::linspace;
use log::debug;
use nalgebra::Vector3;
use num_complex::Complex64;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Static structure factor of a point set on a cubic grid of q vectors
///
/// q = (h 2pi/Lx, k 2pi/Ly, l 2pi/Lz) for integers h, k, l in [-g, g].
/// Values are stored h-major: index `((h+g) n + (k+g)) n + (l+g)` with
/// `n = 2g + 1`.
#[derive(Debug, Clone)]
pub struct StructureFactor3D {
    g: usize,
    qx: Vec<f64>,
    qy: Vec<f64>,
    qz: Vec<f64>,
    s_complex: Vec<Complex64>,
}

impl StructureFactor3D {
    pub fn new(lx: f64, ly: f64, lz: f64, g: usize) -> Result<Self> {
        if !(lx > 0.0 && ly > 0.0 && lz > 0.0) {
            return Err(KSpaceError::DegenerateGeometry(format!(
                "box lengths ({}, {}, {}) must be positive",
                lx, ly, lz
            )));
        }
        let n = 2 * g + 1;
        let axis = |l: f64| {
            let qmax = g as f64 * 2.0 * PI / l;
            linspace(-qmax, qmax, n)
        };
        Ok(Self {
            g,
            qx: axis(lx),
            qy: axis(ly),
            qz: axis(lz),
            s_complex: vec![Complex64::new(0.0, 0.0); n * n * n],
        })
    }

    /// Points per axis, `2g + 1`
    pub fn grid(&self) -> usize {
        2 * self.g + 1
    }

    /// S(q) = sum_i exp(i q . r_i), normalized so that |S(0)| = 1
    pub fn compute(&mut self, points: &[Vector3<f64>]) -> Result<()> {
        if points.is_empty() {
            return Err(KSpaceError::DivisionSingularity(
                "structure factor of an empty point set".into(),
            ));
        }
        let n = self.grid();
        let (qx, qy, qz) = (&self.qx, &self.qy, &self.qz);

        let mut s: Vec<Complex64> = (0..n * n * n)
            .into_par_iter()
            .map(|idx| {
                let q = Vector3::new(qx[idx / (n * n)], qy[(idx / n) % n], qz[idx % n]);
                points
                    .iter()
                    .map(|r| Complex64::new(0.0, q.dot(r)).exp())
                    .sum::<Complex64>()
            })
            .collect();

        let mid = self.g;
        let s0 = s[(mid * n + mid) * n + mid].norm();
        for v in &mut s {
            *v /= s0;
        }
        self.s_complex = s;
        debug!("Structure factor of {} points on a {}^3 grid", points.len(), n);
        Ok(())
    }

    /// |S(q)|^2 in grid order
    pub fn s(&self) -> Vec<f64> {
        self.s_complex.iter().map(|c| c.norm_sqr()).collect()
    }

    pub fn s_complex(&self) -> &[Complex64] {
        &self.s_complex
    }

    pub fn q(&self) -> (&[f64], &[f64], &[f64]) {
        (&self.qx, &self.qy, &self.qz)
    }

    pub fn analyze(&self) -> PeakAnalysis {
        PeakAnalysis {
            g: self.g as i64,
            s: self.s(),
        }
    }
}

/// Peak search over an |S|^2 grid in integer (h, k, l) space
///
/// Offsets must be multiplied by 2pi/L to get q in physical units.
#[derive(Debug, Clone)]
pub struct PeakAnalysis {
    g: i64,
    s: Vec<f64>,
}

impl PeakAnalysis {
    /// Wrap an h-major grid of `(2g+1)^3` values
    pub fn new(s: Vec<f64>, g: usize) -> Result<Self> {
        let n = 2 * g + 1;
        if s.len() != n * n * n {
            return Err(KSpaceError::ShapeMismatch(format!(
                "expected {} values for g = {}, got {}",
                n * n * n,
                g,
                s.len()
            )));
        }
        Ok(Self { g: g as i64, s })
    }

    fn offsets(&self) -> impl Iterator<Item = [i64; 3]> + '_ {
        let g = self.g;
        (-g..=g).flat_map(move |h| (-g..=g).flat_map(move |k| (-g..=g).map(move |l| [h, k, l])))
    }

    /// Grid offsets and values where S > cut
    pub fn peak_list(&self, cut: f64) -> Vec<([i64; 3], f64)> {
        self.offsets()
            .zip(&self.s)
            .filter(|(_, v)| **v > cut)
            .map(|(hkl, &v)| (hkl, v))
            .collect()
    }

    /// Peak values grouped by h^2 + k^2 + l^2
    pub fn peak_degeneracy(&self, cut: f64) -> BTreeMap<i64, Vec<f64>> {
        let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for ([h, k, l], v) in self.peak_list(cut) {
            groups.entry(h * h + k * k + l * l).or_default().push(v);
        }
        groups
    }

    /// Every value paired with its h^2 + k^2 + l^2, in grid order
    pub fn s_vs_q(&self) -> Vec<(i64, f64)> {
        self.offsets()
            .zip(&self.s)
            .map(|([h, k, l], &v)| (h * h + k * k + l * l, v))
            .collect()
    }
}
