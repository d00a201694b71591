// src/physics/form_factor/polyhedron.rs
//! Analytic Fourier transform of a convex polyhedron.
//!
//! The volume integral is reduced to a sum over facets (divergence theorem in
//! 3D), and each facet integral to a sum over its edges (divergence theorem in
//! the facet plane). Each edge contributes with the kernel sinc(k.e / pi);
//! the k -> 0 limits return the volume and facet area directly.

use crate::physics::error::{KSpaceError, Result};
use crate::physics::hull::ConvexHull;
use crate::utils::linalg::sinc;
use nalgebra::Vector3;
use num_complex::Complex64;
use std::f64::consts::PI;

/// |k|^2 L^2 below which k is treated as the zero vector (L = hull extent)
///
/// Projecting k onto a facet plane leaves a residue of order 1e-16 |k| when
/// k is parallel to the normal; dividing the edge sum by that |k|^2 would be
/// pure cancellation noise, so such vectors take the zero-k branch.
const ZERO_KL2: f64 = 1e-12;

/// Hull geometry with the length scale already applied
///
/// Vertices and plane offsets carry one power of the scale, areas two and
/// the volume three. Facet `i` owns
/// `facet_verts[facet_offs[i]..facet_offs[i + 1]]`.
#[derive(Debug, Clone)]
pub struct PolyhedronGeometry {
    pub verts: Vec<Vector3<f64>>,
    pub facet_offs: Vec<usize>,
    pub facet_verts: Vec<usize>,
    pub normals: Vec<Vector3<f64>>,
    pub d: Vec<f64>,
    pub areas: Vec<f64>,
    pub volume: f64,
    extent2: f64,
}

impl PolyhedronGeometry {
    pub fn from_hull(hull: &dyn ConvexHull, scale: f64) -> Result<Self> {
        let verts: Vec<Vector3<f64>> = hull.points().iter().map(|p| p * scale).collect();
        let facets = hull.facets();

        let mut facet_offs = Vec::with_capacity(facets.len() + 1);
        let mut facet_verts = Vec::new();
        let mut normals = Vec::with_capacity(facets.len());
        let mut d = Vec::with_capacity(facets.len());
        let mut areas = Vec::with_capacity(facets.len());
        facet_offs.push(0);

        for (i, facet) in facets.iter().enumerate() {
            if facet.len() < 3 {
                return Err(KSpaceError::DegenerateGeometry(format!(
                    "facet {} has {} vertices",
                    i,
                    facet.len()
                )));
            }
            let (n, offset) = hull.facet_plane(i);
            if (n.norm() - 1.0).abs() > 1e-6 {
                return Err(KSpaceError::DegenerateGeometry(format!(
                    "facet {} normal has length {}",
                    i,
                    n.norm()
                )));
            }
            let area = hull.facet_area(i) * scale * scale;
            if !(area > 0.0) || !area.is_finite() {
                return Err(KSpaceError::DegenerateGeometry(format!(
                    "facet {} has scaled area {}",
                    i, area
                )));
            }

            facet_verts.extend_from_slice(facet);
            facet_offs.push(facet_verts.len());
            normals.push(n);
            d.push(offset * scale);
            areas.push(area);
        }

        let volume = hull.volume() * scale.powi(3);
        if !volume.is_finite() {
            return Err(KSpaceError::DegenerateGeometry(format!(
                "scaled volume is {}",
                volume
            )));
        }
        let extent2 = verts.iter().map(|v| v.norm_squared()).fold(0.0, f64::max);

        Ok(Self {
            verts,
            facet_offs,
            facet_verts,
            normals,
            d,
            areas,
            volume,
            extent2,
        })
    }

    pub fn n_facets(&self) -> usize {
        self.normals.len()
    }

    fn is_zero(&self, k2: f64) -> bool {
        k2 == 0.0 || k2 * self.extent2 <= ZERO_KL2
    }

    /// Fourier transform of facet `i` at an in-plane wave vector `k`
    pub fn spoly2d(&self, i: usize, k: &Vector3<f64>) -> Complex64 {
        let k2 = k.norm_squared();
        if self.is_zero(k2) {
            return Complex64::new(self.areas[i], 0.0);
        }

        let n = &self.normals[i];
        let loop_verts = &self.facet_verts[self.facet_offs[i]..self.facet_offs[i + 1]];

        let mut s = Complex64::new(0.0, 0.0);
        for (j, &v) in loop_verts.iter().enumerate() {
            let v0 = &self.verts[v];
            let v1 = &self.verts[loop_verts[(j + 1) % loop_verts.len()]];
            let edge = v1 - v0;
            let midpoint = (v0 + v1) * 0.5;

            // Edge kernel sinc(k.e / pi) = sin(k.e) / (k.e)
            let x = k.dot(&edge) / PI;
            let phase = Complex64::new(0.0, -k.dot(&midpoint)).exp();
            s += phase * (n.dot(&edge.cross(k)) * sinc(x));
        }

        s * Complex64::new(0.0, -1.0 / k2)
    }

    /// Fourier transform of the whole polyhedron at `k` (body frame)
    pub fn spoly3d(&self, k: &Vector3<f64>) -> Complex64 {
        let k2 = k.norm_squared();
        if self.is_zero(k2) {
            return Complex64::new(self.volume, 0.0);
        }

        let mut s = Complex64::new(0.0, 0.0);
        for i in 0..self.n_facets() {
            let ni = &self.normals[i];
            let dotkni = k.dot(ni);
            if dotkni == 0.0 {
                continue;
            }
            let k_proj = k - ni * dotkni;
            let phase = Complex64::new(0.0, -dotkni * self.d[i]).exp();
            s += phase * self.spoly2d(i, &k_proj) * dotkni;
        }

        s * Complex64::new(0.0, 1.0 / k2)
    }

    /// `spoly3d` that refuses to return a non-finite value
    pub fn checked_spoly3d(&self, k: &Vector3<f64>) -> Result<Complex64> {
        let s = self.spoly3d(k);
        if s.re.is_finite() && s.im.is_finite() {
            Ok(s)
        } else {
            Err(KSpaceError::DivisionSingularity(format!(
                "polyhedron transform at k = ({}, {}, {}) is not finite",
                k.x, k.y, k.z
            )))
        }
    }
}
