// src/physics/constraint.rs
use nalgebra::Vector3;
use std::f64::consts::SQRT_2;

/// Constraint on candidate K vectors
///
/// Every variant has a bounding `radius` used to size a lattice search.
/// `satisfies` may be stricter than the sphere of that radius, never looser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    Unconstrained,
    AlignedBox(AlignedBox),
}

impl Constraint {
    pub fn radius(&self) -> f64 {
        match self {
            Constraint::Unconstrained => f64::INFINITY,
            Constraint::AlignedBox(b) => b.radius,
        }
    }

    pub fn satisfies(&self, v: &Vector3<f64>) -> bool {
        match self {
            Constraint::Unconstrained => true,
            Constraint::AlignedBox(b) => b.satisfies(v),
        }
    }
}

impl From<AlignedBox> for Constraint {
    fn from(b: AlignedBox) -> Self {
        Constraint::AlignedBox(b)
    }
}

/// Axis-aligned box intersected with a sphere of `radius`
///
/// A small z extent turns the box into a plane plus or minus epsilon.
/// Set `radius` below the half-diagonal for a cylinder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedBox {
    pub radius: f64,
    pub xlo: f64,
    pub xhi: f64,
    pub ylo: f64,
    pub yhi: f64,
    pub zlo: f64,
    pub zhi: f64,
}

impl AlignedBox {
    pub fn new(radius: f64, extent: [f64; 6]) -> Self {
        let [xlo, xhi, ylo, yhi, zlo, zhi] = extent;
        Self { radius, xlo, xhi, ylo, yhi, zlo, zhi }
    }

    /// Thin slab `[-kmax, kmax]^2 x [-eps, eps]` emulating a planar detector
    pub fn slab(kmax: f64, eps: f64) -> Self {
        let eps = eps.abs();
        Self::new(kmax * SQRT_2, [-kmax, kmax, -kmax, kmax, -eps, eps])
    }

    pub fn extent(&self) -> [f64; 6] {
        [self.xlo, self.xhi, self.ylo, self.yhi, self.zlo, self.zhi]
    }

    pub fn satisfies(&self, v: &Vector3<f64>) -> bool {
        v.norm_squared() <= self.radius * self.radius
            && (self.xlo..=self.xhi).contains(&v.x)
            && (self.ylo..=self.yhi).contains(&v.y)
            && (self.zlo..=self.zhi).contains(&v.z)
    }
}
