// src/physics/form_factor/mod.rs
//! Per-particle-type Fourier transform engines.

pub mod polyhedron;
pub mod sphere;

use crate::physics::error::{KSpaceError, Result};
use crate::physics::hull::ConvexHull;
use crate::utils::rotation::{apply_quaternion, conjugate, identity};
use nalgebra::{Quaternion, Vector3};
use num_complex::Complex64;
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

pub use polyhedron::PolyhedronGeometry;
pub use sphere::sphere_form_factor;

/// Default unscaled sphere radius
pub const DEFAULT_SPHERE_RADIUS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormFactorKind {
    Delta,
    Sphere,
    ConvexPolyhedron,
}

impl FormFactorKind {
    pub const ALL: [FormFactorKind; 3] = [
        FormFactorKind::Delta,
        FormFactorKind::Sphere,
        FormFactorKind::ConvexPolyhedron,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FormFactorKind::Delta => "Delta",
            FormFactorKind::Sphere => "Sphere",
            FormFactorKind::ConvexPolyhedron => "ConvexPolyhedron",
        }
    }

    /// Scalar parameters accepted by `FormFactor::set_param`
    pub fn params(&self) -> &'static [&'static str] {
        match self {
            FormFactorKind::Delta => &["scale"],
            FormFactorKind::Sphere | FormFactorKind::ConvexPolyhedron => &["scale", "radius"],
        }
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params().contains(&name)
    }
}

impl fmt::Display for FormFactorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
enum Shape {
    Delta,
    Sphere { radius: f64 },
    ConvexPolyhedron {
        hull: Box<dyn ConvexHull>,
        geometry: PolyhedronGeometry,
    },
}

/// Fourier transform of one particle type at a shared set of K points
///
/// Holds the scale, complex density, particle positions/orientations and the
/// shape state. `compute` evaluates the transform at every K point in order.
#[derive(Debug)]
pub struct FormFactor {
    scale: f64,
    density: Complex64,
    k_points: Arc<[Vector3<f64>]>,
    positions: Vec<Vector3<f64>>,
    orientations: Vec<Quaternion<f64>>,
    shape: Shape,
}

impl FormFactor {
    fn with_shape(shape: Shape) -> Self {
        Self {
            scale: 1.0,
            density: Complex64::new(1.0, 0.0),
            k_points: Arc::from(vec![Vector3::zeros()]),
            positions: vec![Vector3::zeros()],
            orientations: vec![identity()],
            shape,
        }
    }

    /// Sum of delta functions at the particle positions
    pub fn delta() -> Self {
        Self::with_shape(Shape::Delta)
    }

    pub fn sphere() -> Self {
        Self::with_shape(Shape::Sphere {
            radius: DEFAULT_SPHERE_RADIUS,
        })
    }

    pub fn convex_polyhedron(hull: Box<dyn ConvexHull>) -> Result<Self> {
        let geometry = PolyhedronGeometry::from_hull(hull.as_ref(), 1.0)?;
        Ok(Self::with_shape(Shape::ConvexPolyhedron { hull, geometry }))
    }

    pub fn kind(&self) -> FormFactorKind {
        match self.shape {
            Shape::Delta => FormFactorKind::Delta,
            Shape::Sphere { .. } => FormFactorKind::Sphere,
            Shape::ConvexPolyhedron { .. } => FormFactorKind::ConvexPolyhedron,
        }
    }

    pub fn params(&self) -> &'static [&'static str] {
        self.kind().params()
    }

    pub fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "scale" => self.set_scale(value),
            "radius" => self.set_radius(value),
            _ => Err(self.unknown(name)),
        }
    }

    pub fn get_param(&self, name: &str) -> Result<f64> {
        match (name, &self.shape) {
            ("scale", _) => Ok(self.scale),
            ("radius", Shape::Sphere { radius }) => Ok(*radius),
            ("radius", Shape::ConvexPolyhedron { hull, .. }) => Ok(hull.insphere_radius()),
            _ => Err(self.unknown(name)),
        }
    }

    fn unknown(&self, name: &str) -> KSpaceError {
        KSpaceError::UnknownParameter {
            form_factor: self.kind().name(),
            param: name.to_string(),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the length scale
    ///
    /// For a scale factor l applied to the scattering density,
    /// S_l(k) = l^3 S(l k). Polyhedron geometry is re-derived from the hull.
    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        let geometry = self.geometry_at(scale)?;
        self.commit_scale(scale, geometry);
        Ok(())
    }

    /// Polyhedron geometry at `scale`, leaving the form factor untouched
    pub fn geometry_at(&self, scale: f64) -> Result<Option<PolyhedronGeometry>> {
        match &self.shape {
            Shape::ConvexPolyhedron { hull, .. } => {
                PolyhedronGeometry::from_hull(hull.as_ref(), scale).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Second half of `set_scale`; `geometry` comes from `geometry_at(scale)`
    pub(crate) fn commit_scale(&mut self, scale: f64, geometry: Option<PolyhedronGeometry>) {
        if let (Shape::ConvexPolyhedron { geometry: current, .. }, Some(g)) =
            (&mut self.shape, geometry)
        {
            *current = g;
        }
        self.scale = scale;
    }

    /// Unscaled radius; for polyhedra this is the in-sphere radius of the hull
    pub fn set_radius(&mut self, value: f64) -> Result<()> {
        let scale = self.scale;
        match &mut self.shape {
            Shape::Sphere { radius } => {
                *radius = value;
                Ok(())
            }
            Shape::ConvexPolyhedron { hull, geometry } => {
                let previous = hull.insphere_radius();
                hull.set_insphere_radius(value)?;
                match PolyhedronGeometry::from_hull(hull.as_ref(), scale) {
                    Ok(g) => {
                        *geometry = g;
                        Ok(())
                    }
                    Err(e) => hull.set_insphere_radius(previous).and(Err(e)),
                }
            }
            Shape::Delta => Err(KSpaceError::UnknownParameter {
                form_factor: FormFactorKind::Delta.name(),
                param: "radius".to_string(),
            }),
        }
    }

    pub fn density(&self) -> Complex64 {
        self.density
    }

    pub fn set_density(&mut self, density: Complex64) {
        self.density = density;
    }

    pub fn k_points(&self) -> &[Vector3<f64>] {
        &self.k_points
    }

    pub fn set_k_points(&mut self, k_points: Arc<[Vector3<f64>]>) {
        self.k_points = k_points;
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    pub fn orientations(&self) -> &[Quaternion<f64>] {
        &self.orientations
    }

    pub fn set_rq(&mut self, positions: &[Vector3<f64>], orientations: &[Quaternion<f64>]) -> Result<()> {
        if positions.len() != orientations.len() {
            return Err(KSpaceError::ShapeMismatch(format!(
                "{} positions but {} orientations",
                positions.len(),
                orientations.len()
            )));
        }
        self.positions = positions.to_vec();
        self.orientations = orientations.to_vec();
        Ok(())
    }

    /// Polyhedron geometry at the current scale, if this is a polyhedron
    pub fn geometry(&self) -> Option<&PolyhedronGeometry> {
        match &self.shape {
            Shape::ConvexPolyhedron { geometry, .. } => Some(geometry),
            _ => None,
        }
    }

    /// Evaluate the transform at every K point, in K-point order
    pub fn compute(&self) -> Result<Vec<Complex64>> {
        match &self.shape {
            Shape::Delta => Ok(self.compute_spherical(|_| 1.0)),
            Shape::Sphere { radius } => {
                let radius = *radius;
                Ok(self.compute_spherical(move |q| sphere_form_factor(q, radius)))
            }
            Shape::ConvexPolyhedron { geometry, .. } => self.compute_polyhedron(geometry),
        }
    }

    /// S(K) = density * scale^3 * sum_p F(|scale K|) exp(-i scale K . r_p)
    fn compute_spherical<F>(&self, amplitude: F) -> Vec<Complex64>
    where
        F: Fn(f64) -> f64 + Sync,
    {
        let prefactor = self.density * self.scale.powi(3);
        self.k_points
            .par_iter()
            .map(|k| {
                let ks = k * self.scale;
                let f = amplitude(ks.norm());
                let sum: Complex64 = self
                    .positions
                    .iter()
                    .map(|r| Complex64::new(0.0, -ks.dot(r)).exp())
                    .sum();
                sum * f * prefactor
            })
            .collect()
    }

    /// S(K) = density * sum_p exp(-i K . scale r_p) Spoly3D(q_p* K q_p)
    fn compute_polyhedron(&self, geometry: &PolyhedronGeometry) -> Result<Vec<Complex64>> {
        let positions: Vec<Vector3<f64>> = self.positions.iter().map(|r| r * self.scale).collect();
        let inverse: Vec<Quaternion<f64>> = self.orientations.iter().map(conjugate).collect();

        self.k_points
            .par_iter()
            .map(|k| {
                let mut sum = Complex64::new(0.0, 0.0);
                for (r, q_inv) in positions.iter().zip(&inverse) {
                    // FT of a rotated body at k equals FT of the unrotated body at the
                    // counter-rotated k.
                    let k_local = apply_quaternion(q_inv, k);
                    let s = geometry.checked_spoly3d(&k_local)?;
                    sum += Complex64::new(0.0, -k.dot(r)).exp() * s;
                }
                Ok(sum * self.density)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::hull::FacetedHull;
    use crate::utils::rotation::from_axis_angle;
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn k_set(ks: &[[f64; 3]]) -> Arc<[Vector3<f64>]> {
        ks.iter().map(|k| Vector3::from(*k)).collect()
    }

    #[test]
    fn test_single_delta_at_origin() {
        let mut ff = FormFactor::delta();
        ff.set_k_points(k_set(&[[0.0, 0.0, 0.0], [1.3, -0.4, 2.2]]));
        let s = ff.compute().unwrap();
        assert!((s[0] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!((s[1].norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_delta_off_origin_has_unit_magnitude() {
        let mut ff = FormFactor::delta();
        ff.set_rq(&[Vector3::new(0.3, 0.7, -1.1)], &[identity()]).unwrap();
        ff.set_k_points(k_set(&[[2.0, 1.0, 0.5]]));
        let s = ff.compute().unwrap();
        assert!((s[0].norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_delta_pair_interference() {
        // Two deltas half a period apart cancel
        let mut ff = FormFactor::delta();
        let r = [Vector3::zeros(), Vector3::new(0.5, 0.0, 0.0)];
        ff.set_rq(&r, &[identity(), identity()]).unwrap();
        ff.set_k_points(k_set(&[[2.0 * PI, 0.0, 0.0], [4.0 * PI, 0.0, 0.0]]));
        let s = ff.compute().unwrap();
        assert!(s[0].norm() < 1e-12);
        assert!((s[1].norm() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_density_multiplies() {
        let mut ff = FormFactor::delta();
        ff.set_density(Complex64::new(0.0, 2.0));
        ff.set_k_points(k_set(&[[0.0, 0.0, 0.0]]));
        let s = ff.compute().unwrap();
        assert!((s[0] - Complex64::new(0.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn test_sphere_zero_k_is_volume() {
        let mut ff = FormFactor::sphere();
        ff.set_param("radius", 0.75).unwrap();
        ff.set_k_points(k_set(&[[0.0, 0.0, 0.0]]));
        let s = ff.compute().unwrap();
        let volume = 4.0 / 3.0 * PI * 0.75f64.powi(3);
        assert!((s[0].re - volume).abs() < 1e-12);
        assert_eq!(ff.get_param("radius").unwrap(), 0.75);
    }

    #[test]
    fn test_parameter_validation() {
        let mut delta = FormFactor::delta();
        assert_eq!(delta.params(), &["scale"]);
        assert!(matches!(
            delta.set_param("radius", 1.0),
            Err(KSpaceError::UnknownParameter { form_factor: "Delta", .. })
        ));
        assert!(delta.get_param("radius").is_err());
        delta.set_param("scale", 2.5).unwrap();
        assert_eq!(delta.get_param("scale").unwrap(), 2.5);
    }

    #[test]
    fn test_rq_length_mismatch() {
        let mut ff = FormFactor::delta();
        let err = ff.set_rq(&[Vector3::zeros(), Vector3::x()], &[identity()]);
        assert!(matches!(err, Err(KSpaceError::ShapeMismatch(_))));
    }

    #[test]
    fn test_polyhedron_zero_k_is_scaled_volume() {
        let hull = FacetedHull::cube(1.0).unwrap();
        let mut ff = FormFactor::convex_polyhedron(Box::new(hull)).unwrap();
        ff.set_scale(2.0).unwrap();
        ff.set_k_points(k_set(&[[0.0, 0.0, 0.0]]));
        let s = ff.compute().unwrap();
        assert!((s[0].re - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_polyhedron_radius_rescales_hull() {
        let hull = FacetedHull::cube(2.0).unwrap();
        let mut ff = FormFactor::convex_polyhedron(Box::new(hull)).unwrap();
        ff.set_param("radius", 0.5).unwrap();
        assert!((ff.get_param("radius").unwrap() - 0.5).abs() < 1e-12);
        assert!((ff.geometry().unwrap().volume - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_failed_rescale_keeps_geometry() {
        let hull = FacetedHull::cube(2.0).unwrap();
        let mut ff = FormFactor::convex_polyhedron(Box::new(hull)).unwrap();

        assert!(matches!(ff.set_scale(0.0), Err(KSpaceError::DegenerateGeometry(_))));
        assert_eq!(ff.scale(), 1.0);
        assert!((ff.geometry().unwrap().volume - 8.0).abs() < 1e-12);

        // Hull rescale succeeds but the scaled areas overflow; radius is restored
        ff.set_scale(1e100).unwrap();
        assert!(ff.set_param("radius", 1e100).is_err());
        assert!((ff.get_param("radius").unwrap() - 1.0).abs() < 1e-12);
        assert!(ff.set_scale(1.0).is_ok());
        assert!((ff.geometry().unwrap().volume - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_polyhedron_non_finite_k_is_rejected() {
        let hull = FacetedHull::cube(1.0).unwrap();
        let mut ff = FormFactor::convex_polyhedron(Box::new(hull)).unwrap();
        for k in [[f64::NAN, 0.0, 0.0], [0.0, f64::INFINITY, 0.5]] {
            ff.set_k_points(k_set(&[[0.0, 0.0, 0.0], k]));
            assert!(matches!(
                ff.compute(),
                Err(KSpaceError::DivisionSingularity(_))
            ));
        }
    }

    #[test]
    fn test_polyhedron_orientation_rotates_k() {
        // Elongated box: a quarter turn about z swaps the x and y responses
        let points = vec![
            Vector3::new(-1.0, -0.25, -0.25),
            Vector3::new(1.0, -0.25, -0.25),
            Vector3::new(-1.0, 0.25, -0.25),
            Vector3::new(1.0, 0.25, -0.25),
            Vector3::new(-1.0, -0.25, 0.25),
            Vector3::new(1.0, -0.25, 0.25),
            Vector3::new(-1.0, 0.25, 0.25),
            Vector3::new(1.0, 0.25, 0.25),
        ];
        let cube = FacetedHull::cube(1.0).unwrap();
        let hull = FacetedHull::new(points, cube.facets().to_vec()).unwrap();

        let mut ff = FormFactor::convex_polyhedron(Box::new(hull)).unwrap();
        ff.set_k_points(k_set(&[[1.2, 0.0, 0.0], [0.0, 1.2, 0.0]]));
        let upright = ff.compute().unwrap();

        let q = from_axis_angle(&Vector3::z(), FRAC_PI_2);
        ff.set_rq(&[Vector3::zeros()], &[q]).unwrap();
        let turned = ff.compute().unwrap();

        assert!((upright[0] - turned[1]).norm() < 1e-10);
        assert!((upright[1] - turned[0]).norm() < 1e-10);
        assert!((upright[0] - upright[1]).norm() > 1e-3);
    }

    #[test]
    fn test_polyhedron_translation_is_phase() {
        let hull = FacetedHull::octahedron(1.0).unwrap();
        let mut ff = FormFactor::convex_polyhedron(Box::new(hull)).unwrap();
        let k = Vector3::new(0.9, -0.3, 0.4);
        ff.set_k_points(k_set(&[[k.x, k.y, k.z]]));
        let centered = ff.compute().unwrap()[0];

        let r = Vector3::new(0.5, 1.0, -2.0);
        ff.set_rq(&[r], &[identity()]).unwrap();
        let shifted = ff.compute().unwrap()[0];

        let expected = centered * Complex64::new(0.0, -k.dot(&r)).exp();
        assert!((shifted - expected).norm() < 1e-10);
    }

    proptest! {
        #[test]
        fn delta_scaling_law(
            lambda in 0.2f64..4.0,
            kx in -3.0f64..3.0, ky in -3.0f64..3.0, kz in -3.0f64..3.0,
            rx in -2.0f64..2.0, ry in -2.0f64..2.0, rz in -2.0f64..2.0,
        ) {
            let k = Vector3::new(kx, ky, kz);
            let positions = [Vector3::zeros(), Vector3::new(rx, ry, rz)];
            let orientations = [identity(), identity()];

            let mut scaled = FormFactor::delta();
            scaled.set_rq(&positions, &orientations).unwrap();
            scaled.set_scale(lambda).unwrap();
            scaled.set_k_points(Arc::from(vec![k]));

            let mut unit = FormFactor::delta();
            unit.set_rq(&positions, &orientations).unwrap();
            unit.set_k_points(Arc::from(vec![k * lambda]));

            let lhs = scaled.compute().unwrap()[0];
            let rhs = unit.compute().unwrap()[0] * lambda.powi(3);
            prop_assert!((lhs - rhs).norm() < 1e-9 * (1.0 + rhs.norm()));
        }
    }
}
