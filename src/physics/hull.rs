// src/physics/hull.rs
// Convex polyhedron geometry consumed by the polyhedral form factor.

use super::error::{KSpaceError, Result};
use nalgebra::Vector3;
use std::fmt;

/// Geometry queries the polyhedral form factor needs from a convex hull
///
/// Facet vertex loops are ordered counter-clockwise when viewed from outside,
/// and `facet_plane(i)` returns the outward unit normal `n` and offset `d`
/// of the plane `{x : n . x = d}`.
pub trait ConvexHull: fmt::Debug + Send + Sync {
    fn points(&self) -> &[Vector3<f64>];
    fn facets(&self) -> &[Vec<usize>];
    fn facet_plane(&self, i: usize) -> (Vector3<f64>, f64);
    fn facet_area(&self, i: usize) -> f64;
    fn volume(&self) -> f64;
    fn insphere_radius(&self) -> f64;
    /// Uniformly rescale the hull about the origin to the given in-sphere radius
    fn set_insphere_radius(&mut self, radius: f64) -> Result<()>;
}

/// Convex polyhedron given by its vertices and facet loops
///
/// Planes, areas and volume are derived from the loops; facets are reoriented
/// so that every normal points away from the vertex centroid. The in-sphere
/// is taken to be centered on the origin.
#[derive(Debug, Clone)]
pub struct FacetedHull {
    points: Vec<Vector3<f64>>,
    facets: Vec<Vec<usize>>,
    normals: Vec<Vector3<f64>>,
    offsets: Vec<f64>,
    areas: Vec<f64>,
    volume: f64,
}

impl FacetedHull {
    pub fn new(points: Vec<Vector3<f64>>, mut facets: Vec<Vec<usize>>) -> Result<Self> {
        if points.is_empty() || facets.len() < 4 {
            return Err(KSpaceError::DegenerateGeometry(format!(
                "polyhedron needs at least 4 facets, got {}",
                facets.len()
            )));
        }

        let center = points.iter().fold(Vector3::zeros(), |acc, p| acc + p) / points.len() as f64;

        for (i, facet) in facets.iter_mut().enumerate() {
            if facet.len() < 3 {
                return Err(KSpaceError::DegenerateGeometry(format!(
                    "facet {} has {} vertices",
                    i,
                    facet.len()
                )));
            }
            if let Some(&bad) = facet.iter().find(|&&v| v >= points.len()) {
                return Err(KSpaceError::DegenerateGeometry(format!(
                    "facet {} references vertex {} of {}",
                    i,
                    bad,
                    points.len()
                )));
            }

            let (area_vec, centroid) = loop_area_vector(&points, facet);
            if area_vec.dot(&(centroid - center)) < 0.0 {
                facet.reverse();
            }
        }

        let planes = Planes::derive(&points, &facets)?;
        Ok(Self {
            points,
            facets,
            normals: planes.normals,
            offsets: planes.offsets,
            areas: planes.areas,
            volume: planes.volume,
        })
    }

    /// Axis-aligned cube of the given edge length centered on the origin
    pub fn cube(edge: f64) -> Result<Self> {
        let h = edge / 2.0;
        let points = (0..8)
            .map(|idx| {
                let pick = |bit: usize| if idx & bit != 0 { h } else { -h };
                Vector3::new(pick(1), pick(2), pick(4))
            })
            .collect();
        let facets = vec![
            vec![1, 3, 7, 5],
            vec![0, 4, 6, 2],
            vec![2, 6, 7, 3],
            vec![0, 1, 5, 4],
            vec![4, 5, 7, 6],
            vec![0, 2, 3, 1],
        ];
        Self::new(points, facets)
    }

    /// Regular octahedron with vertices at distance `r` along each axis
    pub fn octahedron(r: f64) -> Result<Self> {
        let points = vec![
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(-r, 0.0, 0.0),
            Vector3::new(0.0, r, 0.0),
            Vector3::new(0.0, -r, 0.0),
            Vector3::new(0.0, 0.0, r),
            Vector3::new(0.0, 0.0, -r),
        ];
        let mut facets = Vec::with_capacity(8);
        for x in [0, 1] {
            for y in [2, 3] {
                for z in [4, 5] {
                    facets.push(vec![x, y, z]);
                }
            }
        }
        Self::new(points, facets)
    }
}

/// Planes, areas and volume derived from a set of oriented facet loops
struct Planes {
    normals: Vec<Vector3<f64>>,
    offsets: Vec<f64>,
    areas: Vec<f64>,
    volume: f64,
}

impl Planes {
    fn derive(points: &[Vector3<f64>], facets: &[Vec<usize>]) -> Result<Self> {
        let mut normals = Vec::with_capacity(facets.len());
        let mut offsets = Vec::with_capacity(facets.len());
        let mut areas = Vec::with_capacity(facets.len());

        for (i, facet) in facets.iter().enumerate() {
            let (area_vec, centroid) = loop_area_vector(points, facet);
            let area = area_vec.norm();
            if !(area > 0.0) || !area.is_finite() {
                return Err(KSpaceError::DegenerateGeometry(format!(
                    "facet {} has area {}",
                    i, area
                )));
            }
            let normal = area_vec / area;
            offsets.push(normal.dot(&centroid));
            normals.push(normal);
            areas.push(area);
        }

        // Divergence theorem: V = 1/3 sum(A_i d_i)
        let volume = areas.iter().zip(&offsets).map(|(a, d)| a * d).sum::<f64>() / 3.0;
        if !(volume > 0.0) || !volume.is_finite() {
            return Err(KSpaceError::DegenerateGeometry(format!(
                "polyhedron volume is {}",
                volume
            )));
        }

        Ok(Self {
            normals,
            offsets,
            areas,
            volume,
        })
    }
}

/// Newell area vector (|a| = area, a / |a| = normal) and vertex centroid of a loop
fn loop_area_vector(points: &[Vector3<f64>], facet: &[usize]) -> (Vector3<f64>, Vector3<f64>) {
    let mut twice_area = Vector3::zeros();
    let mut centroid = Vector3::zeros();
    for (j, &v) in facet.iter().enumerate() {
        let p0 = &points[v];
        let p1 = &points[facet[(j + 1) % facet.len()]];
        twice_area += p0.cross(p1);
        centroid += p0;
    }
    (twice_area / 2.0, centroid / facet.len() as f64)
}

impl ConvexHull for FacetedHull {
    fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    fn facets(&self) -> &[Vec<usize>] {
        &self.facets
    }

    fn facet_plane(&self, i: usize) -> (Vector3<f64>, f64) {
        (self.normals[i], self.offsets[i])
    }

    fn facet_area(&self, i: usize) -> f64 {
        self.areas[i]
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn insphere_radius(&self) -> f64 {
        self.offsets.iter().copied().fold(f64::INFINITY, f64::min).max(0.0)
    }

    fn set_insphere_radius(&mut self, radius: f64) -> Result<()> {
        let current = self.insphere_radius();
        if current <= 0.0 || radius <= 0.0 || !radius.is_finite() {
            return Err(KSpaceError::DegenerateGeometry(format!(
                "cannot rescale in-sphere radius {} to {}",
                current, radius
            )));
        }
        let factor = radius / current;
        let points: Vec<Vector3<f64>> = self.points.iter().map(|p| p * factor).collect();
        let planes = Planes::derive(&points, &self.facets)?;

        self.points = points;
        self.normals = planes.normals;
        self.offsets = planes.offsets;
        self.areas = planes.areas;
        self.volume = planes.volume;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_geometry() {
        let cube = FacetedHull::cube(2.0).unwrap();
        assert_eq!(cube.facets().len(), 6);
        assert!((cube.volume() - 8.0).abs() < 1e-12);
        assert!((cube.insphere_radius() - 1.0).abs() < 1e-12);

        for i in 0..6 {
            let (n, d) = cube.facet_plane(i);
            assert!((n.norm() - 1.0).abs() < 1e-12);
            assert!((d - 1.0).abs() < 1e-12);
            assert!((cube.facet_area(i) - 4.0).abs() < 1e-12);
        }

        // +x facet is listed first
        let (n, _) = cube.facet_plane(0);
        assert!((n - Vector3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_inward_loops_are_reoriented() {
        let mut cube = FacetedHull::cube(1.0).unwrap();
        let mut facets = cube.facets().to_vec();
        for f in &mut facets {
            f.reverse();
        }
        cube = FacetedHull::new(cube.points().to_vec(), facets).unwrap();
        assert!((cube.volume() - 1.0).abs() < 1e-12);
        let (n, _) = cube.facet_plane(0);
        assert!((n - Vector3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_octahedron_geometry() {
        let r = 1.5;
        let oct = FacetedHull::octahedron(r).unwrap();
        assert_eq!(oct.facets().len(), 8);
        assert!((oct.volume() - 4.0 / 3.0 * r.powi(3)).abs() < 1e-12);
        assert!((oct.insphere_radius() - r / 3f64.sqrt()).abs() < 1e-12);
        assert!((oct.facet_area(3) - 3f64.sqrt() / 2.0 * r * r).abs() < 1e-12);
    }

    #[test]
    fn test_set_insphere_radius_scales_uniformly() {
        let mut cube = FacetedHull::cube(2.0).unwrap();
        cube.set_insphere_radius(3.0).unwrap();
        assert!((cube.insphere_radius() - 3.0).abs() < 1e-12);
        assert!((cube.volume() - 216.0).abs() < 1e-9);
        assert!((cube.facet_area(2) - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_rescale_leaves_hull_intact() {
        let mut cube = FacetedHull::cube(2.0).unwrap();
        assert!(matches!(
            cube.set_insphere_radius(1e300),
            Err(KSpaceError::DegenerateGeometry(_))
        ));
        assert!((cube.insphere_radius() - 1.0).abs() < 1e-12);
        assert!((cube.volume() - 8.0).abs() < 1e-12);
        assert_eq!(cube.points()[7], Vector3::new(1.0, 1.0, 1.0));
        for i in 0..cube.facets().len() {
            let (n, d) = cube.facet_plane(i);
            assert!((n.norm() - 1.0).abs() < 1e-12 && (d - 1.0).abs() < 1e-12);
        }

        cube.set_insphere_radius(0.5).unwrap();
        assert!((cube.volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_facet_is_rejected() {
        let cube = FacetedHull::cube(1.0).unwrap();
        let mut facets = cube.facets().to_vec();
        facets[0] = vec![1, 3];
        assert!(matches!(
            FacetedHull::new(cube.points().to_vec(), facets),
            Err(KSpaceError::DegenerateGeometry(_))
        ));
    }
}
