// src/physics/lattice_points.rs
use super::constraint::Constraint;
use super::error::{KSpaceError, Result};
use log::debug;
use nalgebra::Vector3;

/// Approximate shortest nonzero lattice vector length
///
/// Checks v1 + v2 + v3 and the 26 nonzero {-1, 0, 1} combinations.
/// This is not a lattice reduction and can overestimate for skewed bases.
pub fn shortest_vector_estimate(v1: &Vector3<f64>, v2: &Vector3<f64>, v3: &Vector3<f64>) -> f64 {
    let mut g2 = (v1 + v2 + v3).norm_squared();
    for h in -1..=1 {
        for k in -1..=1 {
            for l in -1..=1 {
                if h == 0 && k == 0 && l == 0 {
                    continue;
                }
                let mag2 = combine(v1, v2, v3, h, k, l).norm_squared();
                if mag2 < g2 {
                    g2 = mag2;
                }
            }
        }
    }
    g2.sqrt()
}

/// All lattice points `h v1 + k v2 + l v3` satisfying `constraint`
///
/// Indices run over `[-nmax, nmax]` with `nmax = floor(R / G) + 1`, where `R`
/// is the constraint radius and `G` the shortest-vector estimate. Points come
/// back h-major, then k, then l; downstream K-point indexing relies on it.
///
/// Cost is O(nmax^3), so a nearly degenerate basis (tiny G) is expensive.
pub fn constrained_lattice_points(
    v1: &Vector3<f64>,
    v2: &Vector3<f64>,
    v3: &Vector3<f64>,
    constraint: &Constraint,
) -> Result<Vec<Vector3<f64>>> {
    let radius = constraint.radius();
    if !radius.is_finite() {
        return Err(KSpaceError::UnboundedSearch);
    }

    let g = shortest_vector_estimate(v1, v2, v3);
    if g <= 0.0 || !g.is_finite() {
        return Err(KSpaceError::DegenerateGeometry(
            "lattice has no nonzero vector to bound the search".into(),
        ));
    }

    let nmax = (radius / g).floor() as i64 + 1;
    debug!("lattice search: G = {:.6}, R = {:.6}, nmax = {}", g, radius, nmax);

    let mut points = Vec::new();
    for h in -nmax..=nmax {
        for k in -nmax..=nmax {
            for l in -nmax..=nmax {
                let candidate = combine(v1, v2, v3, h, k, l);
                if constraint.satisfies(&candidate) {
                    points.push(candidate);
                }
            }
        }
    }

    Ok(points)
}

fn combine(
    v1: &Vector3<f64>,
    v2: &Vector3<f64>,
    v3: &Vector3<f64>,
    h: i64,
    k: i64,
    l: i64,
) -> Vector3<f64> {
    v1 * h as f64 + v2 * k as f64 + v3 * l as f64
}

// --- Integer coordinates of simple lattices, centered on the origin ---

fn centered_range(n: usize) -> std::ops::Range<i64> {
    let start = -((n / 2) as i64);
    start..start + n as i64
}

fn coords_where(nx: usize, ny: usize, nz: usize, keep: impl Fn(i64, i64, i64) -> bool) -> Vec<[i64; 3]> {
    let mut coords = Vec::new();
    for i in centered_range(nx) {
        for j in centered_range(ny) {
            for k in centered_range(nz) {
                if keep(i, j, k) {
                    coords.push([i, j, k]);
                }
            }
        }
    }
    coords
}

/// Simple cubic: every integer point of an nx x ny x nz block
pub fn sc_coords(nx: usize, ny: usize, nz: usize) -> Vec<[i64; 3]> {
    coords_where(nx, ny, nz, |_, _, _| true)
}

/// Body-centered cubic in half-lattice units: all-even or all-odd indices
pub fn bcc_coords(nx: usize, ny: usize, nz: usize) -> Vec<[i64; 3]> {
    coords_where(nx, ny, nz, |i, j, k| {
        i.rem_euclid(2) == j.rem_euclid(2) && i.rem_euclid(2) == k.rem_euclid(2)
    })
}

/// Face-centered cubic in half-lattice units: even index sum
pub fn fcc_coords(nx: usize, ny: usize, nz: usize) -> Vec<[i64; 3]> {
    coords_where(nx, ny, nz, |i, j, k| (i + j + k).rem_euclid(2) == 0)
}
