// src/physics/single_cell.rs
//! Single-cell diffraction: particle types in one real-space cell, the K
//! points on a detector slab, and the summed Fourier transform.
//!
//! Derived state is cached per stage (see [`Stage`]). Mutators only mark
//! stages stale; the caller decides when to run `update_*` and `calculate`.

use super::constraint::{AlignedBox, Constraint};
use super::error::{KSpaceError, Result};
use super::form_factor::{FormFactor, FormFactorKind};
use super::lattice_points::constrained_lattice_points;
use super::reciprocal::reciprocal_basis;
use super::spots::{DiffractionImage, Spot};
use super::validity::{Stage, Validity};
use crate::config::Config;
use crate::model::{Cell, ParticleType};
use crate::utils::linalg::matrix_from_rows;
use log::{debug, info, warn};
use nalgebra::{Matrix3, Quaternion, Vector3};
use num_complex::Complex64;
use std::sync::Arc;

#[derive(Debug)]
pub struct SingleCell3D {
    k: f64,
    ndiv: usize,
    dk: f64,
    cell: Cell,

    a: [Vector3<f64>; 3],
    g: [Vector3<f64>; 3],
    k_max: f64,
    k_constraint: Constraint,
    k_points: Arc<[Vector3<f64>]>,
    ft: Vec<Complex64>,

    ptypes: Vec<ParticleType>,
    validity: Validity,
}

impl SingleCell3D {
    /// Build an assembly and run the bases, constraint and K-point stages
    ///
    /// Only the transform is left stale.
    pub fn new(cell: Cell, ndiv: usize, dk: f64, k: f64) -> Result<Self> {
        let mut sc = Self {
            k,
            ndiv,
            dk,
            cell,
            a: [Vector3::zeros(); 3],
            g: [Vector3::zeros(); 3],
            k_max: 0.0,
            k_constraint: Constraint::Unconstrained,
            k_points: Arc::from(Vec::new()),
            ft: Vec::new(),
            ptypes: Vec::new(),
            validity: Validity::default(),
        };
        sc.update_bases()?;
        sc.update_k_constraint();
        sc.update_kpoints()?;
        Ok(sc)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let cell = Cell::new(matrix_from_rows(config.box_matrix), config.scale);
        Self::new(cell, config.ndiv, config.dk, config.k)
    }

    // --- particle types ---

    fn index_of(&self, name: &str) -> Result<usize> {
        self.ptypes
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| KSpaceError::UnknownName(name.to_string()))
    }

    fn ptype_mut(&mut self, name: &str) -> Result<&mut ParticleType> {
        let i = self.index_of(name)?;
        Ok(&mut self.ptypes[i])
    }

    /// Register a new, inactive particle type with no particles
    pub fn add_ptype(&mut self, name: &str) -> Result<()> {
        if self.index_of(name).is_ok() {
            return Err(KSpaceError::DuplicateName(name.to_string()));
        }
        self.ptypes.push(ParticleType::new(name));
        debug!("Added particle type '{}'", name);
        Ok(())
    }

    pub fn remove_ptype(&mut self, name: &str) -> Result<()> {
        let i = self.index_of(name)?;
        let removed = self.ptypes.remove(i);
        if removed.active {
            self.validity.invalidate(Stage::Transform);
        }
        debug!("Removed particle type '{}'", name);
        Ok(())
    }

    /// Names in insertion order
    pub fn ptypes(&self) -> Vec<&str> {
        self.ptypes.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn ptype(&self, name: &str) -> Result<&ParticleType> {
        let i = self.index_of(name)?;
        Ok(&self.ptypes[i])
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        self.set_activity(name, true)
    }

    pub fn set_inactive(&mut self, name: &str) -> Result<()> {
        self.set_activity(name, false)
    }

    fn set_activity(&mut self, name: &str, active: bool) -> Result<()> {
        let p = self.ptype_mut(name)?;
        if p.active != active {
            p.active = active;
            self.validity.invalidate(Stage::Transform);
        }
        Ok(())
    }

    /// Indices (into `ptypes()`) of the active types
    pub fn active_types(&self) -> Vec<usize> {
        self.ptypes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.active)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn form_factor_kinds(&self) -> &'static [FormFactorKind] {
        &FormFactorKind::ALL
    }

    /// Attach a form factor to a type
    ///
    /// Remembered parameters the form factor declares are applied first, then
    /// the global scale, the type's particles and the current K points.
    pub fn set_form_factor(&mut self, name: &str, mut ff: FormFactor) -> Result<()> {
        let scale = self.cell.scale;
        let k_points = Arc::clone(&self.k_points);
        let p = self.ptype_mut(name)?;

        for (param, value) in &p.params {
            if ff.kind().has_param(param) {
                ff.set_param(param, *value)?;
            }
        }
        ff.set_scale(scale)?;
        ff.set_rq(&p.positions, &p.orientations)?;
        ff.set_k_points(k_points);

        debug!("Particle type '{}' uses {} form factor", name, ff.kind());
        p.form_factor = Some(ff);
        if p.active {
            self.validity.invalidate(Stage::Transform);
        }
        Ok(())
    }

    /// Store a named parameter for a type and forward it to its form factor
    ///
    /// The value is kept even when the current form factor rejects it.
    pub fn set_param(&mut self, name: &str, param: &str, value: f64) -> Result<()> {
        let p = self.ptype_mut(name)?;
        p.params.insert(param.to_string(), value);

        let Some(ff) = p.form_factor.as_mut() else {
            warn!(
                "Particle type '{}' has no form factor yet; '{}' will apply once one is set",
                name, param
            );
            return Ok(());
        };
        if !ff.kind().has_param(param) {
            return Err(KSpaceError::UnknownParameter {
                form_factor: ff.kind().name(),
                param: param.to_string(),
            });
        }
        ff.set_param(param, value)?;
        if p.active {
            self.validity.invalidate(Stage::Transform);
        }
        Ok(())
    }

    pub fn get_param(&self, name: &str, param: &str) -> Result<f64> {
        let p = self.ptype(name)?;
        match &p.form_factor {
            Some(ff) if ff.kind().has_param(param) => ff.get_param(param),
            Some(ff) => Err(KSpaceError::UnknownParameter {
                form_factor: ff.kind().name(),
                param: param.to_string(),
            }),
            None => p.params.get(param).copied().ok_or_else(|| KSpaceError::UnknownParameter {
                form_factor: "none",
                param: param.to_string(),
            }),
        }
    }

    pub fn set_density(&mut self, name: &str, density: Complex64) -> Result<()> {
        let p = self.ptype_mut(name)?;
        let ff = p
            .form_factor
            .as_mut()
            .ok_or_else(|| KSpaceError::NoFormFactor(name.to_string()))?;
        ff.set_density(density);
        if p.active {
            self.validity.invalidate(Stage::Transform);
        }
        Ok(())
    }

    /// Replace the particles of a type (unscaled positions, unit quaternions)
    pub fn set_rq(
        &mut self,
        name: &str,
        positions: &[Vector3<f64>],
        orientations: &[Quaternion<f64>],
    ) -> Result<()> {
        if positions.len() != orientations.len() {
            return Err(KSpaceError::ShapeMismatch(format!(
                "{} positions but {} orientations",
                positions.len(),
                orientations.len()
            )));
        }
        let p = self.ptype_mut(name)?;
        if let Some(ff) = p.form_factor.as_mut() {
            ff.set_rq(positions, orientations)?;
        }
        p.positions = positions.to_vec();
        p.orientations = orientations.to_vec();
        if p.active {
            self.validity.invalidate(Stage::Transform);
        }
        Ok(())
    }

    /// `set_rq` from flat arrays: `[x, y, z, ...]` and `[w, x, y, z, ...]`
    pub fn set_rq_flat(&mut self, name: &str, positions: &[f64], orientations: &[f64]) -> Result<()> {
        if positions.len() % 3 != 0 || orientations.len() % 4 != 0 {
            return Err(KSpaceError::ShapeMismatch(format!(
                "positions need width 3 and orientations width 4, got {} and {} values",
                positions.len(),
                orientations.len()
            )));
        }
        let r: Vec<Vector3<f64>> = positions
            .chunks_exact(3)
            .map(|c| Vector3::new(c[0], c[1], c[2]))
            .collect();
        let q: Vec<Quaternion<f64>> = orientations
            .chunks_exact(4)
            .map(|c| Quaternion::new(c[0], c[1], c[2], c[3]))
            .collect();
        self.set_rq(name, &r, &q)
    }

    // --- global parameters ---

    pub fn set_box(&mut self, box_matrix: Matrix3<f64>) {
        self.cell.box_matrix = box_matrix;
        self.validity.invalidate(Stage::Bases);
    }

    /// Change the global length scale, forwarded to every form factor
    ///
    /// Every polyhedron is rebuilt at the new scale before anything is
    /// committed, so a failure leaves the assembly unchanged.
    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        let staged = self
            .ptypes
            .iter()
            .map(|p| p.form_factor.as_ref().map(|ff| ff.geometry_at(scale)).transpose())
            .collect::<Result<Vec<_>>>()?;

        for (p, geometry) in self.ptypes.iter_mut().zip(staged) {
            if let (Some(ff), Some(geometry)) = (p.form_factor.as_mut(), geometry) {
                ff.commit_scale(scale, geometry);
            }
        }
        self.cell.scale = scale;
        self.validity.invalidate(Stage::Bases);
        Ok(())
    }

    pub fn set_ndiv(&mut self, ndiv: usize) {
        self.ndiv = ndiv;
        self.validity.invalidate(Stage::KConstraint);
    }

    pub fn set_dk(&mut self, dk: f64) {
        self.dk = dk;
        self.validity.invalidate(Stage::KConstraint);
    }

    /// Probe wave number; stored only, nothing depends on it yet
    pub fn set_k(&mut self, k: f64) {
        self.k = k;
    }

    // --- stages ---

    pub fn update_bases(&mut self) -> Result<()> {
        self.validity.invalidate(Stage::Bases);
        let a = self.cell.vectors();
        let g = reciprocal_basis(&a[0], &a[1], &a[2])?;
        self.a = a;
        self.g = g;
        self.validity.mark_valid(Stage::Bases);
        debug!("Updated {}: |g| = ({:.4}, {:.4}, {:.4})", Stage::Bases, g[0].norm(), g[1].norm(), g[2].norm());
        Ok(())
    }

    pub fn update_k_constraint(&mut self) {
        self.validity.invalidate(Stage::KConstraint);
        self.k_max = self.dk * self.ndiv as f64;
        let eps = (self.dk / 2.0).abs();
        self.k_constraint = AlignedBox::slab(self.k_max, eps).into();
        self.validity.mark_valid(Stage::KConstraint);
        debug!("Updated {}: Kmax = {}, eps = {}", Stage::KConstraint, self.k_max, eps);
    }

    pub fn update_kpoints(&mut self) -> Result<()> {
        self.validity.invalidate(Stage::KPoints);
        let [g1, g2, g3] = &self.g;
        let points = constrained_lattice_points(g1, g2, g3, &self.k_constraint)?;
        self.k_points = Arc::from(points);
        for p in &mut self.ptypes {
            if let Some(ff) = p.form_factor.as_mut() {
                ff.set_k_points(Arc::clone(&self.k_points));
            }
        }
        self.validity.mark_valid(Stage::KPoints);
        info!("Selected {} K points", self.k_points.len());
        Ok(())
    }

    /// Sum the transforms of every active type at the current K points
    pub fn calculate(&mut self) -> Result<&[Complex64]> {
        self.validity.invalidate(Stage::Transform);
        if !self.validity.is_valid(Stage::KPoints) {
            warn!("Calculating FT with stale K points; call update_kpoints first");
        }

        let mut ft = vec![Complex64::new(0.0, 0.0); self.k_points.len()];
        for p in self.ptypes.iter().filter(|p| p.active) {
            let ff = p
                .form_factor
                .as_ref()
                .ok_or_else(|| KSpaceError::NoFormFactor(p.name.clone()))?;
            let s = ff.compute()?;
            if s.len() != ft.len() {
                return Err(KSpaceError::ShapeMismatch(format!(
                    "'{}' returned {} values for {} K points",
                    p.name,
                    s.len(),
                    ft.len()
                )));
            }
            for (acc, v) in ft.iter_mut().zip(&s) {
                *acc += v;
            }
        }

        self.ft = ft;
        self.validity.mark_valid(Stage::Transform);
        info!("Calculated FT over {} active types", self.active_types().len());
        Ok(&self.ft)
    }

    /// Render the current transform on the slab's x/y extent
    pub fn diffraction_image(&self, shape: (usize, usize), spot: Spot) -> Result<DiffractionImage> {
        let e = self.k_extent();
        DiffractionImage::render(shape, [e[0], e[1], e[2], e[3]], &self.k_points, &self.ft, spot)
    }

    // --- accessors ---

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn ndiv(&self) -> usize {
        self.ndiv
    }

    pub fn dk(&self) -> f64 {
        self.dk
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn k_max(&self) -> f64 {
        self.k_max
    }

    pub fn k_constraint(&self) -> &Constraint {
        &self.k_constraint
    }

    /// `[xlo, xhi, ylo, yhi, zlo, zhi]` of the K constraint
    pub fn k_extent(&self) -> [f64; 6] {
        match &self.k_constraint {
            Constraint::AlignedBox(b) => b.extent(),
            Constraint::Unconstrained => [
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
            ],
        }
    }

    pub fn k_points(&self) -> &[Vector3<f64>] {
        &self.k_points
    }

    pub fn lattice_vectors(&self) -> &[Vector3<f64>; 3] {
        &self.a
    }

    pub fn reciprocal_vectors(&self) -> &[Vector3<f64>; 3] {
        &self.g
    }

    pub fn transform(&self) -> &[Complex64] {
        &self.ft
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn bases_valid(&self) -> bool {
        self.validity.is_valid(Stage::Bases)
    }

    pub fn k_constraint_valid(&self) -> bool {
        self.validity.is_valid(Stage::KConstraint)
    }

    pub fn kpoints_valid(&self) -> bool {
        self.validity.is_valid(Stage::KPoints)
    }

    pub fn ft_valid(&self) -> bool {
        self.validity.is_valid(Stage::Transform)
    }
}
