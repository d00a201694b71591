// src/model/particle.rs
use crate::physics::form_factor::FormFactor;
use nalgebra::{Quaternion, Vector3};
use std::collections::BTreeMap;

/// A named species of particles sharing one form factor
///
/// Parameters set by name are remembered here even when the current form
/// factor does not declare them, so a later form factor can pick them up.
#[derive(Debug)]
pub struct ParticleType {
    pub name: String,
    pub positions: Vec<Vector3<f64>>,
    pub orientations: Vec<Quaternion<f64>>,
    pub form_factor: Option<FormFactor>,
    pub params: BTreeMap<String, f64>,
    pub active: bool,
}

impl ParticleType {
    /// New types start empty and inactive; parameters must be set first.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            positions: Vec::new(),
            orientations: Vec::new(),
            form_factor: None,
            params: BTreeMap::new(),
            active: false,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
