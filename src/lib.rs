// src/lib.rs
//! Fourier transforms of oriented particles (deltas, spheres, convex
//! polyhedra) evaluated on the reciprocal lattice points of a single cell
//! that fall on a thin detector slab.

pub mod config;
pub mod model;
pub mod physics;
pub mod utils;

pub use config::Config;
pub use model::{Cell, ParticleType};
pub use physics::{
    FacetedHull, FormFactor, FormFactorKind, KSpaceError, SingleCell3D, Spot, Stage,
};
