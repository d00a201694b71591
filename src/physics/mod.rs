// src/physics/mod.rs
pub mod constraint;
pub mod error;
pub mod form_factor;
pub mod hull;
pub mod lattice_points;
pub mod reciprocal;
pub mod single_cell;
pub mod spots;
pub mod structure_factor;
pub mod validity;

// Re-exports for cleaner imports
pub use constraint::{AlignedBox, Constraint};
pub use error::{KSpaceError, Result};
pub use form_factor::{FormFactor, FormFactorKind};
pub use hull::{ConvexHull, FacetedHull};
pub use single_cell::SingleCell3D;
pub use spots::{DiffractionImage, Spot};
pub use structure_factor::{PeakAnalysis, StructureFactor3D};
pub use validity::{Stage, Validity};
