// src/physics/error.rs

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum KSpaceError {
    /// Position/orientation arrays have the wrong width or disagree in length
    ShapeMismatch(String),
    DuplicateName(String),
    UnknownName(String),
    UnknownParameter { form_factor: &'static str, param: String },
    NoFormFactor(String),
    DegenerateGeometry(String),
    DivisionSingularity(String),
    UnboundedSearch,
}

impl fmt::Display for KSpaceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KSpaceError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            KSpaceError::DuplicateName(name) => {
                write!(f, "Particle type '{}' already exists", name)
            }
            KSpaceError::UnknownName(name) => write!(f, "No particle type named '{}'", name),
            KSpaceError::UnknownParameter { form_factor, param } => write!(
                f,
                "Form factor {} does not have parameter '{}'",
                form_factor, param
            ),
            KSpaceError::NoFormFactor(name) => {
                write!(f, "Particle type '{}' has no form factor assigned", name)
            }
            KSpaceError::DegenerateGeometry(msg) => write!(f, "Degenerate geometry: {}", msg),
            KSpaceError::DivisionSingularity(msg) => write!(f, "Division singularity: {}", msg),
            KSpaceError::UnboundedSearch => write!(
                f,
                "Constraint radius is not finite; lattice search cannot be bounded"
            ),
        }
    }
}

impl std::error::Error for KSpaceError {}

pub type Result<T> = std::result::Result<T, KSpaceError>;
