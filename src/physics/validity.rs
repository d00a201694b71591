// src/physics/validity.rs
use std::fmt;

/// Cached derived quantities of a single-cell calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Direct and reciprocal lattice vectors
    Bases,
    /// K-point selection constraint (detector slab)
    KConstraint,
    /// K points satisfying the constraint
    KPoints,
    /// Aggregate Fourier transform
    Transform,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Bases, Stage::KConstraint, Stage::KPoints, Stage::Transform];

    fn index(self) -> usize {
        self as usize
    }

    /// Stages computed directly from this one
    pub fn downstream(self) -> &'static [Stage] {
        match self {
            Stage::Bases => &[Stage::KConstraint],
            Stage::KConstraint => &[Stage::KPoints],
            Stage::KPoints => &[Stage::Transform],
            Stage::Transform => &[],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Bases => "bases",
            Stage::KConstraint => "K constraint",
            Stage::KPoints => "K points",
            Stage::Transform => "FT",
        };
        f.write_str(name)
    }
}

/// Validity flags over the stage dependency table
///
/// Invalidating a stage invalidates everything downstream of it; nothing
/// ever propagates upward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validity {
    valid: [bool; 4],
}

impl Validity {
    pub fn is_valid(&self, stage: Stage) -> bool {
        self.valid[stage.index()]
    }

    pub fn mark_valid(&mut self, stage: Stage) {
        self.valid[stage.index()] = true;
    }

    pub fn invalidate(&mut self, stage: Stage) {
        self.valid[stage.index()] = false;
        for &next in stage.downstream() {
            self.invalidate(next);
        }
    }

    pub fn flags(&self) -> [(Stage, bool); 4] {
        Stage::ALL.map(|s| (s, self.is_valid(s)))
    }
}
