//src/model/mod.rs
pub mod cell;
pub mod particle;

pub use cell::Cell;
pub use particle::ParticleType;
