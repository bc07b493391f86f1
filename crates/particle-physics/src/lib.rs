//! # Particle Physics
//!
//! Per-particle state and forces for the image particle field: a damped spring
//! toward each particle's origin plus a pointer repulsion, and the formation
//! presets that re-parameterize the spring.

pub mod constants;
pub mod draw;
pub mod forces;
pub mod formation;
pub mod particle;

pub use constants::*;
pub use draw::*;
pub use forces::*;
pub use formation::*;
pub use particle::*;
