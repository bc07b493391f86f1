//! # Particle Simulation
//!
//! Image-sampled particle field: sampling, per-frame update and render, and the
//! formation commands with their staggered, cancellable reactivations.

pub mod error;
pub mod field;
pub mod params;
pub mod pixels;
pub mod scheduler;

pub use error::*;
pub use field::*;
pub use params::*;
pub use pixels::*;
pub use scheduler::*;
