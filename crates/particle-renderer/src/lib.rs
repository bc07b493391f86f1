//! # Particle Renderer
//!
//! wgpu renderer for the particle field: particles are batched as solid quads
//! through the [`particle_physics::DrawSurface`] contract and drawn instanced.

pub mod batch;
pub mod renderer;
pub mod viewport;

pub use batch::*;
pub use renderer::*;
pub use viewport::*;
