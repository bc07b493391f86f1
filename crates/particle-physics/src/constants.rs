//! Tuning constants for the particle field
//!
//! Distances are in pixels, time in milliseconds, and all per-tick quantities
//! assume one tick per displayed frame.

/// Sampling stride in pixels, also the default square size of a particle
pub const DEFAULT_GAP: u32 = 4;

/// Spring stiffness toward the origin before any formation command
pub const DEFAULT_EASE: f32 = 0.01;

/// Velocity damping applied every tick
pub const DEFAULT_FRICTION: f32 = 0.95;

/// Squared pointer influence radius (~55px)
pub const INFLUENCE_RADIUS_SQUARED: f32 = 3000.0;

/// Lower bound for the squared pointer distance, keeps the repulsion finite at r→0
pub const MIN_DISTANCE_SQUARED: f32 = 1.0;

/// Square size used by the "blocks" formation
pub const BLOCK_SIZE: f32 = 10.0;

/// Probability that a "blocks" particle is pinned to the bottom edge
pub const BLOCK_FLOOR_CHANCE: f64 = 0.5;
