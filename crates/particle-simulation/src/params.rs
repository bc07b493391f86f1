//! Field parameters for runtime tuning

use particle_physics::{DEFAULT_EASE, DEFAULT_FRICTION, DEFAULT_GAP, INFLUENCE_RADIUS_SQUARED};

/// Construction-time parameters of a [`crate::ParticleField`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldParams {
    /// Sampling stride in pixels and default particle size
    pub gap: u32,
    /// Initial spring stiffness toward the origin
    pub ease: f32,
    /// Per-tick velocity damping
    pub friction: f32,
    /// Squared pointer influence radius
    pub influence_radius_squared: f32,
    /// Fixed RNG seed, or `None` to seed from the OS
    pub seed: Option<u64>,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            gap: DEFAULT_GAP,
            ease: DEFAULT_EASE,
            friction: DEFAULT_FRICTION,
            influence_radius_squared: INFLUENCE_RADIUS_SQUARED,
            seed: None,
        }
    }
}

impl FieldParams {
    pub fn with_gap(mut self, gap: u32) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_ease(mut self, ease: f32) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Set the influence radius in pixels (stored squared)
    pub fn with_influence_radius(mut self, radius: f32) -> Self {
        self.influence_radius_squared = radius * radius;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
