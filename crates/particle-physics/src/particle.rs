//! Image particle state and per-tick integration

use crate::draw::DrawSurface;
use crate::forces::pointer_repulsion;
use crate::formation::Formation;
use glam::Vec2;
use std::fmt;

/// Opaque RGB color sampled from the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalized sRGB components
    pub fn to_f32(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

/// Formats as a CSS color, e.g. `rgb(255,128,0)`
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Handle of a scheduled reactivation, issued by the field's scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactivationHandle(pub u64);

/// One sampled grid cell of the source image
#[derive(Debug, Clone)]
pub struct Particle {
    /// Current position (top-left corner of the square)
    pub position: Vec2,
    pub velocity: Vec2,
    /// Home coordinate, fixed at creation
    origin: Vec2,
    color: Rgb,
    /// Rendered square side length
    pub size: f32,
    /// Spring stiffness toward `origin`
    pub ease: f32,
    friction: f32,
    active: bool,
    pending_reactivation: Option<ReactivationHandle>,
}

impl Particle {
    pub fn new(origin: Vec2, color: Rgb, position: Vec2, size: f32, ease: f32, friction: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            origin,
            color,
            size,
            ease,
            friction,
            active: true,
            pending_reactivation: None,
        }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pending_reactivation(&self) -> Option<ReactivationHandle> {
        self.pending_reactivation
    }

    /// Advance one tick. Frozen particles are left untouched.
    pub fn update(&mut self, pointer: Option<Vec2>, influence_radius_squared: f32) {
        if !self.active {
            return;
        }

        if let Some(pointer) = pointer {
            self.velocity += pointer_repulsion(self.position, pointer, influence_radius_squared);
        }

        self.velocity *= self.friction;
        self.position += self.velocity + (self.origin - self.position) * self.ease;
    }

    pub fn draw(&self, surface: &mut impl DrawSurface) {
        surface.fill_rect(
            self.position.x,
            self.position.y,
            self.size,
            self.size,
            self.color,
        );
    }

    /// Scatter to `position` with the warp spring. Activity is unchanged.
    pub fn warp(&mut self, position: Vec2, gap: f32) {
        self.reshape(Formation::Warp, position, gap);
    }

    /// Move to `position` with the enlarged block size. Activity is unchanged.
    pub fn blocks(&mut self, position: Vec2, gap: f32) {
        self.reshape(Formation::Blocks, position, gap);
    }

    /// Freeze at `position` ahead of a staggered release.
    ///
    /// Returns the previously pending reactivation, which the caller must cancel.
    pub fn assemble(&mut self, position: Vec2, gap: f32) -> Option<ReactivationHandle> {
        self.freeze(Formation::Assemble, position, gap)
    }

    /// Freeze at the print head `position` ahead of a staggered release.
    ///
    /// Returns the previously pending reactivation, which the caller must cancel.
    pub fn print(&mut self, position: Vec2, gap: f32) -> Option<ReactivationHandle> {
        self.freeze(Formation::Print, position, gap)
    }

    /// Record the reactivation that will release this particle.
    ///
    /// Returns a handle that was still pending, if any.
    pub fn arm_reactivation(&mut self, handle: ReactivationHandle) -> Option<ReactivationHandle> {
        self.pending_reactivation.replace(handle)
    }

    /// Release the particle if `handle` is its current pending reactivation.
    ///
    /// Stale handles are ignored and return `false`.
    pub fn reactivate(&mut self, handle: ReactivationHandle) -> bool {
        if self.pending_reactivation != Some(handle) {
            return false;
        }
        self.pending_reactivation = None;
        self.active = true;
        true
    }

    /// Drop the pending reactivation without releasing, returning it for cancellation.
    pub fn take_reactivation(&mut self) -> Option<ReactivationHandle> {
        self.pending_reactivation.take()
    }

    fn reshape(&mut self, formation: Formation, position: Vec2, gap: f32) {
        self.position = position;
        self.ease = formation.ease();
        self.size = formation.size(gap);
    }

    fn freeze(&mut self, formation: Formation, position: Vec2, gap: f32) -> Option<ReactivationHandle> {
        let stale = self.pending_reactivation.take();
        self.reshape(formation, position, gap);
        self.active = false;
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_EASE, DEFAULT_FRICTION, INFLUENCE_RADIUS_SQUARED};

    fn particle_at(origin: Vec2, position: Vec2) -> Particle {
        Particle::new(origin, Rgb::new(10, 20, 30), position, 4.0, DEFAULT_EASE, DEFAULT_FRICTION)
    }

    #[derive(Default)]
    struct Rects(Vec<(f32, f32, f32, f32, Rgb)>);

    impl DrawSurface for Rects {
        fn clear(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {
            self.0.clear();
        }

        fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
            self.0.push((x, y, width, height, color));
        }
    }

    #[test]
    fn test_rgb_css_format() {
        assert_eq!(Rgb::new(255, 128, 0).to_string(), "rgb(255,128,0)");
    }

    #[test]
    fn test_spring_step() {
        let mut p = particle_at(Vec2::new(100.0, 100.0), Vec2::new(0.0, 0.0));
        p.update(None, INFLUENCE_RADIUS_SQUARED);
        assert!((p.position.x - 1.0).abs() < 1e-5);
        assert!((p.position.y - 1.0).abs() < 1e-5);
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_frozen_particle_does_not_move() {
        let mut p = particle_at(Vec2::new(50.0, 50.0), Vec2::ZERO);
        assert_eq!(p.assemble(Vec2::new(7.0, 9.0), 4.0), None);
        p.velocity = Vec2::new(3.0, 3.0);

        p.update(Some(Vec2::new(8.0, 9.0)), INFLUENCE_RADIUS_SQUARED);

        assert_eq!(p.position, Vec2::new(7.0, 9.0));
        assert_eq!(p.velocity, Vec2::new(3.0, 3.0));
        assert!(!p.is_active());
    }

    #[test]
    fn test_pointer_pushes_particle_away() {
        let mut p = particle_at(Vec2::new(20.0, 20.0), Vec2::new(20.0, 20.0));
        p.update(Some(Vec2::new(25.0, 20.0)), INFLUENCE_RADIUS_SQUARED);
        assert!(p.velocity.x < 0.0);
        assert!(p.position.x < 20.0);
    }

    #[test]
    fn test_formations_reparameterize() {
        let mut p = particle_at(Vec2::ZERO, Vec2::ZERO);

        p.warp(Vec2::new(3.0, 4.0), 4.0);
        assert_eq!(p.ease, 0.1);
        assert_eq!(p.size, 4.0);
        assert!(p.is_active());

        p.blocks(Vec2::new(1.0, 2.0), 4.0);
        assert_eq!(p.ease, 0.04);
        assert_eq!(p.size, 10.0);
        assert!(p.is_active());

        p.print(Vec2::new(5.0, 6.0), 4.0);
        assert_eq!(p.ease, 0.2);
        assert_eq!(p.size, 4.0);
        assert_eq!(p.position, Vec2::new(5.0, 6.0));
        assert!(!p.is_active());
    }

    #[test]
    fn test_stale_reactivation_is_ignored() {
        let mut p = particle_at(Vec2::ZERO, Vec2::ZERO);
        p.assemble(Vec2::ZERO, 4.0);
        assert_eq!(p.arm_reactivation(ReactivationHandle(1)), None);

        let stale = p.assemble(Vec2::ZERO, 4.0);
        assert_eq!(stale, Some(ReactivationHandle(1)));
        p.arm_reactivation(ReactivationHandle(2));

        assert!(!p.reactivate(ReactivationHandle(1)));
        assert!(!p.is_active());
        assert!(p.reactivate(ReactivationHandle(2)));
        assert!(p.is_active());
        assert_eq!(p.pending_reactivation(), None);
    }

    #[test]
    fn test_draw_fills_square() {
        let p = particle_at(Vec2::ZERO, Vec2::new(2.0, 3.0));
        let mut rects = Rects::default();
        p.draw(&mut rects);
        assert_eq!(rects.0, vec![(2.0, 3.0, 4.0, 4.0, Rgb::new(10, 20, 30))]);
    }
}
