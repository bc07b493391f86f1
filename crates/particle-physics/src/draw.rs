//! Drawing surface contract shared by the simulation and the renderers

use crate::particle::Rgb;

/// Minimal 2D surface particles are drawn onto.
///
/// Coordinates are in field pixels with the origin at the top-left corner.
pub trait DrawSurface {
    /// Clear a rectangular region to transparent.
    fn clear(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Fill an axis-aligned rectangle with a solid color.
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb);
}
