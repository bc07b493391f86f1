//! Pointer repulsion

use crate::constants::MIN_DISTANCE_SQUARED;
use glam::Vec2;

/// Velocity impulse pushing a particle at `position` away from `pointer`.
///
/// `force = -R² / d²` inside the influence radius and zero outside it. The
/// squared distance is clamped to [`MIN_DISTANCE_SQUARED`] so a pointer sitting
/// exactly on a particle yields a large but finite push.
pub fn pointer_repulsion(position: Vec2, pointer: Vec2, influence_radius_squared: f32) -> Vec2 {
    let delta = pointer - position;
    let distance = delta.length_squared().max(MIN_DISTANCE_SQUARED);

    if distance >= influence_radius_squared {
        return Vec2::ZERO;
    }

    let force = -influence_radius_squared / distance;
    let angle = delta.y.atan2(delta.x);
    Vec2::new(force * angle.cos(), force * angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INFLUENCE_RADIUS_SQUARED;

    #[test]
    fn test_no_force_outside_radius() {
        let radius = INFLUENCE_RADIUS_SQUARED.sqrt();
        let impulse = pointer_repulsion(Vec2::ZERO, Vec2::new(radius + 1.0, 0.0), INFLUENCE_RADIUS_SQUARED);
        assert_eq!(impulse, Vec2::ZERO);
    }

    #[test]
    fn test_pushes_away_from_pointer() {
        // Pointer to the right and below: impulse points left and up
        let impulse = pointer_repulsion(Vec2::ZERO, Vec2::new(10.0, 5.0), INFLUENCE_RADIUS_SQUARED);
        assert!(impulse.x < 0.0);
        assert!(impulse.y < 0.0);
    }

    #[test]
    fn test_stronger_when_closer() {
        let near = pointer_repulsion(Vec2::ZERO, Vec2::new(5.0, 0.0), INFLUENCE_RADIUS_SQUARED);
        let far = pointer_repulsion(Vec2::ZERO, Vec2::new(40.0, 0.0), INFLUENCE_RADIUS_SQUARED);
        assert!(near.length() > far.length());
    }

    #[test]
    fn test_coincident_pointer_is_finite() {
        let impulse = pointer_repulsion(Vec2::new(3.0, 3.0), Vec2::new(3.0, 3.0), INFLUENCE_RADIUS_SQUARED);
        assert!(impulse.is_finite());
        assert_eq!(impulse.length(), INFLUENCE_RADIUS_SQUARED / MIN_DISTANCE_SQUARED);
    }
}
