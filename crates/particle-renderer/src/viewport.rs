//! Pixel-space orthographic projection

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Viewport uniform for GPU
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ViewportUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Maps field pixels (origin top-left, y down) to clip space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn build_projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.width.max(1.0), self.height.max(1.0), 0.0, -1.0, 1.0)
    }

    pub fn to_uniform(&self) -> ViewportUniform {
        ViewportUniform {
            view_proj: self.build_projection_matrix().to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_corners_map_to_clip_space() {
        let proj = Viewport::new(800, 600).build_projection_matrix();

        let top_left = proj.project_point3(Vec3::new(0.0, 0.0, 0.0));
        assert!((top_left.x + 1.0).abs() < 1e-6);
        assert!((top_left.y - 1.0).abs() < 1e-6);

        let bottom_right = proj.project_point3(Vec3::new(800.0, 600.0, 0.0));
        assert!((bottom_right.x - 1.0).abs() < 1e-6);
        assert!((bottom_right.y + 1.0).abs() < 1e-6);
    }
}
