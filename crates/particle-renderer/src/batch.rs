//! CPU-side quad batch filled by `ParticleField::render`

use particle_physics::{DrawSurface, Rgb};

/// Instance data for one solid quad
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadInstance {
    /// Top-left corner in pixels
    pub position: [f32; 2],
    /// Width and height in pixels
    pub size: [f32; 2],
    /// Linear RGBA
    pub color: [f32; 4],
}

impl QuadInstance {
    /// Vertex buffer layout for instance attributes
    pub const fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: &[wgpu::VertexAttribute] = &[
            // position: vec2<f32> at location 0
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // size: vec2<f32> at location 1
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color: vec4<f32> at location 2
            wgpu::VertexAttribute {
                offset: (std::mem::size_of::<[f32; 2]>() * 2) as wgpu::BufferAddress,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: ATTRIBUTES,
        }
    }
}

/// Quads recorded for the next frame.
///
/// `clear` drops every quad lying entirely inside the cleared region; use
/// [`QuadBatch::reset`] to start a fresh frame.
#[derive(Debug, Default, Clone)]
pub struct QuadBatch {
    instances: Vec<QuadInstance>,
}

impl QuadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
        }
    }

    /// Drop every recorded quad, including ones outside the viewport
    pub fn reset(&mut self) {
        self.instances.clear();
    }

    pub fn instances(&self) -> &[QuadInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl DrawSurface for QuadBatch {
    /// Drops quads lying entirely inside the region. Quads are not split, so
    /// one crossing the region's edge is kept whole; the GPU pass clears the
    /// background itself and frames start from [`QuadBatch::reset`].
    fn clear(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.instances.retain(|quad| {
            let [qx, qy] = quad.position;
            let [qw, qh] = quad.size;
            !(qx >= x && qy >= y && qx + qw <= x + width && qy + qh <= y + height)
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        let [r, g, b] = color.to_f32();
        self.instances.push(QuadInstance {
            position: [x, y],
            size: [width, height],
            color: [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), 1.0],
        });
    }
}

/// sRGB transfer function inverse, surfaces are configured with an sRGB format
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_records_linear_color() {
        let mut batch = QuadBatch::new();
        batch.fill_rect(1.0, 2.0, 4.0, 4.0, Rgb::new(255, 0, 0));

        assert_eq!(batch.len(), 1);
        let quad = batch.instances()[0];
        assert_eq!(quad.position, [1.0, 2.0]);
        assert_eq!(quad.size, [4.0, 4.0]);
        assert!((quad.color[0] - 1.0).abs() < 1e-6);
        assert_eq!(&quad.color[1..], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_clear_viewport_empties_batch() {
        let mut batch = QuadBatch::new();
        batch.fill_rect(0.0, 0.0, 4.0, 4.0, Rgb::new(1, 2, 3));
        batch.fill_rect(90.0, 90.0, 4.0, 4.0, Rgb::new(1, 2, 3));

        batch.clear(0.0, 0.0, 50.0, 50.0);
        assert_eq!(batch.len(), 1);

        batch.clear(0.0, 0.0, 100.0, 100.0);
        assert!(batch.is_empty());

        batch.fill_rect(-20.0, 500.0, 4.0, 4.0, Rgb::new(1, 2, 3));
        batch.clear(0.0, 0.0, 100.0, 100.0);
        assert_eq!(batch.len(), 1);
        batch.reset();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_clear_keeps_quads_crossing_the_edge() {
        let mut batch = QuadBatch::new();
        batch.fill_rect(48.0, 10.0, 4.0, 4.0, Rgb::new(1, 2, 3));
        batch.fill_rect(10.0, 10.0, 4.0, 4.0, Rgb::new(4, 5, 6));

        batch.clear(0.0, 0.0, 50.0, 50.0);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.instances()[0].position, [48.0, 10.0]);
    }

    #[test]
    fn test_srgb_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_to_linear(0.5) < 0.5);
    }
}
