//! Software RGBA canvas
//!
//! The field samples particles from a `PixelBuffer` the size of the viewport,
//! into which the source image has been drawn at a fixed offset. The same
//! buffer implements [`DrawSurface`], so it doubles as a headless render target.

use crate::error::{FieldError, Result};
use image::RgbaImage;
use particle_physics::{DrawSurface, Rgb};

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Row-major RGBA8 pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap raw RGBA8 data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(FieldError::PixelDataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Transparent `width`x`height` buffer with `image` drawn at (`x`, `y`)
    pub fn with_image(width: u32, height: u32, image: &RgbaImage, x: i32, y: i32) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.draw_image(image, x, y);
        buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// RGBA at (`x`, `y`), `None` outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Composite `image` over the buffer with its top-left corner at (`x`, `y`).
    ///
    /// Parts falling outside the buffer are clipped.
    pub fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32) {
        for (ix, iy, src) in image.enumerate_pixels() {
            let (Some(dx), Some(dy)) = (
                x.checked_add_unsigned(ix).and_then(|v| u32::try_from(v).ok()),
                y.checked_add_unsigned(iy).and_then(|v| u32::try_from(v).ok()),
            ) else {
                continue;
            };
            if dx >= self.width || dy >= self.height {
                continue;
            }
            let i = self.offset(dx, dy);
            let dst = [
                self.data[i],
                self.data[i + 1],
                self.data[i + 2],
                self.data[i + 3],
            ];
            self.data[i..i + 4].copy_from_slice(&source_over(src.0, dst));
        }
    }

    /// Copy into an `image` buffer, e.g. for saving to disk
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Clamp a float rectangle to whole pixel spans inside the buffer
    fn pixel_span(&self, x: f32, y: f32, width: f32, height: f32) -> Option<(u32, u32, u32, u32)> {
        let x0 = x.round().max(0.0);
        let y0 = y.round().max(0.0);
        let x1 = (x + width).round().min(self.width as f32);
        let y1 = (y + height).round().min(self.height as f32);

        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn fill_span(&mut self, x: f32, y: f32, width: f32, height: f32, rgba: [u8; 4]) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(x, y, width, height) else {
            return;
        };
        for py in y0..y1 {
            let start = self.offset(x0, py);
            let end = self.offset(x1, py);
            for px in self.data[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
    }
}

impl DrawSurface for PixelBuffer {
    fn clear(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.fill_span(x, y, width, height, TRANSPARENT);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.fill_span(x, y, width, height, [color.r, color.g, color.b, 255]);
    }
}

/// Porter-Duff "over" in straight (non-premultiplied) alpha
fn source_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    match src[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }

    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (f32::from(src[c]) * sa + f32::from(dst[c]) * da * (1.0 - sa)) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    out
}
