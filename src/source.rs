//! Source image loading and field construction

use crate::cli::Cli;
use crate::AppError;
use image::{Rgba, RgbaImage};
use particle_physics::{DrawSurface, Formation};
use particle_simulation::{ParticleField, PixelBuffer};
use std::path::Path;
use std::time::Duration;

/// Duration of one frame at 60 Hz
const FRAME: Duration = Duration::from_micros(16_667);

const PATTERN_SIZE: u32 = 256;

pub fn load_image(path: &Path) -> Result<RgbaImage, AppError> {
    let image = image::open(path)?.into_rgba8();
    log::info!(
        "✓ Loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Image from the command line, or the built-in pattern
pub fn source_image(cli: &Cli) -> Result<RgbaImage, AppError> {
    match &cli.image {
        Some(path) => load_image(path),
        None => {
            log::info!("No image given, using built-in pattern");
            Ok(test_pattern())
        }
    }
}

/// Color-wheel ring with transparent surroundings and center
pub fn test_pattern() -> RgbaImage {
    let center = PATTERN_SIZE as f32 * 0.5;
    let outer = center - 8.0;
    let inner = outer * 0.35;

    RgbaImage::from_fn(PATTERN_SIZE, PATTERN_SIZE, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let r = (dx * dx + dy * dy).sqrt();
        if r > outer || r < inner {
            return Rgba([0, 0, 0, 0]);
        }

        let hue = dy.atan2(dx) / std::f32::consts::TAU + 0.5;
        let channel = |offset: f32| {
            let phase = (hue + offset) * std::f32::consts::TAU;
            ((phase.cos() * 0.5 + 0.5) * 255.0) as u8
        };
        Rgba([channel(0.0), channel(1.0 / 3.0), channel(2.0 / 3.0), 255])
    })
}

/// Top-left offset that centers `image` in a `width`x`height` viewport
pub fn centered_offset(image: &RgbaImage, width: u32, height: u32) -> (i32, i32) {
    let x = (i64::from(width) - i64::from(image.width())) / 2;
    let y = (i64::from(height) - i64::from(image.height())) / 2;
    (x as i32, y as i32)
}

/// Field covering the viewport, sampled from `image` drawn at its center
pub fn build_field(cli: &Cli, image: &RgbaImage, width: u32, height: u32) -> Result<ParticleField, AppError> {
    let (x, y) = centered_offset(image, width, height);
    let pixels = PixelBuffer::with_image(width, height, image, x, y);

    let mut field = ParticleField::new(width, height, cli.field_params())?;
    field.init(&pixels)?;
    Ok(field)
}

/// Simulate `frames` frames on a software canvas and return the last one
pub fn render_headless(
    field: &mut ParticleField,
    frames: u32,
    formation: Option<Formation>,
) -> Result<PixelBuffer, AppError> {
    let (width, height) = (field.width(), field.height());
    let mut canvas = PixelBuffer::new(width, height);

    if let Some(formation) = formation {
        field.apply(formation)?;
    }

    let mut now = Duration::ZERO;
    for _ in 0..frames {
        now += FRAME;
        field.advance_to(now)?;
        field.update()?;
    }

    canvas.clear(0.0, 0.0, width as f32, height as f32);
    field.render(&mut canvas)?;
    Ok(canvas)
}

/// Headless entry point for `--snapshot`
pub fn run_snapshot(cli: &Cli, path: &Path) -> Result<(), AppError> {
    let image = source_image(cli)?;
    let mut field = build_field(cli, &image, cli.width, cli.height)?;
    let canvas = render_headless(&mut field, cli.frames, cli.formation.map(Formation::from))?;

    let frame = canvas.to_image().ok_or(AppError::Snapshot)?;
    frame.save(path)?;
    log::info!("✓ Saved frame {} to {}", cli.frames, path.display());
    Ok(())
}
