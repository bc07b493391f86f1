//! Image-sampled particle field
//!
//! The field owns every particle, the pointer and the activation counter. Each
//! frame the host calls [`ParticleField::advance_to`] with its clock, then
//! [`ParticleField::update`] and [`ParticleField::render`]. Formation commands
//! may arrive at any time between frames.

use crate::error::{FieldError, Result};
use crate::params::FieldParams;
use crate::pixels::PixelBuffer;
use crate::scheduler::{Scheduler, TimerQueue};
use glam::Vec2;
use particle_physics::{DrawSurface, Formation, Particle, ReactivationHandle, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Grid of particles sampled from an image
pub struct ParticleField<S: Scheduler = TimerQueue> {
    width: u32,
    height: u32,
    params: FieldParams,
    particles: Vec<Particle>,
    pointer: Option<Vec2>,
    activation_counter: u32,
    initialized: bool,
    scheduler: S,
    rng: StdRng,
    fired: Vec<(ReactivationHandle, usize)>,
}

impl ParticleField<TimerQueue> {
    /// Field with a virtual-clock [`TimerQueue`]
    pub fn new(width: u32, height: u32, params: FieldParams) -> Result<Self> {
        Self::with_scheduler(width, height, params, TimerQueue::new())
    }
}

impl<S: Scheduler> ParticleField<S> {
    pub fn with_scheduler(width: u32, height: u32, params: FieldParams, scheduler: S) -> Result<Self> {
        if params.gap == 0 {
            return Err(FieldError::InvalidGap);
        }

        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            width,
            height,
            params,
            particles: Vec::new(),
            pointer: None,
            activation_counter: 0,
            initialized: false,
            scheduler,
            rng,
            fired: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn activation_counter(&self) -> u32 {
        self.activation_counter
    }

    /// Reactivations still waiting to fire
    pub fn pending_reactivations(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Sample one particle per opaque grid cell of `pixels`, in raster order.
    ///
    /// Calling `init` again replaces the particle collection: pending
    /// reactivations are cancelled and the activation counter is reset. Returns
    /// the number of particles created.
    pub fn init(&mut self, pixels: &PixelBuffer) -> Result<usize> {
        if pixels.width() != self.width || pixels.height() != self.height {
            return Err(FieldError::PixelBufferSize {
                width: self.width,
                height: self.height,
                actual_width: pixels.width(),
                actual_height: pixels.height(),
            });
        }

        if self.initialized {
            log::debug!("Re-initializing field, dropping {} particles", self.particles.len());
            self.cancel_all();
            self.particles.clear();
            self.activation_counter = 0;
        }

        let gap = self.params.gap;
        let size = gap as f32;
        for y in (0..self.height).step_by(gap as usize) {
            for x in (0..self.width).step_by(gap as usize) {
                let Some([r, g, b, a]) = pixels.pixel(x, y) else {
                    continue;
                };
                if a == 0 {
                    continue;
                }

                let start = Vec2::new(random_below(&mut self.rng, self.width as f32), 0.0);
                self.particles.push(Particle::new(
                    Vec2::new(x as f32, y as f32),
                    Rgb::new(r, g, b),
                    start,
                    size,
                    self.params.ease,
                    self.params.friction,
                ));
            }
        }

        self.initialized = true;
        log::info!(
            "✓ Sampled {} particles from {}x{} pixels (gap {})",
            self.particles.len(),
            self.width,
            self.height,
            gap
        );
        Ok(self.particles.len())
    }

    /// Record the pointer position. Last write wins.
    ///
    /// Unlike the other field operations this is accepted before `init`: it
    /// only records host input, and the cursor may move before the image is
    /// sampled.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Some(Vec2::new(x, y));
    }

    /// Forget the pointer; no repulsion applies until the next `set_pointer`.
    /// Accepted before `init`, like [`ParticleField::set_pointer`].
    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    /// Fire every reactivation due at or before `now`. Returns how many
    /// particles were released.
    pub fn advance_to(&mut self, now: Duration) -> Result<usize> {
        self.ensure_initialized()?;

        self.fired.clear();
        self.scheduler.fire_due(now, &mut self.fired);

        let mut released = 0;
        for &(handle, index) in &self.fired {
            if let Some(particle) = self.particles.get_mut(index) {
                if particle.reactivate(handle) {
                    released += 1;
                }
            }
        }
        if released > 0 {
            log::trace!("Released {} particles at {:?}", released, now);
        }
        Ok(released)
    }

    /// Advance every particle one tick, in insertion order
    pub fn update(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        let radius_squared = self.params.influence_radius_squared;
        for particle in &mut self.particles {
            particle.update(self.pointer, radius_squared);
        }
        Ok(())
    }

    /// Draw every particle, in insertion order. Does not mutate the field.
    pub fn render(&self, surface: &mut impl DrawSurface) -> Result<()> {
        self.ensure_initialized()?;

        for particle in &self.particles {
            particle.draw(surface);
        }
        Ok(())
    }

    /// Apply a formation by value, for hosts that map triggers to [`Formation`]
    pub fn apply(&mut self, formation: Formation) -> Result<()> {
        match formation {
            Formation::Warp => self.warp(),
            Formation::Blocks => self.blocks(),
            Formation::Assemble => self.assemble(),
            Formation::Print => self.particle_print(),
        }
    }

    /// Bring the clock up to `now`, then apply `formation`.
    ///
    /// Cascade delays are measured from the scheduler's clock, so a host that
    /// receives a trigger between frames passes the trigger time here rather
    /// than letting the delays start from the previous frame.
    pub fn apply_at(&mut self, now: Duration, formation: Formation) -> Result<()> {
        self.advance_to(now)?;
        self.apply(formation)
    }

    /// Scatter every particle over the whole field with a looser spring
    pub fn warp(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        let (width, height, gap) = self.bounds();
        for particle in &mut self.particles {
            let position = Vec2::new(
                random_below(&mut self.rng, width),
                random_below(&mut self.rng, height),
            );
            particle.warp(position, gap);
        }
        log::debug!("Formation: {}", Formation::Warp);
        Ok(())
    }

    /// Enlarge particles and drop about half of them onto the bottom edge
    pub fn blocks(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        let (width, height, gap) = self.bounds();
        for particle in &mut self.particles {
            let x = random_below(&mut self.rng, width);
            let y = if self.rng.random_bool(particle_physics::BLOCK_FLOOR_CHANCE) {
                height
            } else {
                random_below(&mut self.rng, height)
            };
            particle.blocks(Vec2::new(x, y), gap);
        }
        log::debug!("Formation: {}", Formation::Blocks);
        Ok(())
    }

    /// Scatter and freeze every particle, releasing them in a cascade of
    /// `counter * 0.5` ms
    pub fn assemble(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        let (width, height, _) = self.bounds();
        self.cascade(Formation::Assemble, |rng| {
            Vec2::new(random_below(rng, width), random_below(rng, height))
        });
        Ok(())
    }

    /// Gather every particle at the bottom center, releasing them in a cascade
    /// of `counter` ms
    pub fn particle_print(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        let head = Vec2::new(self.width as f32 * 0.5, self.height as f32);
        self.cascade(Formation::Print, |_| head);
        Ok(())
    }

    fn cascade(&mut self, formation: Formation, start: impl Fn(&mut StdRng) -> Vec2) {
        let stagger = formation.stagger_ms().unwrap_or_default();
        let gap = self.params.gap as f32;

        self.activation_counter = 0;
        for (index, particle) in self.particles.iter_mut().enumerate() {
            let position = start(&mut self.rng);
            let stale = match formation {
                Formation::Print => particle.print(position, gap),
                _ => particle.assemble(position, gap),
            };
            if let Some(stale) = stale {
                self.scheduler.cancel(stale);
            }

            self.activation_counter += 1;
            let delay_us = f64::from(self.activation_counter) * f64::from(stagger) * 1000.0;
            let delay = Duration::from_micros(delay_us.round() as u64);
            let handle = self.scheduler.schedule(delay, index);
            particle.arm_reactivation(handle);
        }

        log::debug!(
            "Formation: {} ({} staggered releases)",
            formation,
            self.activation_counter
        );
    }

    fn cancel_all(&mut self) {
        for particle in &mut self.particles {
            if let Some(handle) = particle.take_reactivation() {
                self.scheduler.cancel(handle);
            }
        }
    }

    fn bounds(&self) -> (f32, f32, f32) {
        (self.width as f32, self.height as f32, self.params.gap as f32)
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(FieldError::NotInitialized)
        }
    }
}

/// Uniform sample in `[0, max)`, or 0 for an empty range
fn random_below(rng: &mut StdRng, max: f32) -> f32 {
    if max > 0.0 {
        rng.random_range(0.0..max)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_rgba(width, height, vec![255; (width * height * 4) as usize]).unwrap()
    }

    fn seeded(width: u32, height: u32, gap: u32) -> ParticleField {
        ParticleField::new(width, height, FieldParams::default().with_gap(gap).with_seed(7)).unwrap()
    }

    #[test]
    fn test_rejects_zero_gap() {
        assert!(matches!(
            ParticleField::new(4, 4, FieldParams::default().with_gap(0)),
            Err(FieldError::InvalidGap)
        ));
    }

    #[test]
    fn test_operations_require_init() {
        let mut field = seeded(4, 4, 2);
        let mut canvas = PixelBuffer::new(4, 4);

        assert!(matches!(field.update(), Err(FieldError::NotInitialized)));
        assert!(matches!(field.render(&mut canvas), Err(FieldError::NotInitialized)));
        assert!(matches!(field.warp(), Err(FieldError::NotInitialized)));
        assert!(matches!(field.blocks(), Err(FieldError::NotInitialized)));
        assert!(matches!(field.assemble(), Err(FieldError::NotInitialized)));
        assert!(matches!(field.particle_print(), Err(FieldError::NotInitialized)));
        assert!(matches!(
            field.advance_to(Duration::ZERO),
            Err(FieldError::NotInitialized)
        ));
        assert!(matches!(
            field.apply_at(Duration::ZERO, Formation::Print),
            Err(FieldError::NotInitialized)
        ));
    }

    #[test]
    fn test_init_rejects_mismatched_buffer() {
        let mut field = seeded(4, 4, 2);
        assert!(matches!(
            field.init(&opaque(3, 4)),
            Err(FieldError::PixelBufferSize { actual_width: 3, .. })
        ));
        assert!(!field.is_initialized());
    }

    #[test]
    fn test_initial_positions_on_top_edge() {
        let mut field = seeded(16, 16, 4);
        field.init(&opaque(16, 16)).unwrap();
        for particle in field.particles() {
            assert_eq!(particle.position.y, 0.0);
            assert!((0.0..16.0).contains(&particle.position.x));
            assert!(particle.is_active());
        }
    }

    #[test]
    fn test_reinit_replaces_particles() {
        let mut field = seeded(4, 4, 2);
        field.init(&opaque(4, 4)).unwrap();
        field.assemble().unwrap();
        assert_eq!(field.pending_reactivations(), 4);

        assert_eq!(field.init(&opaque(4, 4)).unwrap(), 4);
        assert_eq!(field.len(), 4);
        assert_eq!(field.pending_reactivations(), 0);
        assert_eq!(field.activation_counter(), 0);
        assert!(field.particles().iter().all(Particle::is_active));
    }

    #[test]
    fn test_blocks_positions() {
        let mut field = seeded(20, 20, 2);
        field.init(&opaque(20, 20)).unwrap();
        field.blocks().unwrap();

        let mut floor = 0;
        for particle in field.particles() {
            assert_eq!(particle.size, particle_physics::BLOCK_SIZE);
            assert_eq!(particle.ease, 0.04);
            assert!((0.0..20.0).contains(&particle.position.x));
            if particle.position.y == 20.0 {
                floor += 1;
            } else {
                assert!((0.0..20.0).contains(&particle.position.y));
            }
        }
        // 100 particles with a fair coin
        assert!(floor > 10 && floor < 90);
    }

    #[test]
    fn test_print_starts_at_bottom_center() {
        let mut field = seeded(10, 6, 2);
        field.init(&opaque(10, 6)).unwrap();
        field.particle_print().unwrap();

        for particle in field.particles() {
            assert_eq!(particle.position, Vec2::new(5.0, 6.0));
            assert!(!particle.is_active());
        }
        assert_eq!(field.activation_counter() as usize, field.len());
    }

    #[test]
    fn test_pointer_absent_until_set() {
        // Pointer input is accepted before init
        let mut field = seeded(4, 4, 2);
        assert!(!field.is_initialized());
        assert_eq!(field.pointer(), None);
        field.set_pointer(0.0, 0.0);
        assert_eq!(field.pointer(), Some(Vec2::ZERO));
        field.clear_pointer();
        assert_eq!(field.pointer(), None);
    }
}
