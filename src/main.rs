//! Interactive image particle field
//!
//! Samples an image into colored particles that settle onto the picture, flee
//! the cursor, and regroup into alternate formations on W / B / A / P.

mod cli;
mod source;

use clap::Parser;
use cli::Cli;
use particle_physics::Formation;
use particle_renderer::{ParticleRenderer, QuadBatch, Viewport};
use particle_simulation::{FieldError, ParticleField};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Frames averaged for the FPS readout
const FRAME_TIME_WINDOW: usize = 100;

/// Errors surfaced by the binary
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("particle field error: {0}")]
    Field(#[from] FieldError),

    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create GPU surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter found: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("snapshot canvas has no pixels")]
    Snapshot,
}

/// Keyboard trigger for a formation command
fn formation_for_key(key: KeyCode) -> Option<Formation> {
    match key {
        KeyCode::KeyW => Some(Formation::Warp),
        KeyCode::KeyB => Some(Formation::Blocks),
        KeyCode::KeyA => Some(Formation::Assemble),
        KeyCode::KeyP => Some(Formation::Print),
        _ => None,
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    field: ParticleField,
    renderer: ParticleRenderer,
    batch: QuadBatch,
    viewport: Viewport,

    started: Instant,
    frame_times: VecDeque<f32>,
    last_frame_time: Instant,
}

impl GpuState {
    async fn new(window: Arc<Window>, cli: &Cli) -> Result<Self, AppError> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        // Create device and queue
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(AppError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // The field is sized to the viewport once, at startup
        let image = source::source_image(cli)?;
        let field = source::build_field(cli, &image, size.width, size.height)?;
        log::info!("✓ Field initialized ({} particles)", field.len());

        let renderer = ParticleRenderer::new(&device, &config);
        log::info!("✓ Renderer initialized");

        let batch = QuadBatch::with_capacity(field.len());
        let viewport = Viewport::new(field.width(), field.height());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            field,
            renderer,
            batch,
            viewport,
            started: Instant::now(),
            frame_times: VecDeque::with_capacity(FRAME_TIME_WINDOW),
            last_frame_time: Instant::now(),
        })
    }

    /// Reconfigure the surface. The field keeps its startup size and is scaled
    /// to the new window.
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Map window pixels to field pixels
    fn set_pointer(&mut self, x: f64, y: f64) {
        let sx = self.viewport.width / self.config.width as f32;
        let sy = self.viewport.height / self.config.height as f32;
        self.field.set_pointer(x as f32 * sx, y as f32 * sy);
    }

    /// Apply a formation at the moment the key arrived, not the last frame
    fn trigger(&mut self, formation: Formation) {
        if let Err(e) = self.field.apply_at(self.started.elapsed(), formation) {
            log::error!("Formation {} failed: {}", formation, e);
        } else {
            log::info!("Formation: {}", formation);
        }
    }

    /// Advance the simulation one frame and record its quads
    fn step(&mut self) -> Result<(), FieldError> {
        self.field.advance_to(self.started.elapsed())?;
        self.field.update()?;

        self.batch.reset();
        self.field.render(&mut self.batch)
    }

    fn render(&mut self) -> Result<(f32, f32), wgpu::SurfaceError> {
        // Track frame time
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;

        if self.frame_times.len() >= FRAME_TIME_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        let fps = if avg_frame_time > 0.0 {
            1000.0 / avg_frame_time
        } else {
            0.0
        };

        if let Err(e) = self.step() {
            log::error!("Simulation step failed: {}", e);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &self.viewport,
            &self.batch,
        );

        output.present();
        Ok((fps, avg_frame_time))
    }
}

struct App {
    cli: Cli,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Particles")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("{}", AppError::from(e));
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GpuState::new(window.clone(), &self.cli)) {
            Ok(gpu_state) => {
                self.window = Some(window);
                self.gpu_state = Some(gpu_state);
            }
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let (Some(formation), Some(gpu_state)) =
                    (formation_for_key(key_code), &mut self.gpu_state)
                {
                    gpu_state.trigger(formation);
                }
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.set_pointer(position.x, position.y);
                }
            }

            WindowEvent::CursorLeft { .. } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.field.clear_pointer();
                }
            }

            WindowEvent::RedrawRequested => {
                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    match gpu_state.render() {
                        Ok((fps, frame_time)) => {
                            window.set_title(&format!(
                                "Particles - {:.0} FPS ({:.2}ms) - {} particles",
                                fps,
                                frame_time,
                                gpu_state.field.len()
                            ));
                        }
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            gpu_state.resize(window.inner_size())
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => log::warn!("Render error: {:?}", e),
                    }
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    if let Some(path) = cli.snapshot.clone() {
        return source::run_snapshot(&cli, &path);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        cli,
        window: None,
        gpu_state: None,
    };

    event_loop.run_app(&mut app)?;
    Ok(())
}

fn main() {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("Starting image particle field...");

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_keys() {
        assert_eq!(formation_for_key(KeyCode::KeyW), Some(Formation::Warp));
        assert_eq!(formation_for_key(KeyCode::KeyB), Some(Formation::Blocks));
        assert_eq!(formation_for_key(KeyCode::KeyA), Some(Formation::Assemble));
        assert_eq!(formation_for_key(KeyCode::KeyP), Some(Formation::Print));
        assert_eq!(formation_for_key(KeyCode::KeyQ), None);
    }
}
