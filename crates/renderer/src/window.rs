use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use tracing::{error, info, warn};

use crate::gpu::GpuState;
use crate::runtime::FrameClock;
use crate::types::RendererConfig;

/// Aggregates the window and the GPU state that draws into it.
struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    clock: FrameClock,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let gpu = GpuState::new(window.clone(), config)?;
        let profile = gpu.adapter_profile();
        if profile.is_software() {
            warn!(
                adapter = %profile.name,
                backend = ?profile.backend,
                "software rasterizer detected; expect a low frame rate"
            );
        }
        Ok(Self {
            window,
            gpu,
            clock: FrameClock::new(&config.clock),
        })
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn restart_clock(&mut self) {
        self.clock.reset();
        info!("pattern clock restarted");
    }

    /// Returns false when the loop should stop.
    fn redraw(&mut self) -> bool {
        match self.clock.tick_after(|| self.gpu.acquire_frame()) {
            Ok((frame, sample)) => {
                self.gpu.render(frame, sample);
                true
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.resize(self.gpu.size());
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; closing preview");
                false
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                true
            }
            Err(other) => {
                warn!(error = ?other, "surface error; retrying next frame");
                true
            }
        }
    }
}

/// Opens the preview window and redraws the pattern continuously until the
/// window is closed or Escape is pressed. `R` restarts the pattern clock.
pub(crate) fn run_window(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialise event loop")?;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(config.window_size.0, config.window_size.1))
        .build(&event_loop)
        .context("failed to create preview window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, config)?;
    info!(
        surface_width = config.surface_size.0,
        surface_height = config.surface_size.1,
        workgroups = ?config.dispatch.workgroups(),
        "preview window ready"
    );
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            elwt.exit();
                        }
                        WindowEvent::KeyboardInput { event, .. }
                            if event.state == ElementState::Pressed =>
                        {
                            match event.logical_key.as_ref() {
                                Key::Named(NamedKey::Escape) => elwt.exit(),
                                Key::Character(key) if key.eq_ignore_ascii_case("r") => {
                                    state.restart_clock();
                                }
                                _ => {}
                            }
                        }
                        WindowEvent::Resized(new_size) => {
                            state.gpu.resize(new_size);
                        }
                        WindowEvent::RedrawRequested => {
                            if !state.redraw() {
                                elwt.exit();
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    state.window().request_redraw();
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
