use std::time::{Duration, Instant};

use anyhow::Result;
use pattern_kernel::Dispatch;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;

use crate::runtime::TimeSample;
use crate::types::{AdapterProfile, RendererConfig};

use super::context::{GpuContext, SurfaceState};
use super::pipeline::{PatternPipeline, PresentPipeline};

/// Everything the preview window needs to draw one frame.
pub(crate) struct GpuState {
    context: GpuContext,
    surface: SurfaceState,
    pattern: PatternPipeline,
    present: PresentPipeline,
    dispatch: Dispatch,
    frames_since_last_update: u32,
    last_fps_update: Instant,
    frames_per_second: f32,
}

impl GpuState {
    pub(crate) fn new<T>(target: T, config: &RendererConfig) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let window_size = PhysicalSize::new(config.window_size.0, config.window_size.1);
        let (context, surface) =
            GpuContext::for_window(target, window_size, config.power, config.vsync)?;
        context.ensure_capacity(config.surface_size, &config.dispatch)?;

        let pattern = PatternPipeline::new(&context.device, config.surface_size, &config.params);
        let present = PresentPipeline::new(&context.device, surface.format(), pattern.view());
        if !config
            .dispatch
            .fits_exactly(config.surface_size.0, config.surface_size.1)
        {
            let extent = config.dispatch.extent();
            debug!(
                grid_width = extent.width(),
                grid_height = extent.height(),
                surface_width = config.surface_size.0,
                surface_height = config.surface_size.1,
                "workgroup grid does not match the output texture"
            );
        }

        Ok(Self {
            context,
            surface,
            pattern,
            present,
            dispatch: config.dispatch,
            frames_since_last_update: 0,
            last_fps_update: Instant::now(),
            frames_per_second: 60.0,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.surface.size
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface.resize(&self.context.device, new_size);
    }

    /// Grabs the next swapchain texture; warns when that stalls past the frame budget.
    pub(crate) fn acquire_frame(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        let acquisition_start = Instant::now();
        let frame = self.surface.surface.get_current_texture()?;
        let acquisition = acquisition_start.elapsed();
        let frame_budget = Duration::from_secs_f32(1.0 / self.frames_per_second.max(1.0));
        if acquisition > frame_budget {
            warn!(
                acquisition_ms = acquisition.as_millis(),
                budget_ms = frame_budget.as_millis(),
                "acquiring frame took longer than the frame budget"
            );
        }
        Ok(frame)
    }

    /// Dispatches the kernel for `sample` and presents `frame`.
    pub(crate) fn render(&mut self, frame: wgpu::SurfaceTexture, sample: TimeSample) {
        self.pattern
            .write_uniforms(&self.context.queue, sample.seconds);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });
        self.pattern.encode(&mut encoder, &self.dispatch);
        self.present.encode(&mut encoder, &view);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        self.record_frame(sample);
    }

    fn record_frame(&mut self, sample: TimeSample) {
        let now = Instant::now();
        self.frames_since_last_update += 1;
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame = sample.frame_index,
                time = self.pattern.time(),
                "render stats"
            );
        }
    }
}
