use std::time::Instant;

use anyhow::{Context, Result};
use pattern_kernel::{Dispatch, PatternParams, Surface};

use crate::gpu::{read_texture, GpuContext, PatternPipeline};
use crate::types::{GpuPowerPreference, RendererConfig};

/// Inputs for a single headless frame.
#[derive(Debug, Clone, Copy)]
pub struct StillConfig {
    pub surface_size: (u32, u32),
    pub dispatch: Dispatch,
    pub params: PatternParams,
    /// Time value handed to the kernel.
    pub time: f32,
    pub power: GpuPowerPreference,
}

impl StillConfig {
    pub fn from_renderer(config: &RendererConfig, time: f32) -> Self {
        Self {
            surface_size: config.surface_size,
            dispatch: config.dispatch,
            params: config.params,
            time,
            power: config.power,
        }
    }
}

/// Runs one GPU dispatch without a window and reads the texture back.
///
/// Texels outside the workgroup grid keep the zero-initialised value.
pub fn render_still(config: &StillConfig) -> Result<Surface> {
    let context = GpuContext::headless(config.power)?;
    context.ensure_capacity(config.surface_size, &config.dispatch)?;

    let started = Instant::now();
    let mut pipeline = PatternPipeline::new(&context.device, config.surface_size, &config.params);
    pipeline.write_uniforms(&context.queue, config.time);

    let mut encoder = context
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("still encoder"),
        });
    pipeline.encode(&mut encoder, &config.dispatch);
    context.queue.submit(std::iter::once(encoder.finish()));

    let surface = read_texture(
        &context.device,
        &context.queue,
        pipeline.texture(),
        pipeline.size(),
    )
    .context("failed to read back still frame")?;
    tracing::debug!(
        width = surface.width(),
        height = surface.height(),
        time = config.time,
        elapsed_ms = started.elapsed().as_millis(),
        "rendered still frame on GPU"
    );
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_kernel::{execute, Strategy};

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn gpu_matches_cpu_executor() {
        let config = StillConfig {
            surface_size: (40, 30),
            dispatch: Dispatch::new(4, 3).unwrap(),
            params: PatternParams::default(),
            time: 0.25,
            power: GpuPowerPreference::Low,
        };
        let gpu = render_still(&config).expect("render still frame");

        let mut cpu = Surface::new(40, 30).unwrap();
        execute(&mut cpu, &config.dispatch, config.time, &config.params, Strategy::Serial);
        for (gpu_texel, cpu_texel) in gpu.texels().iter().zip(cpu.texels()) {
            for (g, c) in gpu_texel.to_array().iter().zip(cpu_texel.to_array()) {
                assert!((g - c).abs() < 1e-5, "gpu {gpu_texel:?} vs cpu {cpu_texel:?}");
            }
        }
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn partial_coverage_leaves_uncovered_texels_zero() {
        let config = StillConfig {
            surface_size: (25, 15),
            dispatch: Dispatch::new(2, 1).unwrap(),
            params: PatternParams::default(),
            time: 0.0,
            power: GpuPowerPreference::Low,
        };
        let surface = render_still(&config).expect("render still frame");

        let covered = surface.get(19, 9).unwrap();
        assert!((covered.r - 19.0 / 20.0).abs() < 1e-5);
        assert!((covered.g - 9.0 / 10.0).abs() < 1e-5);
        assert_eq!(covered.a, 1.0);
        assert_eq!(surface.get(20, 0).unwrap().a, 0.0);
        assert_eq!(surface.get(0, 10).unwrap().a, 0.0);
    }
}
