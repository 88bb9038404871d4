use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use pattern_kernel::{
    execute, shade, Dispatch, InvocationId, PatternParams, Rgba, Strategy, Surface,
};
use patternconfig::{PatternConfig, PowerSetting};
use renderer::{
    export_surface, render_still, ClockSettings, ExportFormat, GpuPowerPreference, Renderer,
    RendererConfig, StillConfig,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::{Overrides, SampleArgs, StillArgs};
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides.
pub fn resolve_config(paths: &AppPaths, overrides: &Overrides) -> Result<RendererConfig> {
    let path = paths.config_file();
    let mut config = if paths.is_explicit() {
        PatternConfig::load(&path)
    } else {
        PatternConfig::load_or_default(&path)
    }
    .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::debug!(path = %path.display(), "resolved configuration file");

    if let Some((x, y)) = overrides.workgroups {
        config.dispatch.workgroups = [x, y];
    }
    if let Some((w, h)) = overrides.surface {
        config.dispatch.surface = Some([w, h]);
    }
    if let Some(speed) = overrides.speed {
        config.pattern.speed = speed;
    }
    if let Some(band_width) = overrides.band_width {
        config.pattern.band_width = band_width;
    }
    if let Some(time_scale) = overrides.time_scale {
        config.clock.time_scale = time_scale;
    }
    config.validate().context("invalid configuration")?;

    renderer_config(&config)
}

fn renderer_config(config: &PatternConfig) -> Result<RendererConfig> {
    let [groups_x, groups_y] = config.dispatch.workgroups;
    let dispatch = Dispatch::new(groups_x, groups_y)?;
    let params = PatternParams::new(config.pattern.speed, config.pattern.band_width)?;
    let [surface_w, surface_h] = config.surface_size();
    let [window_w, window_h] = config.window_size();

    Ok(RendererConfig {
        title: config.window.title.clone(),
        window_size: (window_w, window_h),
        surface_size: (surface_w, surface_h),
        dispatch,
        params,
        clock: ClockSettings {
            time_scale: config.clock.time_scale,
            start_offset: config.clock.start_offset.as_secs_f32(),
            fixed_step: config.clock.fixed_step,
        },
        vsync: config.window.vsync,
        power: match config.window.power {
            PowerSetting::Low => GpuPowerPreference::Low,
            PowerSetting::High => GpuPowerPreference::High,
        },
    })
}

pub fn run_window(config: RendererConfig) -> Result<()> {
    tracing::info!(
        workgroups = ?config.dispatch.workgroups(),
        speed = config.params.speed,
        band_width = config.params.band_width,
        "starting preview"
    );
    Renderer::new(config).run()
}

pub fn run_still(config: &RendererConfig, args: &StillArgs) -> Result<()> {
    let format = ExportFormat::from_path(&args.output)?;
    let started = Instant::now();
    let surface = if args.cpu {
        let (width, height) = config.surface_size;
        let mut surface = Surface::new(width, height)?;
        let stats = execute(
            &mut surface,
            &config.dispatch,
            args.time,
            &config.params,
            Strategy::Parallel,
        );
        tracing::debug!(
            stored = stats.stored,
            dropped = stats.dropped,
            "rendered still frame on CPU"
        );
        surface
    } else {
        render_still(&StillConfig::from_renderer(config, args.time))?
    };

    export_surface(&surface, &args.output, format)?;
    tracing::info!(
        time = args.time,
        cpu = args.cpu,
        elapsed_ms = started.elapsed().as_millis(),
        "still frame written"
    );
    println!("{}", args.output.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct SampleReport {
    x: u32,
    y: u32,
    time: f32,
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

pub fn run_sample(config: &RendererConfig, args: &SampleArgs) -> Result<()> {
    let extent = config.dispatch.extent();
    let id = InvocationId::new(args.x, args.y);
    if !extent.contains(id) {
        return Err(anyhow!(
            "pixel ({}, {}) lies outside the {}x{} grid",
            args.x,
            args.y,
            extent.width(),
            extent.height()
        ));
    }

    let color = shade(id, extent, args.time, &config.params);
    if args.json {
        let report = SampleReport {
            x: args.x,
            y: args.y,
            time: args.time,
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", format_sample(color));
    }
    Ok(())
}

fn format_sample(color: Rgba) -> String {
    format!(
        "r={:.6} g={:.6} b={:.6} a={:.6}",
        color.r, color.g, color.b, color.a
    )
}

pub fn run_where(paths: &AppPaths) {
    println!("Configuration:");
    println!("  config dir:  {}", paths.config_dir().display());
    let file = paths.config_file();
    let status = if file.is_file() { "present" } else { "missing" };
    println!("  config file: {} ({status})", file.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config_matches_reference_setup() {
        let config = renderer_config(&PatternConfig::default()).unwrap();
        let reference = RendererConfig::reference();
        assert_eq!(config.dispatch, reference.dispatch);
        assert_eq!(config.surface_size, reference.surface_size);
        assert_eq!(config.window_size, reference.window_size);
        assert_eq!(config.params, reference.params);
        assert_eq!(config.clock, ClockSettings::default());
    }

    #[test]
    fn clock_section_maps_to_settings() {
        let mut pattern = PatternConfig::default();
        pattern.clock.time_scale = 0.5;
        pattern.clock.start_offset = Duration::from_millis(1500);
        pattern.clock.fixed_step = Some(Duration::from_millis(16));
        pattern.window.power = PowerSetting::Low;

        let config = renderer_config(&pattern).unwrap();
        assert_eq!(config.clock.time_scale, 0.5);
        assert_eq!(config.clock.start_offset, 1.5);
        assert_eq!(config.clock.fixed_step, Some(Duration::from_millis(16)));
        assert_eq!(config.power, GpuPowerPreference::Low);
    }

    #[test]
    fn sample_text_uses_six_decimals() {
        assert_eq!(
            format_sample(Rgba::new(0.5, 0.25, 0.0, 1.0)),
            "r=0.500000 g=0.250000 b=0.000000 a=1.000000"
        );
    }
}
