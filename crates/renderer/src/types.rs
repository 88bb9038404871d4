use pattern_kernel::{Dispatch, PatternParams};

use crate::runtime::ClockSettings;

/// Adapter preference forwarded to `wgpu::RequestAdapterOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

impl GpuPowerPreference {
    pub(crate) fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Summary of the adapter the renderer ended up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension_2d: u32,
    pub max_workgroups_per_dimension: u32,
}

impl AdapterProfile {
    pub(crate) fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
            max_workgroups_per_dimension: limits.max_compute_workgroups_per_dimension,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// The output texture keeps `surface_size` for the whole session; the window
/// only stretches it, so resizing never changes what the kernel computes.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window title.
    pub title: String,
    /// Initial window size in physical pixels.
    pub window_size: (u32, u32),
    /// Size of the `Rgba32Float` texture the kernel writes into.
    pub surface_size: (u32, u32),
    /// Workgroup counts issued every frame.
    pub dispatch: Dispatch,
    /// Scroll speed and band width.
    pub params: PatternParams,
    /// How the per-frame time value advances.
    pub clock: ClockSettings,
    /// Prefer tear-free presentation.
    pub vsync: bool,
    pub power: GpuPowerPreference,
}

impl RendererConfig {
    /// Reference setup: a 1000×1000 texture covered by 100×100 workgroups.
    pub fn reference() -> Self {
        Self {
            title: "scrollband".to_string(),
            window_size: (1000, 1000),
            surface_size: (1000, 1000),
            dispatch: Dispatch::REFERENCE,
            params: PatternParams::default(),
            clock: ClockSettings::default(),
            vsync: true,
            power: GpuPowerPreference::default(),
        }
    }
}
