use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use pattern_kernel::Dispatch;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::types::{AdapterProfile, GpuPowerPreference};

/// Format written by the kernel and read back for export.
pub(crate) const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_profile: AdapterProfile,
}

/// Swapchain state for the preview window.
pub(crate) struct SurfaceState {
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
}

impl GpuContext {
    /// Device without a presentation surface, used for still renders.
    pub(crate) fn headless(power: GpuPowerPreference) -> Result<Self> {
        let instance = create_instance();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: power.to_wgpu(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;
        Self::from_adapter(instance, &adapter)
    }

    pub(crate) fn for_window<T>(
        target: T,
        initial_size: PhysicalSize<u32>,
        power: GpuPowerPreference,
        vsync: bool,
    ) -> Result<(Self, SurfaceState)>
    where
        T: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let instance = create_instance();
        let surface = instance
            .create_surface(target)
            .context("failed to create rendering surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: power.to_wgpu(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let surface_caps = surface.get_capabilities(&adapter);
        if surface_caps.formats.is_empty() {
            bail!("surface is not compatible with the selected adapter");
        }
        // The field holds linear data; present it without an sRGB encode.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                let fallback = surface_caps.formats[0];
                tracing::warn!(?fallback, "no non-sRGB surface format available");
                fallback
            });
        let present_mode = select_present_mode(&surface_caps.present_modes, vsync);
        tracing::debug!(?surface_format, ?present_mode, vsync, "configuring surface");

        let context = Self::from_adapter(instance, &adapter)?;
        let size = PhysicalSize::new(initial_size.width.max(1), initial_size.height.max(1));
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &config);

        Ok((
            context,
            SurfaceState {
                surface,
                config,
                size,
            },
        ))
    }

    fn from_adapter(instance: wgpu::Instance, adapter: &wgpu::Adapter) -> Result<Self> {
        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        let adapter_profile = AdapterProfile::from_wgpu(&adapter_info, &limits);
        tracing::info!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            is_software = adapter_profile.is_software(),
            "selected GPU adapter"
        );

        let field_usages = adapter.get_texture_format_features(FIELD_FORMAT).allowed_usages;
        if !field_usages.contains(wgpu::TextureUsages::STORAGE_BINDING) {
            bail!("adapter cannot bind {FIELD_FORMAT:?} as a storage texture");
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("scrollband device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        Ok(Self {
            _instance: instance,
            device,
            queue,
            adapter_profile,
        })
    }

    /// Checks that the output texture and the workgroup grid fit the device.
    pub(crate) fn ensure_capacity(&self, surface_size: (u32, u32), dispatch: &Dispatch) -> Result<()> {
        check_capacity(&self.adapter_profile, surface_size, dispatch)
    }
}

impl SurfaceState {
    pub(crate) fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(device, &self.config);
    }

    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        flags: wgpu::InstanceFlags::default(),
        memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        backend_options: wgpu::BackendOptions::default(),
    })
}

fn select_present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    let preferred: &[wgpu::PresentMode] = if vsync {
        &[wgpu::PresentMode::Fifo]
    } else {
        &[wgpu::PresentMode::Immediate, wgpu::PresentMode::Mailbox]
    };
    preferred
        .iter()
        .copied()
        .find(|mode| available.contains(mode))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

fn check_capacity(
    profile: &AdapterProfile,
    surface_size: (u32, u32),
    dispatch: &Dispatch,
) -> Result<()> {
    let max_dimension = profile.max_texture_dimension_2d;
    let (width, height) = surface_size;
    if width > max_dimension || height > max_dimension {
        return Err(anyhow!(
            "GPU max texture dimension is {max_dimension}, requested surface is {width}x{height}"
        ));
    }

    let max_groups = profile.max_workgroups_per_dimension;
    let (groups_x, groups_y) = dispatch.workgroups();
    if groups_x > max_groups || groups_y > max_groups {
        return Err(anyhow!(
            "GPU allows at most {max_groups} workgroups per dimension, requested {groups_x}x{groups_y}"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(max_texture: u32, max_groups: u32) -> AdapterProfile {
        AdapterProfile {
            name: "test".into(),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::Other,
            max_texture_dimension_2d: max_texture,
            max_workgroups_per_dimension: max_groups,
        }
    }

    #[test]
    fn vsync_prefers_fifo() {
        let modes = [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Fifo];
        assert_eq!(select_present_mode(&modes, true), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn no_vsync_prefers_immediate_then_mailbox() {
        let all = [
            wgpu::PresentMode::Fifo,
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Immediate,
        ];
        assert_eq!(select_present_mode(&all, false), wgpu::PresentMode::Immediate);
        let no_immediate = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox];
        assert_eq!(
            select_present_mode(&no_immediate, false),
            wgpu::PresentMode::Mailbox
        );
        assert_eq!(
            select_present_mode(&[wgpu::PresentMode::Fifo], false),
            wgpu::PresentMode::Fifo
        );
    }

    #[test]
    fn capacity_accepts_reference_grid() {
        let dispatch = Dispatch::new(100, 100).unwrap();
        assert!(check_capacity(&profile(8192, 65535), (1000, 1000), &dispatch).is_ok());
    }

    #[test]
    fn capacity_rejects_oversized_texture() {
        let dispatch = Dispatch::new(1, 1).unwrap();
        let err = check_capacity(&profile(2048, 65535), (4096, 10), &dispatch).unwrap_err();
        assert!(err.to_string().contains("max texture dimension"));
    }

    #[test]
    fn capacity_rejects_too_many_workgroups() {
        let dispatch = Dispatch::new(70000, 1).unwrap();
        let err = check_capacity(&profile(8192, 65535), (100, 100), &dispatch).unwrap_err();
        assert!(err.to_string().contains("workgroups per dimension"));
    }
}
