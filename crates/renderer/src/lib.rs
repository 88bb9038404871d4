//! GPU renderer for the scrolling-band pattern.
//!
//! The compute kernel writes one `Rgba32Float` texel per invocation into a
//! storage texture; the preview window then stretches that texture over the
//! swapchain. The overall flow is:
//!
//! ```text
//!   CLI / scrollband
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ FrameClock::tick()
//!                                                │ time uniform
//!                                                ▼
//!                              compute pass ──▶ present pass ──▶ swapchain
//! ```
//!
//! Headless callers use [`render_still`] instead, which performs a single
//! dispatch and reads the texture back into a [`pattern_kernel::Surface`] that
//! [`export_surface`] can write to disk.

mod compile;
mod export;
mod gpu;
mod runtime;
mod still;
mod types;
mod window;

use anyhow::Result;

pub use compile::{PATTERN_WGSL, PRESENT_WGSL};
pub use export::{export_surface, ExportFormat};
pub use runtime::{
    time_source_for, BoxedTimeSource, ClockSettings, FixedStepTimeSource, FrameClock,
    SystemTimeSource, TimeSample, TimeSource,
};
pub use still::{render_still, StillConfig};
pub use types::{AdapterProfile, GpuPowerPreference, RendererConfig};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the preview window and blocks until it is closed.
    pub fn run(&mut self) -> Result<()> {
        window::run_window(&self.config)
    }
}
