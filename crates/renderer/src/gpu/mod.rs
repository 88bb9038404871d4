//! GPU plumbing for the pattern kernel.
//!
//! - `context` owns the wgpu instance and device, and the swapchain when a
//!   window is attached.
//! - `uniforms` mirrors the kernel's uniform block.
//! - `pipeline` builds the compute pipeline and its `Rgba32Float` target, and
//!   the blit that presents it.
//! - `readback` copies the target back to host memory.
//! - `state` glues the pieces together for the preview window.

mod context;
mod pipeline;
mod readback;
mod state;
mod uniforms;

pub(crate) use context::GpuContext;
pub(crate) use pipeline::PatternPipeline;
pub(crate) use readback::read_texture;
pub(crate) use state::GpuState;
