//! Scrolling-band pattern kernel.
//!
//! The crate holds the only per-pixel logic in the workspace: a pure function
//! from an invocation coordinate, the dispatch grid extent, and a time scalar to
//! one RGBA color. Everything else in here exists to drive that function:
//!
//! ```text
//!   Dispatch (workgroups × 10×10×1) ──▶ GridExtent
//!          │                                │
//!          ▼                                ▼
//!   execute() ── for each InvocationId ──▶ shade() ──▶ Surface texel
//! ```
//!
//! - `geometry` describes workgroups, dispatch counts, and the grid extent.
//! - `pattern` contains the kernel itself plus its tunable parameters.
//! - `surface` is the host-side mirror of an `Rgba32Float` texture.
//! - `execute` runs a dispatch on the CPU, serially or via `rayon`.
//!
//! The GPU renderer runs the same formula as WGSL; the CPU path is the
//! reference it is checked against.

mod error;
mod execute;
mod geometry;
mod pattern;
mod surface;

pub use error::KernelError;
pub use execute::{execute, ExecutionStats, Strategy};
pub use geometry::{Dispatch, GridExtent, InvocationId, WorkgroupSize, WORKGROUP_SIZE};
pub use pattern::{
    band_offset, shade, PatternParams, Rgba, DEFAULT_BAND_WIDTH, DEFAULT_SPEED,
};
pub use surface::Surface;
