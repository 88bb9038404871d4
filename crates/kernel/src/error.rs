#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("grid extent must be non-zero on both axes (got {width}x{height})")]
    EmptyExtent { width: u32, height: u32 },
    #[error("dispatch needs at least one workgroup per axis (got {x}x{y})")]
    EmptyDispatch { x: u32, y: u32 },
    #[error("dispatch of {workgroups} workgroups overflows the {axis} axis")]
    ExtentOverflow { axis: char, workgroups: u32 },
    #[error("surface dimensions must be non-zero (got {width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error("surface {width}x{height} needs {expected} texels, got {actual}")]
    TexelCountMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("invalid pattern parameters: {0}")]
    InvalidParams(String),
}
