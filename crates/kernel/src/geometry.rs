use crate::error::KernelError;

/// Number of invocations per workgroup along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

/// Workgroup size baked into the pattern kernel (`@workgroup_size(10, 10, 1)`).
pub const WORKGROUP_SIZE: WorkgroupSize = WorkgroupSize { x: 10, y: 10, z: 1 };

/// Global invocation coordinate; one per output pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvocationId {
    pub x: u32,
    pub y: u32,
}

impl InvocationId {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Total coordinate domain covered by a dispatch.
///
/// Both axes are guaranteed non-zero, which is what lets the kernel divide by
/// them unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridExtent {
    width: u32,
    height: u32,
}

impl GridExtent {
    pub fn new(width: u32, height: u32) -> Result<Self, KernelError> {
        if width == 0 || height == 0 {
            return Err(KernelError::EmptyExtent { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, id: InvocationId) -> bool {
        id.x < self.width && id.y < self.height
    }
}

/// Workgroup counts chosen by the caller for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dispatch {
    workgroups_x: u32,
    workgroups_y: u32,
}

impl Dispatch {
    /// 100×100 workgroups, covering a 1000×1000 surface exactly.
    pub const REFERENCE: Dispatch = Dispatch {
        workgroups_x: 100,
        workgroups_y: 100,
    };

    /// Builds a dispatch, rejecting empty counts and grids whose extent does
    /// not fit in `u32`.
    pub fn new(workgroups_x: u32, workgroups_y: u32) -> Result<Self, KernelError> {
        if workgroups_x == 0 || workgroups_y == 0 {
            return Err(KernelError::EmptyDispatch {
                x: workgroups_x,
                y: workgroups_y,
            });
        }
        if workgroups_x.checked_mul(WORKGROUP_SIZE.x).is_none() {
            return Err(KernelError::ExtentOverflow {
                axis: 'x',
                workgroups: workgroups_x,
            });
        }
        if workgroups_y.checked_mul(WORKGROUP_SIZE.y).is_none() {
            return Err(KernelError::ExtentOverflow {
                axis: 'y',
                workgroups: workgroups_y,
            });
        }
        Ok(Self {
            workgroups_x,
            workgroups_y,
        })
    }

    /// Smallest dispatch whose grid covers a `width`×`height` surface.
    ///
    /// The grid only matches the surface exactly when both dimensions are
    /// multiples of the workgroup size; otherwise the overrun widens the
    /// gradient denominators.
    pub fn covering(width: u32, height: u32) -> Result<Self, KernelError> {
        if width == 0 || height == 0 {
            return Err(KernelError::EmptySurface { width, height });
        }
        Self::new(
            width.div_ceil(WORKGROUP_SIZE.x),
            height.div_ceil(WORKGROUP_SIZE.y),
        )
    }

    pub fn workgroups(&self) -> (u32, u32) {
        (self.workgroups_x, self.workgroups_y)
    }

    pub fn extent(&self) -> GridExtent {
        GridExtent {
            width: self.workgroups_x * WORKGROUP_SIZE.x,
            height: self.workgroups_y * WORKGROUP_SIZE.y,
        }
    }

    pub fn invocation_count(&self) -> u64 {
        let extent = self.extent();
        u64::from(extent.width) * u64::from(extent.height)
    }

    /// True when the grid matches the surface size exactly.
    pub fn fits_exactly(&self, width: u32, height: u32) -> bool {
        let extent = self.extent();
        extent.width == width && extent.height == height
    }
}
