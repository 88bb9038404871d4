use bytemuck::{Pod, Zeroable};

use crate::error::KernelError;
use crate::geometry::{GridExtent, InvocationId};

/// Horizontal scroll rate in texel units per unit of time.
pub const DEFAULT_SPEED: f32 = 100.0;
/// Distance after which the band pattern wraps.
pub const DEFAULT_BAND_WIDTH: f32 = 1000.0;

/// One `Rgba32Float` texel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Quantises to 8 bits per channel, clamping to `[0, 1]`.
    pub fn to_unorm8(self) -> [u8; 4] {
        self.to_array()
            .map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Bitwise comparison; distinguishes `0.0` from `-0.0` and matches NaNs.
    pub fn bit_eq(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }
}

/// Tunables of the scrolling band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternParams {
    pub speed: f32,
    pub band_width: f32,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            band_width: DEFAULT_BAND_WIDTH,
        }
    }
}

impl PatternParams {
    pub fn new(speed: f32, band_width: f32) -> Result<Self, KernelError> {
        let params = Self { speed, band_width };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if !self.speed.is_finite() {
            return Err(KernelError::InvalidParams(format!(
                "speed must be finite (got {})",
                self.speed
            )));
        }
        if !self.band_width.is_finite() || self.band_width <= 0.0 {
            return Err(KernelError::InvalidParams(format!(
                "band_width must be a positive finite number (got {})",
                self.band_width
            )));
        }
        Ok(())
    }

    /// Time after which the band returns to the same position.
    pub fn period(&self) -> Option<f32> {
        if self.speed == 0.0 {
            None
        } else {
            Some(self.band_width / self.speed.abs())
        }
    }
}

/// Raw band position of column `x` at time `t`, wrapped into `[0, band_width)`.
///
/// Floored modulo, so negative times wrap the same way positive ones do. The
/// remainder itself is exact; only the shift of a negative remainder can round,
/// and a result that lands on `band_width` is folded to zero. A position that
/// overflows to infinity maps to zero.
pub fn band_offset(x: u32, t: f32, params: &PatternParams) -> f32 {
    let band = params.band_width;
    let raw = x as f32 + t * params.speed;
    if !raw.is_finite() {
        return 0.0;
    }
    let mut wrapped = raw % band;
    if wrapped < 0.0 {
        wrapped += band;
    }
    if wrapped >= band || wrapped == 0.0 {
        // also normalises -0.0
        return 0.0;
    }
    wrapped
}

/// The pattern kernel: color of invocation `id` in a grid of `extent` at time `t`.
///
/// Red scrolls horizontally with `t`, green is a static top-to-bottom ramp,
/// blue is zero, and alpha is opaque. Both ramps are normalised by the grid
/// extent, not by the size of whatever surface the result lands in.
pub fn shade(id: InvocationId, extent: GridExtent, t: f32, params: &PatternParams) -> Rgba {
    let r = band_offset(id.x, t, params) / extent.width() as f32;
    let g = id.y as f32 / extent.height() as f32;
    Rgba::new(r, g, 0.0, 1.0)
}
