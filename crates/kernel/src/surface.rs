use crate::error::KernelError;
use crate::pattern::Rgba;

/// Host-side `Rgba32Float` image, row-major with the origin at the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    texels: Vec<Rgba>,
}

impl Surface {
    /// Allocates a surface with every texel set to transparent black.
    pub fn new(width: u32, height: u32) -> Result<Self, KernelError> {
        if width == 0 || height == 0 {
            return Err(KernelError::EmptySurface { width, height });
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            texels: vec![Rgba::TRANSPARENT; len],
        })
    }

    /// Wraps texels read back from a texture. `texels` must hold exactly
    /// `width * height` entries.
    pub fn from_texels(width: u32, height: u32, texels: Vec<Rgba>) -> Result<Self, KernelError> {
        if width == 0 || height == 0 {
            return Err(KernelError::EmptySurface { width, height });
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(KernelError::TexelCountMismatch {
                width,
                height,
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.texels.get(self.index(x, y)).copied()
    }

    pub fn texels(&self) -> &[Rgba] {
        &self.texels
    }

    pub(crate) fn texels_mut(&mut self) -> &mut [Rgba] {
        &mut self.texels
    }

    /// Raw little-endian `f32` bytes, four channels per texel.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Flattened `f32` channels, four per texel.
    pub fn as_f32_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.texels)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
