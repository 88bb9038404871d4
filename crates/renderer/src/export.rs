use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use image::{DynamicImage, ImageFormat, Rgba32FImage, RgbaImage};
use pattern_kernel::Surface;

/// Image container written by [`export_surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// 8 bits per channel; values are clamped to `[0, 1]` before quantising.
    Png,
    /// Full 32-bit float channels.
    Exr,
}

impl ExportFormat {
    /// Picks the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("png") => Ok(Self::Png),
            Some("exr") => Ok(Self::Exr),
            Some(other) => bail!("unsupported export extension '.{other}' (expected .png or .exr)"),
            None => bail!(
                "cannot infer export format for {} (expected .png or .exr)",
                path.display()
            ),
        }
    }
}

/// Writes `surface` to `path`; row 0 of the surface is the top of the image.
pub fn export_surface(surface: &Surface, path: &Path, format: ExportFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let (width, height) = (surface.width(), surface.height());
    let image = match format {
        ExportFormat::Png => {
            let bytes: Vec<u8> = surface
                .texels()
                .iter()
                .flat_map(|texel| texel.to_unorm8())
                .collect();
            let buffer = RgbaImage::from_raw(width, height, bytes)
                .ok_or_else(|| anyhow!("surface does not fill a {width}x{height} image"))?;
            DynamicImage::ImageRgba8(buffer)
        }
        ExportFormat::Exr => {
            let buffer = Rgba32FImage::from_raw(width, height, surface.as_f32_slice().to_vec())
                .ok_or_else(|| anyhow!("surface does not fill a {width}x{height} image"))?;
            DynamicImage::ImageRgba32F(buffer)
        }
    };

    let image_format = match format {
        ExportFormat::Png => ImageFormat::Png,
        ExportFormat::Exr => ImageFormat::OpenExr,
    };
    image
        .save_with_format(path, image_format)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), ?format, width, height, "exported frame");
    Ok(())
}
