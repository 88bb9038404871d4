use std::sync::mpsc;

use anyhow::{Context, Result};
use pattern_kernel::{Rgba, Surface};

const BYTES_PER_TEXEL: u32 = std::mem::size_of::<Rgba>() as u32;

/// Row pitch for texture-to-buffer copies, rounded up to the copy alignment.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * BYTES_PER_TEXEL).div_ceil(align) * align
}

/// Copies an `Rgba32Float` texture back to host memory.
///
/// Blocks until the GPU has finished every previously submitted command.
pub(crate) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    size: (u32, u32),
) -> Result<Surface> {
    let (width, height) = size;
    let padded = padded_bytes_per_row(width);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("field readback"),
        size: u64::from(padded) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait)
        .context("failed to wait for GPU readback")?;
    rx.recv()
        .context("readback callback was dropped")?
        .context("failed to map readback buffer")?;

    let texels = {
        let data = slice.get_mapped_range();
        unpad_rows(&data, width, height, padded)
    };
    buffer.unmap();

    Surface::from_texels(width, height, texels).context("readback produced a malformed surface")
}

fn unpad_rows(data: &[u8], width: u32, height: u32, padded: u32) -> Vec<Rgba> {
    let row_bytes = (width * BYTES_PER_TEXEL) as usize;
    let mut texels = Vec::with_capacity(width as usize * height as usize);
    for row in data.chunks(padded as usize).take(height as usize) {
        // Mapped ranges carry no alignment guarantee for `f32`.
        texels.extend(bytemuck::pod_collect_to_vec::<u8, Rgba>(&row[..row_bytes]));
    }
    texels
}
