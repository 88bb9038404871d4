use std::borrow::Cow;

/// Compiles the scrolling-band compute kernel.
pub(crate) fn compile_pattern_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("pattern kernel"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(PATTERN_WGSL)),
    })
}

/// Compiles the full-screen blit used to present the pattern texture.
pub(crate) fn compile_present_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("present blit"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(PRESENT_WGSL)),
    })
}

pub(crate) const PATTERN_ENTRY_POINT: &str = "main";
pub(crate) const PRESENT_VERTEX_ENTRY_POINT: &str = "vs_main";
pub(crate) const PRESENT_FRAGMENT_ENTRY_POINT: &str = "fs_main";

/// Compute kernel writing one texel per invocation.
///
/// The uniform block layout must match `PatternUniforms` in `gpu/uniforms.rs`,
/// and the workgroup size must match `pattern_kernel::WORKGROUP_SIZE`.
///
/// WGSL's float `%` is not an exact remainder, so `wrap_band` reduces by
/// repeated subtraction of `band * 2^k`. Each subtraction has `d <= r < 2d` and
/// is therefore exact, which makes the result agree with
/// `pattern_kernel::band_offset` for every finite position.
pub const PATTERN_WGSL: &str = r"struct PatternUniforms {
    time: f32,
    speed: f32,
    band_width: f32,
    pad0: f32,
};

@group(0) @binding(0) var field_out: texture_storage_2d<rgba32float, write>;
@group(0) @binding(1) var<uniform> params: PatternUniforms;

fn wrap_band(raw: f32, band: f32) -> f32 {
    // Infinite or NaN positions have no meaningful remainder.
    if ((bitcast<u32>(raw) & 0x7f800000u) == 0x7f800000u) {
        return 0.0;
    }
    var r = abs(raw);
    var d = band;
    loop {
        if (d > r * 0.5) {
            break;
        }
        d = d * 2.0;
    }
    loop {
        if (d < band) {
            break;
        }
        if (r >= d) {
            r = r - d;
        }
        d = d * 0.5;
    }
    if (raw < 0.0 && r > 0.0) {
        r = band - r;
    }
    if (r >= band) {
        r = 0.0;
    }
    return r;
}

@compute @workgroup_size(10, 10, 1)
fn main(
    @builtin(global_invocation_id) global_id: vec3<u32>,
    @builtin(num_workgroups) num_workgroups: vec3<u32>,
) {
    // Grids larger than the texture drop their overrun; the gradients still
    // normalise by the full grid extent.
    let dims = textureDimensions(field_out);
    if (global_id.x >= dims.x || global_id.y >= dims.y) {
        return;
    }

    let extent = vec2<f32>(num_workgroups.xy * vec2<u32>(10u, 10u));
    let raw = f32(global_id.x) + params.time * params.speed;
    let wrapped = wrap_band(raw, params.band_width);

    let color = vec4<f32>(wrapped / extent.x, f32(global_id.y) / extent.y, 0.0, 1.0);
    textureStore(field_out, vec2<i32>(global_id.xy), color);
}
";

/// Full-screen triangle that stretches the pattern texture over the window.
///
/// `rgba32float` is not filterable on every adapter, so texels are fetched
/// with `textureLoad` instead of a sampler.
pub const PRESENT_WGSL: &str = r"@group(0) @binding(0) var field_tex: texture_2d<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -3.0),
        vec2<f32>(3.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let pos = positions[vertex_index];
    var result: VertexOutput;
    result.position = vec4<f32>(pos, 0.0, 1.0);
    // Texture row 0 lands at the top of the window.
    result.uv = vec2<f32>(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    return result;
}

@fragment
fn fs_main(vertex: VertexOutput) -> @location(0) vec4<f32> {
    let dims = textureDimensions(field_tex);
    let scaled = vec2<u32>(max(vertex.uv, vec2<f32>(0.0)) * vec2<f32>(dims));
    let texel = min(scaled, dims - vec2<u32>(1u));
    return textureLoad(field_tex, texel, 0);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_kernel::WORKGROUP_SIZE;

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source).expect("parse wgsl");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .expect("validate wgsl");
        module
    }

    #[test]
    fn pattern_kernel_validates_with_expected_workgroup_size() {
        let module = validate(PATTERN_WGSL);
        let entry = module
            .entry_points
            .iter()
            .find(|entry| entry.name == PATTERN_ENTRY_POINT)
            .expect("compute entry point");
        assert_eq!(entry.stage, naga::ShaderStage::Compute);
        assert_eq!(
            entry.workgroup_size,
            [WORKGROUP_SIZE.x, WORKGROUP_SIZE.y, WORKGROUP_SIZE.z]
        );
    }

    #[test]
    fn present_shader_validates() {
        let module = validate(PRESENT_WGSL);
        let stages: Vec<_> = module
            .entry_points
            .iter()
            .map(|entry| (entry.name.as_str(), entry.stage))
            .collect();
        assert!(stages.contains(&(PRESENT_VERTEX_ENTRY_POINT, naga::ShaderStage::Vertex)));
        assert!(stages.contains(&(PRESENT_FRAGMENT_ENTRY_POINT, naga::ShaderStage::Fragment)));
    }

    #[test]
    fn kernel_wraps_without_float_remainder() {
        assert!(PATTERN_WGSL.contains("fn wrap_band(raw: f32, band: f32) -> f32"));
        assert!(PATTERN_WGSL.contains("wrap_band(raw, params.band_width)"));
        assert!(!PATTERN_WGSL.contains('%'));
    }

    /// Line-for-line transcription of `wrap_band` from the WGSL source.
    fn wrap_band(raw: f32, band: f32) -> f32 {
        if raw.to_bits() & 0x7f80_0000 == 0x7f80_0000 {
            return 0.0;
        }
        let mut r = raw.abs();
        let mut d = band;
        while d <= r * 0.5 {
            d *= 2.0;
        }
        while d >= band {
            if r >= d {
                r -= d;
            }
            d *= 0.5;
        }
        if raw < 0.0 && r > 0.0 {
            r = band - r;
        }
        if r >= band {
            r = 0.0;
        }
        r
    }

    #[test]
    fn shader_wrap_agrees_with_cpu_band_offset() {
        let params = pattern_kernel::PatternParams::default();
        let mut times = vec![
            0.0_f32,
            0.25,
            -1.0,
            9.0,
            -1234.5,
            9.006_806e13,
            -8.680_572_5e10,
            -9.093_933e16,
            1.0e37,
            f32::MAX,
            f32::MIN,
        ];
        for exponent in 3..=17 {
            let magnitude = 10.0_f32.powi(exponent) * 1.37;
            times.push(magnitude);
            times.push(-magnitude);
        }
        for &t in &times {
            for &x in &[0_u32, 330, 500, 640, 999, 1000, 4900] {
                let raw = x as f32 + t * params.speed;
                let gpu = wrap_band(raw, params.band_width);
                let cpu = pattern_kernel::band_offset(x, t, &params);
                assert_eq!(gpu.to_bits(), cpu.to_bits(), "x={x} t={t}: {gpu} vs {cpu}");
            }
        }
    }
}
