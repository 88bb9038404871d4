use bytemuck::{Pod, Zeroable};
use pattern_kernel::PatternParams;

/// Mirror of `PatternUniforms` in the compute kernel; one std140 `vec4`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct PatternUniforms {
    pub time: f32,
    pub speed: f32,
    pub band_width: f32,
    pub _pad0: f32,
}

impl PatternUniforms {
    pub fn new(params: &PatternParams) -> Self {
        Self {
            time: 0.0,
            speed: params.speed,
            band_width: params.band_width,
            _pad0: 0.0,
        }
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.time = seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_one_vec4() {
        assert_eq!(std::mem::size_of::<PatternUniforms>(), 16);
        assert_eq!(std::mem::align_of::<PatternUniforms>(), 4);
    }

    #[test]
    fn fields_land_in_declaration_order() {
        let mut uniforms = PatternUniforms::new(&PatternParams::default());
        uniforms.set_time(2.5);
        let words: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniforms));
        assert_eq!(words, &[2.5, 100.0, 1000.0, 0.0]);
    }
}
