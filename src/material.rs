//! Surface appearance and the GPU data layouts of the fur shader.
//!
//! [`MaterialParams`] is what callers pick (color, metalness, roughness).
//! [`HairUniforms`] and [`InstanceRaw`] are the byte layouts `shaders/fur.wgsl`
//! reads; both are `#[repr(C)]` + [`bytemuck::Pod`] and packed as whole
//! `vec4`s so they match WGSL alignment without padding fields.

use glam::{Mat4, Vec3};

use crate::bend::BendInputs;
use crate::config::{BendMode, FuzzyConfig};
use crate::generator::HairInstance;

/// Linear RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// From a packed `0xRRGGBB` value.
    ///
    /// ```
    /// use fuzzy_mesh::Color;
    ///
    /// assert_eq!(Color::hex(0xff0000), Color::rgb(1.0, 0.0, 0.0));
    /// ```
    pub fn hex(value: u32) -> Self {
        let channel = |shift: u32| ((value >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// From hue, saturation and lightness, all in `[0, 1]`.
    ///
    /// Hue wraps, so `1.25` is the same as `0.25`.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        if s <= 0.0 {
            return Self::rgb(l, l, l);
        }

        let h = h.rem_euclid(1.0);
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        let hue = |mut t: f32| {
            t = t.rem_euclid(1.0);
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * 6.0 * (2.0 / 3.0 - t)
            } else {
                p
            }
        };

        Self::rgb(hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Surface parameters shared by the hair and the base mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialParams {
    pub color: Color,
    /// 0 is dielectric, 1 is metal.
    pub metalness: f32,
    /// 0 is mirror-smooth, 1 is fully rough.
    pub roughness: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            metalness: 0.5,
            roughness: 0.5,
        }
    }
}

impl MaterialParams {
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }

    pub fn roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }
}

/// Constants derived from a config once and fixed for the mesh's lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HairDefines {
    pub hair_length: f32,
    /// Height of one recursive bend segment.
    pub segment_step: f32,
    /// `1 / hair_length`, turning a height into a height fraction.
    pub force_step: f32,
    pub height_segments: u32,
    pub bend_mode: BendMode,
}

impl HairDefines {
    pub fn new(config: &FuzzyConfig) -> Self {
        Self {
            hair_length: config.hair_length,
            segment_step: config.segment_step(),
            force_step: 1.0 / config.hair_length,
            height_segments: config.hair_height_segments,
            bend_mode: config.bend_mode,
        }
    }
}

/// Per-mesh uniform block (group 1) of the fur shader.
///
/// Used unchanged by the base mesh pipeline, which ignores the bend fields.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HairUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`.
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// `xyz` global force, `w` centrifugal force.
    pub force: [f32; 4],
    /// `xyz` centrifugal direction, `w` settle time.
    pub centrifugal: [f32; 4],
    /// hair length, segment step, force step, height segments.
    pub shape: [f32; 4],
    /// settle scale, bend mode index, metalness, roughness.
    pub surface: [f32; 4],
}

impl HairUniforms {
    pub fn new(
        model: Mat4,
        material: &MaterialParams,
        defines: &HairDefines,
        inputs: &BendInputs,
    ) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: material.color.to_array(),
            force: inputs.global_force.extend(inputs.centrifugal_force).to_array(),
            centrifugal: inputs
                .centrifugal_direction
                .extend(inputs.settle_time)
                .to_array(),
            shape: [
                defines.hair_length,
                defines.segment_step,
                defines.force_step,
                defines.height_segments as f32,
            ],
            surface: [
                inputs.settle_scale,
                defines.bend_mode.as_index() as f32,
                material.metalness,
                material.roughness,
            ],
        }
    }
}

/// Per-instance vertex data of one hair, stepped per instance.
///
/// Field order matches the streams [`generate`](crate::generate) defines, so
/// [`InstancedGeometry::interleaved`](crate::InstancedGeometry::interleaved)
/// produces the same bytes as a slice of these.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub force_factor: f32,
    pub settle_offset: f32,
    pub hair_position: [f32; 3],
    pub base_direction: [f32; 3],
}

impl InstanceRaw {
    /// 32 bytes per instance, locations 3 to 6.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceRaw>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            // force_factor
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32,
            },
            // settle_offset
            wgpu::VertexAttribute {
                offset: 4,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32,
            },
            // hair_position
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 5,
                format: wgpu::VertexFormat::Float32x3,
            },
            // base_direction
            wgpu::VertexAttribute {
                offset: 20,
                shader_location: 6,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };
}

impl From<&HairInstance> for InstanceRaw {
    fn from(hair: &HairInstance) -> Self {
        Self {
            force_factor: hair.force_factor,
            settle_offset: hair.settle_offset,
            hair_position: hair.hair_position.to_array(),
            base_direction: hair.base_direction.to_array(),
        }
    }
}

impl From<InstanceRaw> for HairInstance {
    fn from(raw: InstanceRaw) -> Self {
        Self {
            force_factor: raw.force_factor,
            settle_offset: raw.settle_offset,
            hair_position: Vec3::from(raw.hair_position),
            base_direction: Vec3::from(raw.base_direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{BaseShape, generate};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn layouts_have_expected_sizes() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 32);
        assert_eq!(std::mem::size_of::<HairUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<HairUniforms>(), 208);
    }

    #[test]
    fn hex_and_hsl_agree() {
        let from_hex = Color::hex(0x00ff00);
        let from_hsl = Color::from_hsl(1.0 / 3.0, 1.0, 0.5);
        for (a, b) in from_hex.to_array().iter().zip(from_hsl.to_array()) {
            assert!((a - b).abs() < 1e-5);
        }
        assert_eq!(Color::from_hsl(0.7, 0.0, 0.25), Color::rgb(0.25, 0.25, 0.25));
    }

    #[test]
    fn material_clamps_ranges() {
        let params = MaterialParams::default().metalness(3.0).roughness(-1.0);
        assert_eq!(params.metalness, 1.0);
        assert_eq!(params.roughness, 0.0);
    }

    #[test]
    fn defines_follow_config() {
        let config = FuzzyConfig::builder()
            .hair_length(4.0)
            .hair_height_segments(8)
            .build()
            .unwrap();
        let defines = HairDefines::new(&config);
        assert_eq!(defines.segment_step, 0.5);
        assert_eq!(defines.force_step, 0.25);
    }

    #[test]
    fn uniforms_pack_inputs() {
        let config = FuzzyConfig::builder().bend_mode(BendMode::Shortcut).build().unwrap();
        let inputs = BendInputs::at_rest(2.0);
        let uniforms = HairUniforms::new(
            Mat4::IDENTITY,
            &MaterialParams::default(),
            &HairDefines::new(&config),
            &inputs,
        );
        assert_eq!(uniforms.force, [0.0, -2.0, 0.0, 0.0]);
        assert_eq!(uniforms.surface[0], 1.0);
        assert_eq!(uniforms.surface[1], 0.0);
        assert_eq!(uniforms.shape[3], 16.0);
    }

    #[test]
    fn interleaved_streams_match_instance_records() {
        let base = BaseShape::new(vec![Vec3::ZERO, Vec3::X, Vec3::Z])
            .with_directions(vec![Vec3::Y, Vec3::X, Vec3::Z]);
        let fuzzy = generate(&base, &FuzzyConfig::default(), &mut StdRng::seed_from_u64(11)).unwrap();

        let records: Vec<InstanceRaw> = fuzzy.instances.iter().map(InstanceRaw::from).collect();
        let streams = fuzzy.geometry.interleaved();
        assert_eq!(bytemuck::cast_slice::<InstanceRaw, f32>(&records), streams.as_slice());

        let back: HairInstance = records[1].into();
        assert_eq!(back, fuzzy.instances[1]);
    }
}
