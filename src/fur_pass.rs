//! Fur rendering pass with depth testing.
//!
//! [`FurPass`] draws fuzzy meshes in two pipelines sharing one shader
//! (`shaders/fur.wgsl`):
//!
//! - **hair**: the hair prefab instanced once per hair, bent in the vertex
//!   shader from per-instance attributes and the mesh's uniform block
//! - **base**: the undeformed base mesh, lit the same way
//!
//! # Bind groups
//!
//! - **Group 0**: [`FrameUniforms`] (camera, lights, fog), written once per frame
//! - **Group 1**: [`HairUniforms`], one buffer per fuzzy mesh for the hair and
//!   one for its base
//!
//! # Usage
//!
//! ```ignore
//! let mut pass = FurPass::new(&gpu);
//! let resources = pass.upload(&gpu, &fuzzy);
//!
//! // every frame, after fuzzy.update():
//! pass.ensure_depth_size(&gpu);
//! pass.prepare(&gpu, &camera, &lighting);
//! pass.write(&gpu, &resources, &fuzzy);
//! // inside a render pass using pass.depth_view():
//! pass.draw(&mut render_pass, &resources);
//! ```

use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::fuzzy_mesh::FuzzyMesh;
use crate::gpu::GpuContext;
use crate::material::{Color, HairUniforms, InstanceRaw};
use crate::mesh::{Mesh, Vertex3d};

/// Depth buffer format used by the pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Two directional lights, an ambient term, and optional fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    /// Direction toward the key light.
    pub key_direction: glam::Vec3,
    pub key_color: Color,
    /// Direction toward the fill light.
    pub fill_direction: glam::Vec3,
    pub fill_color: Color,
    pub ambient: Color,
    pub fog_color: Color,
    /// Exponential-squared fog density. Zero disables fog.
    pub fog_density: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            key_direction: glam::Vec3::Y,
            key_color: Color::WHITE,
            fill_direction: glam::Vec3::NEG_Y,
            fill_color: Color::WHITE,
            ambient: Color::hex(0xaaaaaa),
            fog_color: Color::WHITE,
            fog_density: 0.0,
        }
    }
}

/// Per-frame uniforms (group 0).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub key_dir: [f32; 4],
    pub key_color: [f32; 4],
    pub fill_dir: [f32; 4],
    pub fill_color: [f32; 4],
    pub ambient: [f32; 4],
    /// rgb fog color, a density.
    pub fog: [f32; 4],
}

impl FrameUniforms {
    pub fn new(camera: &Camera, aspect: f32, lighting: &Lighting) -> Self {
        let fog = lighting.fog_color;
        Self {
            view_proj: camera.view_projection(aspect).to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            key_dir: lighting.key_direction.extend(0.0).to_array(),
            key_color: lighting.key_color.to_array(),
            fill_dir: lighting.fill_direction.extend(0.0).to_array(),
            fill_color: lighting.fill_color.to_array(),
            ambient: lighting.ambient.to_array(),
            fog: [fog.r, fog.g, fog.b, lighting.fog_density],
        }
    }
}

/// GPU resources of one fuzzy mesh.
pub struct FuzzyGpu {
    prefab: Mesh,
    instances: wgpu::Buffer,
    instance_count: u32,
    base: Mesh,
    hair_uniforms: wgpu::Buffer,
    hair_bind_group: wgpu::BindGroup,
    base_uniforms: wgpu::Buffer,
    base_bind_group: wgpu::BindGroup,
}

impl FuzzyGpu {
    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }
}

/// Renders fuzzy meshes.
pub struct FurPass {
    hair_pipeline: wgpu::RenderPipeline,
    base_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    mesh_layout: wgpu::BindGroupLayout,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn create_pipeline(
    gpu: &GpuContext,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
    entry_point: &str,
    buffers: &[wgpu::VertexBufferLayout<'static>],
) -> wgpu::RenderPipeline {
    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(entry_point),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Open cones and partial spheres are seen from both sides.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

impl FurPass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fur Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/fur.wgsl").into()),
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = uniform_layout(device, "Frame Bind Group Layout");
        let mesh_layout = uniform_layout(device, "Fuzzy Mesh Bind Group Layout");

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fur Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &mesh_layout],
            push_constant_ranges: &[],
        });

        let hair_pipeline = create_pipeline(
            gpu,
            &pipeline_layout,
            &shader,
            "Fur Hair Pipeline",
            "vs_hair",
            &[Vertex3d::LAYOUT, InstanceRaw::LAYOUT],
        );
        let base_pipeline = create_pipeline(
            gpu,
            &pipeline_layout,
            &shader,
            "Fur Base Pipeline",
            "vs_base",
            &[Vertex3d::LAYOUT],
        );

        let depth_view = Self::create_depth_view(gpu);

        Self {
            hair_pipeline,
            base_pipeline,
            frame_buffer,
            frame_bind_group,
            mesh_layout,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Fur Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreates the depth buffer if the surface was resized.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = Self::create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// The depth attachment render passes drawing fur must use.
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    fn mesh_uniforms(&self, gpu: &GpuContext, label: &str, data: HairUniforms) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&[data]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.mesh_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        (buffer, bind_group)
    }

    /// Uploads the prefab, the per-hair streams, and the base mesh of `fuzzy`.
    pub fn upload(&self, gpu: &GpuContext, fuzzy: &FuzzyMesh) -> FuzzyGpu {
        let hair = fuzzy.hair();
        let streams = hair.geometry.interleaved();
        debug_assert_eq!(
            hair.geometry.stride() * std::mem::size_of::<f32>(),
            std::mem::size_of::<InstanceRaw>()
        );

        let instances = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Hair Instance Buffer"),
                contents: bytemuck::cast_slice(&streams),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let (hair_uniforms, hair_bind_group) =
            self.mesh_uniforms(gpu, "Hair Uniforms", fuzzy.hair_uniforms());
        let (base_uniforms, base_bind_group) =
            self.mesh_uniforms(gpu, "Base Uniforms", fuzzy.base_uniforms());

        log::debug!(
            "uploaded {} hairs, {} base vertices",
            hair.hair_count(),
            fuzzy.base_geometry().vertices.len()
        );

        FuzzyGpu {
            prefab: Mesh::from_geometry(gpu, &hair.prefab),
            instances,
            instance_count: hair.hair_count() as u32,
            base: Mesh::from_geometry(gpu, fuzzy.base_geometry()),
            hair_uniforms,
            hair_bind_group,
            base_uniforms,
            base_bind_group,
        }
    }

    /// Writes camera and lighting for this frame.
    pub fn prepare(&self, gpu: &GpuContext, camera: &Camera, lighting: &Lighting) {
        let uniforms = FrameUniforms::new(camera, gpu.aspect(), lighting);
        gpu.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Writes `fuzzy`'s current simulation state and material.
    pub fn write(&self, gpu: &GpuContext, resources: &FuzzyGpu, fuzzy: &FuzzyMesh) {
        gpu.queue.write_buffer(
            &resources.hair_uniforms,
            0,
            bytemuck::cast_slice(&[fuzzy.hair_uniforms()]),
        );
        gpu.queue.write_buffer(
            &resources.base_uniforms,
            0,
            bytemuck::cast_slice(&[fuzzy.base_uniforms()]),
        );
    }

    /// Records draws for the base mesh and its hair.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass, resources: &FuzzyGpu) {
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

        render_pass.set_pipeline(&self.base_pipeline);
        render_pass.set_bind_group(1, &resources.base_bind_group, &[]);
        render_pass.set_vertex_buffer(0, resources.base.vertex_buffer.slice(..));
        render_pass.set_index_buffer(
            resources.base.index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        render_pass.draw_indexed(0..resources.base.index_count, 0, 0..1);

        if resources.instance_count == 0 {
            return;
        }

        render_pass.set_pipeline(&self.hair_pipeline);
        render_pass.set_bind_group(1, &resources.hair_bind_group, &[]);
        render_pass.set_vertex_buffer(0, resources.prefab.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, resources.instances.slice(..));
        render_pass.set_index_buffer(
            resources.prefab.index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        render_pass.draw_indexed(
            0..resources.prefab.index_count,
            0,
            0..resources.instance_count,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn frame_uniforms_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 64 + 7 * 16);
    }

    #[test]
    fn frame_uniforms_pack_fog_density() {
        let lighting = Lighting {
            fog_color: Color::hex(0xf1f1f1),
            fog_density: 0.01,
            ..Default::default()
        };
        let camera = Camera::new().at(Vec3::new(30.0, 10.0, 30.0));
        let uniforms = FrameUniforms::new(&camera, 1.5, &lighting);
        assert_eq!(uniforms.fog[3], 0.01);
        assert_eq!(uniforms.camera_pos, [30.0, 10.0, 30.0, 1.0]);
    }
}
