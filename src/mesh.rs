//! GPU meshes, the shared vertex format, and spatial transforms.
//!
//! - [`Vertex3d`] — position, normal, and UV; used by base meshes and the hair prefab
//! - [`Mesh`] — GPU-resident vertex and index buffers
//! - [`Transform`] — position, rotation, and scale for placing a fuzzy mesh in the world
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |
//!
//! Hair instance attributes start at location 3, see
//! [`InstanceRaw::LAYOUT`](crate::InstanceRaw::LAYOUT).

use crate::geometry::RawGeometry;
use crate::gpu::GpuContext;
use glam::{Mat4, Quat, Vec3};

/// A vertex with position, normal, and texture coordinates.
///
/// `#[repr(C)]` plus [`bytemuck::Pod`] so slices can be uploaded as-is.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Position in model space.
    pub position: [f32; 3],
    /// Surface normal (normalized for correct lighting).
    pub normal: [f32; 3],
    /// Texture coordinates, typically in the range [0, 1].
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout for this vertex type.
    ///
    /// 32 bytes per vertex, stepped per vertex, locations 0 to 2.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    /// Creates a new vertex with the given position, normal, and UV coordinates.
    ///
    /// ```
    /// use fuzzy_mesh::Vertex3d;
    ///
    /// let vertex = Vertex3d::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0]);
    /// assert_eq!(vertex.uv, [1.0, 0.0]);
    /// ```
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// GPU-resident geometry with vertex and index buffers.
///
/// Created from a [`RawGeometry`] (see [`Mesh::from_geometry`]). All built-in
/// shapes use counter-clockwise winding for front faces.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads vertex and index data to new GPU buffers.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Uploads a [`RawGeometry`].
    pub fn from_geometry(gpu: &GpuContext, geometry: &RawGeometry) -> Self {
        Self::new(gpu, &geometry.vertices, &geometry.indices)
    }

    /// Number of indices drawn per instance.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Position, rotation, and scale of an object in the world.
///
/// Builder style:
///
/// ```
/// use fuzzy_mesh::Transform;
/// use glam::{Quat, Vec3};
///
/// let transform = Transform::new()
///     .position(Vec3::new(0.0, 2.0, -5.0))
///     .rotation(Quat::from_rotation_y(0.5))
///     .uniform_scale(2.0);
/// assert_eq!(transform.scale, Vec3::splat(2.0));
/// ```
///
/// [`Transform::matrix`] applies Scale, then Rotate, then Translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position (translation).
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Scale factors for each axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform (origin, no rotation, unit scale).
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform positioned at the given location.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Parents this transform under `parent`, returning the combined transform.
    ///
    /// Used for grouped objects such as the parts of a character.
    pub fn then(&self, parent: &Transform) -> Transform {
        Transform {
            position: parent.position + parent.rotation * (parent.scale * self.position),
            rotation: parent.rotation * self.rotation,
            scale: parent.scale * self.scale,
        }
    }

    /// Maps a local point into world space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * point)
    }

    /// The 4×4 model matrix (SRT order).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 32);
    }

    #[test]
    fn transform_point_matches_matrix() {
        let transform = Transform::new()
            .position(Vec3::new(1.0, 2.0, 3.0))
            .rotation(Quat::from_rotation_z(0.7))
            .uniform_scale(1.5);
        let p = Vec3::new(0.3, -0.2, 0.9);
        let expected = transform.matrix().transform_point3(p);
        assert!((transform.transform_point(p) - expected).length() < 1e-5);
    }

    #[test]
    fn then_composes_with_parent() {
        let parent = Transform::from_position(Vec3::new(0.0, -8.0, 0.0))
            .rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let child = Transform::from_position(Vec3::new(0.0, 0.0, 3.0));
        let world = child.then(&parent);
        let p = Vec3::new(0.5, 0.0, 0.0);
        let expected = parent.transform_point(child.transform_point(p));
        assert!((world.transform_point(p) - expected).length() < 1e-5);
    }
}
