//! Procedural shapes.
//!
//! Every function returns a [`RawGeometry`] centered at the origin with
//! counter-clockwise front faces. Use them as base shapes to grow hair on, or
//! as hair prefabs ([`cone`] and [`cylinder`]).
//!
//! Seams are not welded: the sphere repeats its first column of vertices at
//! the end and has one vertex per segment at each pole. Call
//! [`RawGeometry::weld`] before using one as a base shape.
//!
//! ```
//! use fuzzy_mesh::primitives;
//!
//! let mut ball = primitives::sphere(1.0, 16, 8);
//! assert_eq!(ball.vertices.len(), 17 * 9);
//!
//! ball.weld(1e-4);
//! assert_eq!(ball.vertices.len(), 16 * 7 + 2);
//! ```

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::geometry::RawGeometry;
use crate::mesh::Vertex3d;

/// Angular sweep of a sphere, in radians.
///
/// `phi` runs around the vertical axis, `theta` from the north pole down.
/// The default is the full sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereSection {
    pub phi_start: f32,
    pub phi_length: f32,
    pub theta_start: f32,
    pub theta_length: f32,
}

impl Default for SphereSection {
    fn default() -> Self {
        Self {
            phi_start: 0.0,
            phi_length: TAU,
            theta_start: 0.0,
            theta_length: PI,
        }
    }
}

impl SphereSection {
    /// Cap from the north pole down to `theta_length`.
    pub fn cap(theta_length: f32) -> Self {
        Self {
            theta_length,
            ..Default::default()
        }
    }

    /// Band starting `theta_start` below the north pole.
    pub fn band(theta_start: f32, theta_length: f32) -> Self {
        Self {
            theta_start,
            theta_length,
            ..Default::default()
        }
    }
}

/// A full UV sphere.
///
/// Vertices: `(segments + 1) × (rings + 1)`.
pub fn sphere(radius: f32, segments: u32, rings: u32) -> RawGeometry {
    sphere_section(radius, segments, rings, SphereSection::default())
}

/// A sphere limited to an angular sweep; see [`SphereSection`].
///
/// Triangles that would collapse onto a pole are skipped when the sweep
/// actually reaches that pole.
pub fn sphere_section(radius: f32, segments: u32, rings: u32, section: SphereSection) -> RawGeometry {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let theta_end = (section.theta_start + section.theta_length).min(PI);

    let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = section.theta_start + v * section.theta_length;

        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let phi = section.phi_start + u * section.phi_length;

            let normal = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            let position = normal * radius;

            vertices.push(Vertex3d::new(position.into(), normal.into(), [u, 1.0 - v]));
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg + 1;
            let b = ring * stride + seg;
            let c = (ring + 1) * stride + seg;
            let d = (ring + 1) * stride + seg + 1;

            if ring != 0 || section.theta_start > 0.0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if ring != rings - 1 || theta_end < PI {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    RawGeometry::new(vertices, indices)
}

/// An axis-aligned cube with edge length `size`.
///
/// Each face has its own four vertices so normals stay flat.
pub fn cube(size: f32) -> RawGeometry {
    let h = size * 0.5;
    // (normal, u axis, v axis) per face
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u_axis, v_axis) in faces {
        let base = vertices.len() as u32;
        for (du, dv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = (normal + u_axis * du + v_axis * dv) * h;
            let uv = [(du + 1.0) * 0.5, (dv + 1.0) * 0.5];
            vertices.push(Vertex3d::new(p.into(), normal.into(), uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    RawGeometry::new(vertices, indices)
}

/// A horizontal plane on XZ facing +Y, subdivided into a grid.
pub fn plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> RawGeometry {
    let ws = width_segments.max(1);
    let ds = depth_segments.max(1);

    let mut vertices = Vec::with_capacity(((ws + 1) * (ds + 1)) as usize);
    for iz in 0..=ds {
        let v = iz as f32 / ds as f32;
        for ix in 0..=ws {
            let u = ix as f32 / ws as f32;
            let p = [(u - 0.5) * width, 0.0, (v - 0.5) * depth];
            vertices.push(Vertex3d::new(p, [0.0, 1.0, 0.0], [u, v]));
        }
    }

    let stride = ws + 1;
    let mut indices = Vec::with_capacity((ws * ds * 6) as usize);
    for iz in 0..ds {
        for ix in 0..ws {
            let a = iz * stride + ix;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    RawGeometry::new(vertices, indices)
}

/// A cylinder (or frustum) along the Y axis, centered at the origin.
///
/// The side has `(radial_segments + 1) × (height_segments + 1)` vertices,
/// ring by ring from the top down. Unless `open_ended`, a center vertex and
/// ring are added for each cap with a non-zero radius.
pub fn cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
    open_ended: bool,
) -> RawGeometry {
    let radial = radial_segments.max(1);
    let rows = height_segments.max(1);
    let half = height * 0.5;
    let slope = if height != 0.0 {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };

    let mut vertices = Vec::with_capacity(((radial + 1) * (rows + 1)) as usize);
    let mut indices = Vec::new();

    for y in 0..=rows {
        let v = y as f32 / rows as f32;
        let radius = v * (radius_bottom - radius_top) + radius_top;

        for x in 0..=radial {
            let u = x as f32 / radial as f32;
            let theta = u * TAU;
            let (sin, cos) = theta.sin_cos();

            let position = [radius * sin, -v * height + half, radius * cos];
            let normal = Vec3::new(sin, slope, cos).normalize();
            vertices.push(Vertex3d::new(position, normal.into(), [u, 1.0 - v]));
        }
    }

    let stride = radial + 1;
    for x in 0..radial {
        for y in 0..rows {
            let a = y * stride + x;
            let b = (y + 1) * stride + x;
            let c = (y + 1) * stride + x + 1;
            let d = y * stride + x + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    if !open_ended {
        if radius_top > 0.0 {
            push_cap(&mut vertices, &mut indices, radius_top, half, radial, true);
        }
        if radius_bottom > 0.0 {
            push_cap(&mut vertices, &mut indices, radius_bottom, -half, radial, false);
        }
    }

    RawGeometry::new(vertices, indices)
}

fn push_cap(
    vertices: &mut Vec<Vertex3d>,
    indices: &mut Vec<u32>,
    radius: f32,
    y: f32,
    radial: u32,
    top: bool,
) {
    let sign = if top { 1.0 } else { -1.0 };
    let normal = [0.0, sign, 0.0];

    let center = vertices.len() as u32;
    vertices.push(Vertex3d::new([0.0, y, 0.0], normal, [0.5, 0.5]));

    let ring = vertices.len() as u32;
    for x in 0..=radial {
        let theta = x as f32 / radial as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        let uv = [cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5];
        vertices.push(Vertex3d::new([radius * sin, y, radius * cos], normal, uv));
    }

    for x in 0..radial {
        let i = ring + x;
        if top {
            indices.extend_from_slice(&[i, i + 1, center]);
        } else {
            indices.extend_from_slice(&[i + 1, i, center]);
        }
    }
}

/// A cone along the Y axis with its point at the top.
pub fn cone(
    radius: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
    open_ended: bool,
) -> RawGeometry {
    cylinder(0.0, radius, height, radial_segments, height_segments, open_ended)
}

/// A torus around the Y axis.
///
/// `radius` is the distance from the center to the middle of the tube.
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> RawGeometry {
    let radial = radial_segments.max(3);
    let tubular = tubular_segments.max(3);

    let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);
    for j in 0..=radial {
        let v = j as f32 / radial as f32 * TAU;
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * TAU;

            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                tube * v.sin(),
                -(radius + tube * v.cos()) * u.sin(),
            );
            let center = Vec3::new(radius * u.cos(), 0.0, -radius * u.sin());
            let normal = (position - center).normalize_or_zero();
            let uv = [i as f32 / tubular as f32, j as f32 / radial as f32];
            vertices.push(Vertex3d::new(position.into(), normal.into(), uv));
        }
    }

    let stride = tubular + 1;
    let mut indices = Vec::with_capacity((radial * tubular * 6) as usize);
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    RawGeometry::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every triangle's winding agrees with its vertex normals.
    fn assert_outward(geom: &RawGeometry) {
        for tri in 0..geom.triangle_count() {
            let face = geom.face_normal(tri);
            if face.length_squared() < 1e-12 {
                continue;
            }
            let avg: Vec3 = geom.indices[tri * 3..tri * 3 + 3]
                .iter()
                .map(|&i| Vec3::from(geom.vertices[i as usize].normal))
                .sum();
            assert!(face.dot(avg) > 0.0, "triangle {} faces inward", tri);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let geom = sphere(2.0, 12, 6);
        for p in geom.positions() {
            assert!((p.length() - 2.0).abs() < 1e-4);
        }
        assert_outward(&geom);
    }

    #[test]
    fn sphere_skips_pole_triangles() {
        let geom = sphere(1.0, 8, 4);
        assert_eq!(geom.triangle_count(), 8 * 4 * 2 - 2 * 8);
    }

    #[test]
    fn sphere_cap_stays_in_sweep() {
        let geom = sphere_section(4.0, 32, 16, SphereSection::cap(PI * 0.55));
        let lowest = (PI * 0.55).cos() * 4.0;
        for p in geom.positions() {
            assert!(p.y >= lowest - 1e-4);
        }
        // Open bottom edge keeps its last ring of triangles.
        assert_eq!(geom.triangle_count(), 32 * 16 * 2 - 32);
    }

    #[test]
    fn cube_has_flat_faces() {
        let geom = cube(2.0);
        assert_eq!(geom.vertices.len(), 24);
        assert_eq!(geom.triangle_count(), 12);
        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::splat(-1.0));
        assert_eq!(max, Vec3::splat(1.0));
        assert_outward(&geom);
    }

    #[test]
    fn plane_faces_up() {
        let geom = plane(4.0, 2.0, 4, 2);
        assert_eq!(geom.vertices.len(), 15);
        assert_eq!(geom.triangle_count(), 16);
        for tri in 0..geom.triangle_count() {
            assert!(geom.face_normal(tri).normalize().dot(Vec3::Y) > 0.999);
        }
    }

    #[test]
    fn cone_tip_is_on_axis() {
        let geom = cone(0.5, 2.0, 4, 3, true);
        assert_eq!(geom.vertices.len(), 5 * 4);
        for v in &geom.vertices[0..5] {
            assert_eq!(v.position[0], 0.0);
            assert_eq!(v.position[1], 1.0);
            assert_eq!(v.position[2], 0.0);
        }
        assert_outward(&geom);
    }

    #[test]
    fn closed_cylinder_adds_caps() {
        let open = cylinder(0.2, 0.3, 1.0, 6, 2, true);
        let closed = cylinder(0.2, 0.3, 1.0, 6, 2, false);
        assert_eq!(closed.vertices.len(), open.vertices.len() + 2 * (1 + 7));
        assert_eq!(closed.triangle_count(), open.triangle_count() + 2 * 6);
        assert_outward(&closed);
    }

    #[test]
    fn torus_is_outward() {
        let geom = torus(2.0, 0.5, 8, 16);
        assert_eq!(geom.vertices.len(), 9 * 17);
        assert_outward(&geom);
    }
}
