//! CPU-side geometry and model loading.
//!
//! [`RawGeometry`] is the shape every other part of the crate works with: base
//! meshes that grow hair, the hair prefab itself, and anything loaded from disk.
//! It stays on the CPU until [`RawGeometry::upload`] turns it into a GPU [`Mesh`].
//!
//! # Loading
//!
//! ```no_run
//! use fuzzy_mesh::GeometryLoader;
//!
//! let bunny = GeometryLoader::from_file("bunny.stl")
//!     .centered()
//!     .upright()
//!     .normalized()
//!     .scaled(6.0)
//!     .build()
//!     .unwrap();
//!
//! println!("{} anchors", bunny.vertices.len());
//! ```
//!
//! | Format | Extensions | Notes |
//! |--------|------------|-------|
//! | STL    | `.stl`     | Binary and ASCII; shared vertices are kept so hair roots are not duplicated |

use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};
use glam::{Quat, Vec3};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// File format could not be determined from extension.
    #[error("unknown geometry format: '{0}'")]
    UnknownFormat(String),
    /// The geometry data was invalid or corrupt.
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Geometry data before GPU upload.
///
/// Triangles are stored as index triples into `vertices`, counter-clockwise
/// when viewed from the front.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    /// Creates raw geometry from vertices and indices.
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Vertex positions as glam vectors, in vertex order.
    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| Vec3::from(v.position)).collect()
    }

    /// Vertex normals as glam vectors, in vertex order.
    pub fn normals(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| Vec3::from(v.normal)).collect()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| {
                let p = Vec3::from(v.position);
                (min.min(p), max.max(p))
            },
        )
    }

    /// Returns the center point of the geometry.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Returns the size of the bounding box.
    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    /// Translates all vertices by the given offset.
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).into();
        }
    }

    /// Scales all vertices uniformly around the origin.
    pub fn scale(&mut self, factor: f32) {
        self.scale_xyz(Vec3::splat(factor));
    }

    /// Scales vertices non-uniformly.
    ///
    /// Normals are corrected with the inverse scale and renormalized.
    pub fn scale_xyz(&mut self, factors: Vec3) {
        let inverse = factors.recip();
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) * factors).into();
            v.normal = (Vec3::from(v.normal) * inverse).normalize_or_zero().into();
        }
    }

    /// Rotates all vertices and normals by the given quaternion.
    pub fn rotate(&mut self, rotation: Quat) {
        for v in &mut self.vertices {
            v.position = (rotation * Vec3::from(v.position)).into();
            v.normal = (rotation * Vec3::from(v.normal)).into();
        }
    }

    /// Centers the geometry at the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Scales the geometry to fit within a unit cube (-0.5 to 0.5).
    pub fn normalize(&mut self) {
        let size = self.size();
        let max_dim = size.x.max(size.y).max(size.z);
        if max_dim > 0.0 {
            self.scale(1.0 / max_dim);
        }
    }

    /// Unnormalized normal of triangle `tri`, with length equal to twice its area.
    pub fn face_normal(&self, tri: usize) -> Vec3 {
        let p = |k: usize| Vec3::from(self.vertices[self.indices[tri * 3 + k] as usize].position);
        let (p0, p1, p2) = (p(0), p(1), p(2));
        (p1 - p0).cross(p2 - p0)
    }

    /// Recalculates vertex normals from face geometry.
    ///
    /// Each vertex normal is the area-weighted average of the normals of every
    /// triangle that uses it. Vertices no triangle references end up with a
    /// zero normal.
    pub fn recalculate_normals(&mut self) {
        let mut sums = vec![Vec3::ZERO; self.vertices.len()];

        for tri in 0..self.triangle_count() {
            let face_normal = self.face_normal(tri);
            for &i in &self.indices[tri * 3..tri * 3 + 3] {
                sums[i as usize] += face_normal;
            }
        }

        for (v, sum) in self.vertices.iter_mut().zip(sums) {
            v.normal = sum.normalize_or_zero().into();
        }
    }

    /// Merges vertices closer than `tolerance` and drops triangles that collapse.
    ///
    /// Procedural shapes duplicate vertices along UV seams and at the poles; a
    /// base mesh should be welded first so each surface point grows one hair.
    /// The first vertex of each merged group is kept. Normals are recomputed.
    pub fn weld(&mut self, tolerance: f32) {
        use std::collections::HashMap;

        let inv = 1.0 / tolerance.max(f32::EPSILON);
        let mut lookup: HashMap<(i64, i64, i64), u32> = HashMap::new();
        let mut remap = Vec::with_capacity(self.vertices.len());
        let mut welded = Vec::new();

        for v in &self.vertices {
            let key = (
                (v.position[0] * inv).round() as i64,
                (v.position[1] * inv).round() as i64,
                (v.position[2] * inv).round() as i64,
            );
            let index = *lookup.entry(key).or_insert_with(|| {
                welded.push(*v);
                (welded.len() - 1) as u32
            });
            remap.push(index);
        }

        let mut indices = Vec::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (
                remap[tri[0] as usize],
                remap[tri[1] as usize],
                remap[tri[2] as usize],
            );
            if a != b && b != c && a != c {
                indices.extend_from_slice(&[a, b, c]);
            }
        }

        self.vertices = welded;
        self.indices = indices;
        self.recalculate_normals();
    }

    /// Appends another geometry, offsetting its indices.
    pub fn merge(&mut self, other: &RawGeometry) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Uploads this geometry to the GPU as a [`Mesh`].
    pub fn upload(&self, gpu: &GpuContext) -> Mesh {
        Mesh::new(gpu, &self.vertices, &self.indices)
    }
}

/// A fluent builder for loading and transforming geometry.
///
/// Errors are held until [`build`](Self::build), so the whole chain reads as one
/// expression.
#[derive(Clone)]
pub struct GeometryLoader {
    result: Result<RawGeometry, String>,
    center: bool,
    normalize: bool,
    smooth_normals: bool,
    scale_factor: Option<f32>,
    translation: Option<Vec3>,
    rotation: Option<Quat>,
}

impl GeometryLoader {
    fn with_result(result: Result<RawGeometry, String>) -> Self {
        Self {
            result,
            center: false,
            normalize: false,
            smooth_normals: false,
            scale_factor: None,
            translation: None,
            rotation: None,
        }
    }

    /// Loads geometry from a file, detecting format from extension.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::with_result(Self::load_file(path.as_ref()).map_err(|e| e.to_string()))
    }

    /// Loads an STL file regardless of its extension.
    pub fn from_stl(path: impl AsRef<Path>) -> Self {
        Self::with_result(Self::load_stl_file(path.as_ref()).map_err(|e| e.to_string()))
    }

    /// Loads STL geometry from raw bytes.
    ///
    /// Handy for embedded assets using `include_bytes!`.
    pub fn from_stl_bytes(bytes: &[u8]) -> Self {
        let mut cursor = std::io::Cursor::new(bytes);
        Self::with_result(Self::parse_stl(&mut cursor).map_err(|e| e.to_string()))
    }

    /// Wraps existing geometry so the same transformations can be applied.
    pub fn from_raw(geometry: RawGeometry) -> Self {
        Self::with_result(Ok(geometry))
    }

    /// Centers the geometry at the origin. Applied first.
    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    /// Scales the geometry to fit within a unit cube, preserving aspect ratio.
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    /// Recalculates smooth vertex normals after scaling.
    pub fn smooth_normals(mut self) -> Self {
        self.smooth_normals = true;
        self
    }

    /// Applies a uniform scale factor after centering and normalization.
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale_factor = Some(factor);
        self
    }

    /// Translates the geometry by the given offset. Applied last.
    pub fn translated(mut self, offset: Vec3) -> Self {
        self.translation = Some(offset);
        self
    }

    /// Reorients the geometry from Z-up to Y-up.
    ///
    /// Many modeling tools export with Z as the up axis. This applies a
    /// -90 degree rotation around X.
    pub fn upright(mut self) -> Self {
        self.rotation = Some(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        self
    }

    /// Rotates the geometry by a custom quaternion.
    pub fn rotated_by(mut self, rotation: Quat) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Applies all requested transformations and returns the geometry.
    ///
    /// Order: center, rotate, normalize, scale, smooth normals, translate.
    pub fn build(self) -> Result<RawGeometry, GeometryError> {
        let mut geometry = self.result.map_err(GeometryError::ParseError)?;

        if self.center {
            geometry.recenter();
        }
        if let Some(rotation) = self.rotation {
            geometry.rotate(rotation);
        }
        if self.normalize {
            geometry.normalize();
        }
        if let Some(scale) = self.scale_factor {
            geometry.scale(scale);
        }
        if self.smooth_normals {
            geometry.recalculate_normals();
        }
        if let Some(offset) = self.translation {
            geometry.translate(offset);
        }

        Ok(geometry)
    }

    /// Builds and uploads to the GPU in one go.
    pub fn upload(self, gpu: &GpuContext) -> Result<Mesh, GeometryError> {
        Ok(self.build()?.upload(gpu))
    }

    fn load_file(path: &Path) -> Result<RawGeometry, GeometryError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "stl" => Self::load_stl_file(path),
            _ => Err(GeometryError::UnknownFormat(ext)),
        }
    }

    fn load_stl_file(path: &Path) -> Result<RawGeometry, GeometryError> {
        log::info!("loading STL geometry from {}", path.display());
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        Self::parse_stl(&mut reader)
    }

    fn parse_stl<R: std::io::Read + std::io::Seek>(
        reader: &mut R,
    ) -> Result<RawGeometry, GeometryError> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| GeometryError::ParseError(format!("STL parse error: {}", e)))?;

        // stl_io already deduplicates vertices; keep them shared so each
        // surface point grows exactly one hair.
        let vertices = stl
            .vertices
            .iter()
            .map(|v| {
                let position: [f32; 3] = (*v).into();
                Vertex3d::new(position, [0.0, 0.0, 0.0], [0.0, 0.0])
            })
            .collect();

        let mut indices = Vec::with_capacity(stl.faces.len() * 3);
        for face in &stl.faces {
            indices.extend(face.vertices.iter().map(|&i| i as u32));
        }

        let mut geometry = RawGeometry::new(vertices, indices);
        geometry.recalculate_normals();
        log::info!(
            "parsed STL: {} vertices, {} triangles",
            geometry.vertices.len(),
            geometry.triangle_count()
        );
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(p: [f32; 3]) -> Vertex3d {
        Vertex3d::new(p, [0.0, 1.0, 0.0], [0.0, 0.0])
    }

    #[test]
    fn raw_geometry_bounds() {
        let geom = RawGeometry::new(
            vec![
                vertex([0.0, 0.0, 0.0]),
                vertex([1.0, 2.0, 3.0]),
                vertex([-1.0, -1.0, -1.0]),
            ],
            vec![0, 1, 2],
        );

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn raw_geometry_recenter() {
        let mut geom = RawGeometry::new(
            vec![vertex([2.0, 2.0, 2.0]), vertex([4.0, 4.0, 4.0])],
            vec![0, 1, 0],
        );

        geom.recenter();

        assert!(geom.center().length() < 0.001);
    }

    #[test]
    fn normalize_fits_unit_cube() {
        let mut geom = RawGeometry::new(
            vec![vertex([0.0, 0.0, 0.0]), vertex([4.0, 2.0, 1.0])],
            vec![],
        );
        geom.normalize();
        let size = geom.size();
        assert!((size.x - 1.0).abs() < 1e-6);
        assert!((size.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn recalculated_normals_average_shared_faces() {
        // Two triangles folded along the x axis: one facing +Y, one facing +Z.
        let mut geom = RawGeometry::new(
            vec![
                vertex([0.0, 0.0, 0.0]),
                vertex([1.0, 0.0, 0.0]),
                vertex([0.0, 0.0, -1.0]),
                vertex([0.0, 1.0, 0.0]),
            ],
            vec![0, 1, 2, 0, 1, 3],
        );
        geom.recalculate_normals();

        let n = geom.normals();
        assert!((n[2] - Vec3::Y).length() < 1e-5);
        assert!((n[3] - Vec3::Z).length() < 1e-5);
        let shared = Vec3::new(0.0, 1.0, 1.0).normalize();
        assert!((n[0] - shared).length() < 1e-5);
        assert!((n[1] - shared).length() < 1e-5);
    }

    #[test]
    fn merge_offsets_indices() {
        let mut a = RawGeometry::new(
            vec![vertex([0.0; 3]), vertex([1.0; 3]), vertex([2.0; 3])],
            vec![0, 1, 2],
        );
        let b = a.clone();
        a.merge(&b);
        assert_eq!(a.vertices.len(), 6);
        assert_eq!(&a.indices[3..], &[3, 4, 5]);
    }

    #[test]
    fn weld_merges_duplicates_and_drops_degenerates() {
        let mut geom = RawGeometry::new(
            vec![
                vertex([0.0, 0.0, 0.0]),
                vertex([1.0, 0.0, 0.0]),
                vertex([0.0, 0.0, -1.0]),
                vertex([1.0, 0.0, 0.0]),
                vertex([1.0, 0.0, -1.0]),
                vertex([0.0, 0.0, -1.0]),
                vertex([0.0, 0.0, 0.0]),
            ],
            vec![0, 1, 2, 3, 4, 5, 0, 6, 1],
        );
        geom.weld(1e-4);
        assert_eq!(geom.vertices.len(), 4);
        assert_eq!(geom.triangle_count(), 2);
    }

    #[test]
    fn unknown_extension_is_reported() {
        let err = GeometryLoader::from_file("model.obj").build().unwrap_err();
        assert!(err.to_string().contains("obj"));
    }

    #[test]
    fn ascii_stl_shares_vertices() {
        let stl = b"solid quad
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 1 1 0
endloop
endfacet
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 1 0
vertex 0 1 0
endloop
endfacet
endsolid quad
";
        let geom = GeometryLoader::from_stl_bytes(stl).build().unwrap();
        assert_eq!(geom.vertices.len(), 4);
        assert_eq!(geom.triangle_count(), 2);
        for n in geom.normals() {
            assert!((n - Vec3::Z).length() < 1e-5);
        }
    }
}
