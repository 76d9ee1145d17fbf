//! Hair generation.
//!
//! [`generate`] runs once per fuzzy mesh. It builds the hair prefab, then draws
//! the static per-hair attributes for every anchor of a [`BaseShape`]:
//!
//! | Attribute        | Components | Value                                              |
//! |------------------|------------|----------------------------------------------------|
//! | `forceFactor`    | 1          | uniform in `[min_force_factor, max_force_factor]`  |
//! | `settleOffset`   | 1          | uniform in `[0, 2π)`                               |
//! | `hairPosition`   | 3          | the anchor position                                |
//! | `baseDirection`  | 3          | anchor direction plus per-axis jitter, normalized  |
//!
//! Random values are drawn from the caller's generator in a fixed order: every
//! force factor, then every settle offset, then the x, y and z jitter of each
//! anchor in turn. The same seed always yields the same hairs.
//!
//! ```
//! use fuzzy_mesh::{generate, primitives, BaseShape, FuzzyConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut ball = primitives::sphere(1.0, 12, 8);
//! ball.weld(1e-4);
//!
//! let config = FuzzyConfig::builder().hair_length(0.5).build().unwrap();
//! let mut rng = StdRng::seed_from_u64(7);
//! let fuzzy = generate(&BaseShape::from_geometry(&ball), &config, &mut rng).unwrap();
//!
//! assert_eq!(fuzzy.instances.len(), ball.vertices.len());
//! ```

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::config::FuzzyConfig;
use crate::error::FuzzyError;
use crate::geometry::RawGeometry;
use crate::instanced::InstancedGeometry;
use crate::primitives;

/// How anchor directions are derived from triangle data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalMode {
    /// Area-weighted average of every incident face normal.
    #[default]
    Averaged,
    /// The normal of the last face (in index order) that references the vertex.
    ///
    /// Cheaper and slightly lumpy on curved surfaces, since shared vertices
    /// only see one of their faces.
    LastFaceWins,
}

/// The surface hairs grow from.
///
/// Anchors come with either explicit directions or triangle indices to derive
/// normals from. Explicit directions win when both are present.
#[derive(Clone, Debug, Default)]
pub struct BaseShape {
    /// Hair root positions, one hair per anchor.
    pub anchors: Vec<Vec3>,
    /// Caller-supplied growth directions, parallel to `anchors`.
    pub directions: Option<Vec<Vec3>>,
    /// Triangle indices into `anchors`.
    pub indices: Option<Vec<u32>>,
    /// How normals are computed from `indices`.
    pub normal_mode: NormalMode,
}

impl BaseShape {
    /// A shape with anchors only. Add directions or indices before generating.
    pub fn new(anchors: Vec<Vec3>) -> Self {
        Self {
            anchors,
            ..Default::default()
        }
    }

    /// Uses every vertex of `geometry` as an anchor, with its triangles as topology.
    pub fn from_geometry(geometry: &RawGeometry) -> Self {
        Self {
            anchors: geometry.positions(),
            indices: Some(geometry.indices.clone()),
            ..Default::default()
        }
    }

    pub fn with_directions(mut self, directions: Vec<Vec3>) -> Self {
        self.directions = Some(directions);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_normal_mode(mut self, mode: NormalMode) -> Self {
        self.normal_mode = mode;
        self
    }

    /// Checks the shape and returns one direction per anchor.
    ///
    /// Directions derived from topology are unit length. Vertices that no
    /// triangle references, or whose normal cancels out, point along `+Y`.
    pub fn resolve_directions(&self) -> Result<Vec<Vec3>, FuzzyError> {
        if self.anchors.is_empty() {
            return Err(FuzzyError::InvalidBaseShape("no anchor points".to_string()));
        }

        if let Some(directions) = &self.directions {
            if directions.len() != self.anchors.len() {
                return Err(FuzzyError::InvalidBaseShape(format!(
                    "{} directions supplied for {} anchors",
                    directions.len(),
                    self.anchors.len()
                )));
            }
            return Ok(directions.clone());
        }

        let Some(indices) = &self.indices else {
            return Err(FuzzyError::InvalidBaseShape(
                "neither directions nor topology supplied".to_string(),
            ));
        };

        if indices.len() % 3 != 0 {
            return Err(FuzzyError::InvalidBaseShape(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= self.anchors.len()) {
            return Err(FuzzyError::InvalidBaseShape(format!(
                "index {bad} out of range for {} anchors",
                self.anchors.len()
            )));
        }

        Ok(match self.normal_mode {
            NormalMode::Averaged => self.averaged_normals(indices),
            NormalMode::LastFaceWins => self.last_face_normals(indices),
        })
    }

    fn face_normal(&self, tri: &[u32]) -> Vec3 {
        let p0 = self.anchors[tri[0] as usize];
        let p1 = self.anchors[tri[1] as usize];
        let p2 = self.anchors[tri[2] as usize];
        (p1 - p0).cross(p2 - p0)
    }

    fn averaged_normals(&self, indices: &[u32]) -> Vec<Vec3> {
        let mut sums = vec![Vec3::ZERO; self.anchors.len()];
        for tri in indices.chunks_exact(3) {
            let n = self.face_normal(tri);
            for &i in tri {
                sums[i as usize] += n;
            }
        }
        sums.into_iter().map(|n| n.normalize_or(Vec3::Y)).collect()
    }

    fn last_face_normals(&self, indices: &[u32]) -> Vec<Vec3> {
        let mut normals = vec![Vec3::Y; self.anchors.len()];
        for tri in indices.chunks_exact(3) {
            let n = self.face_normal(tri).normalize_or_zero();
            if n == Vec3::ZERO {
                continue;
            }
            for &i in tri {
                normals[i as usize] = n;
            }
        }
        normals
    }
}

/// Template geometry for a single hair.
pub struct HairPrefab;

impl HairPrefab {
    /// Builds the prefab for `config`.
    ///
    /// An open cone when `hair_radius_top` is zero, otherwise a capped
    /// cylinder. Either way the root sits at `y = 0` and the tip at
    /// `y = hair_length`.
    pub fn build(config: &FuzzyConfig) -> RawGeometry {
        let mut prefab = if config.is_pointy() {
            primitives::cone(
                config.hair_radius_base,
                config.hair_length,
                config.hair_radial_segments,
                config.hair_height_segments,
                true,
            )
        } else {
            primitives::cylinder(
                config.hair_radius_top,
                config.hair_radius_base,
                config.hair_length,
                config.hair_radial_segments,
                config.hair_height_segments,
                false,
            )
        };
        prefab.translate(Vec3::Y * config.hair_length * 0.5);
        prefab
    }
}

/// Static attributes of one hair. Never changes after generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HairInstance {
    /// Multiplier on the total force bending this hair.
    pub force_factor: f32,
    /// Phase of the settle wobble, in `[0, 2π)`.
    pub settle_offset: f32,
    /// Root position on the base shape.
    pub hair_position: Vec3,
    /// Unit direction the hair points in with no force applied.
    pub base_direction: Vec3,
}

/// Output of [`generate`].
#[derive(Clone, Debug)]
pub struct FuzzyGeometry {
    /// One hair's template shape.
    pub prefab: RawGeometry,
    /// Per-hair attributes, one per anchor.
    pub instances: Vec<HairInstance>,
    /// The prefab with the attributes attached as named instance streams.
    pub geometry: InstancedGeometry,
}

impl FuzzyGeometry {
    pub fn hair_count(&self) -> usize {
        self.instances.len()
    }
}

/// Builds the hair prefab and draws per-hair attributes for every anchor.
///
/// Fails with [`FuzzyError::InvalidConfig`] for out-of-range parameters and
/// [`FuzzyError::InvalidBaseShape`] when the shape has no anchors or no way
/// to get a direction for them. Neither input is modified.
pub fn generate<R>(
    base: &BaseShape,
    config: &FuzzyConfig,
    rng: &mut R,
) -> Result<FuzzyGeometry, FuzzyError>
where
    R: Rng + ?Sized,
{
    config.validate()?;
    let directions = base.resolve_directions()?;
    let count = base.anchors.len();

    let force_factors: Vec<f32> = (0..count)
        .map(|_| rng.random_range(config.min_force_factor..=config.max_force_factor))
        .collect();

    let settle_offsets: Vec<f32> = (0..count).map(|_| rng.random_range(0.0..TAU)).collect();

    let base_directions: Vec<Vec3> = directions
        .iter()
        .map(|&direction| {
            let jitter = Vec3::new(
                spread(rng, config.fuzz),
                spread(rng, config.fuzz),
                spread(rng, config.fuzz),
            );
            (direction + jitter).normalize_or(direction.normalize_or(Vec3::Y))
        })
        .collect();

    let instances: Vec<HairInstance> = (0..count)
        .map(|i| HairInstance {
            force_factor: force_factors[i],
            settle_offset: settle_offsets[i],
            hair_position: base.anchors[i],
            base_direction: base_directions[i],
        })
        .collect();

    let prefab = HairPrefab::build(config);
    let mut geometry = InstancedGeometry::new(prefab.clone(), count);
    geometry.define_instance_attribute("forceFactor", 1, |data, i| {
        data[0] = instances[i].force_factor;
    });
    geometry.define_instance_attribute("settleOffset", 1, |data, i| {
        data[0] = instances[i].settle_offset;
    });
    geometry.define_instance_attribute("hairPosition", 3, |data, i| {
        data.copy_from_slice(&instances[i].hair_position.to_array());
    });
    geometry.define_instance_attribute("baseDirection", 3, |data, i| {
        data.copy_from_slice(&instances[i].base_direction.to_array());
    });

    log::debug!(
        "generated {} hairs ({} prefab vertices, {:?} bend)",
        count,
        prefab.vertices.len(),
        config.bend_mode
    );

    Ok(FuzzyGeometry {
        prefab,
        instances,
        geometry,
    })
}

/// Uniform value in `[-amount / 2, amount / 2)`.
fn spread<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * amount
}

/// A uniformly distributed random unit vector.
pub fn random_axis<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..=1.0);
    let phi: f32 = rng.random_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}
