//! The hair-covered object callers work with.
//!
//! A [`FuzzyMesh`] owns everything one furry object needs: the base geometry
//! (drawn as a solid surface under the hair), the generated hairs, the
//! material, and the [`SimulationState`] its motion feeds. It does not own
//! GPU resources; the scene uploads those lazily.
//!
//! ```
//! use fuzzy_mesh::{primitives, Color, FuzzyConfig, FuzzyMesh};
//! use glam::Vec3;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut ball = primitives::sphere(1.0, 16, 12);
//! ball.weld(1e-4);
//!
//! let config = FuzzyConfig::builder().hair_length(2.0).build().unwrap();
//! let mut fuzzy = FuzzyMesh::builder(ball)
//!     .config(config)
//!     .build_with_rng(&mut StdRng::seed_from_u64(1))
//!     .unwrap();
//!
//! fuzzy.set_color(Color::hex(0x47debd));
//! fuzzy.set_position(Vec3::new(0.0, 8.0, 0.0));
//! fuzzy.update();
//! ```

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bend::{self, BendInputs};
use crate::config::FuzzyConfig;
use crate::error::FuzzyError;
use crate::generator::{BaseShape, FuzzyGeometry, HairInstance, NormalMode, generate};
use crate::geometry::RawGeometry;
use crate::material::{Color, HairDefines, HairUniforms, MaterialParams};
use crate::mesh::Transform;
use crate::state::SimulationState;

/// Options for [`FuzzyMesh`] construction. Every setter is optional.
#[derive(Clone, Debug)]
pub struct FuzzyMeshBuilder {
    geometry: RawGeometry,
    config: FuzzyConfig,
    material: MaterialParams,
    directions: Option<Vec<Vec3>>,
    normal_mode: NormalMode,
}

impl FuzzyMeshBuilder {
    pub fn config(mut self, config: FuzzyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn material(mut self, material: MaterialParams) -> Self {
        self.material = material;
        self
    }

    /// Hair directions, one per base vertex, used instead of surface normals.
    pub fn directions(mut self, directions: Vec<Vec3>) -> Self {
        self.directions = Some(directions);
        self
    }

    pub fn normal_mode(mut self, mode: NormalMode) -> Self {
        self.normal_mode = mode;
        self
    }

    /// Generates hairs with a generator seeded from the operating system.
    pub fn build(self) -> Result<FuzzyMesh, FuzzyError> {
        let mut rng = StdRng::from_os_rng();
        self.build_with_rng(&mut rng)
    }

    /// Generates hairs drawing from `rng`. The same seed gives the same hairs.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<FuzzyMesh, FuzzyError> {
        let mut shape = BaseShape::from_geometry(&self.geometry).with_normal_mode(self.normal_mode);
        shape.directions = self.directions;

        let hair = generate(&shape, &self.config, rng)?;

        Ok(FuzzyMesh {
            defines: HairDefines::new(&self.config),
            state: SimulationState::new(&self.config),
            config: self.config,
            hair,
            base: self.geometry,
            hair_material: self.material,
            base_material: self.material,
            parent: Transform::default(),
        })
    }
}

/// A base mesh covered in simulated hair.
#[derive(Clone, Debug)]
pub struct FuzzyMesh {
    config: FuzzyConfig,
    defines: HairDefines,
    hair: FuzzyGeometry,
    base: RawGeometry,
    state: SimulationState,
    hair_material: MaterialParams,
    base_material: MaterialParams,
    parent: Transform,
}

impl FuzzyMesh {
    /// Starts building a fuzzy mesh that grows hair from every vertex of `geometry`.
    pub fn builder(geometry: RawGeometry) -> FuzzyMeshBuilder {
        FuzzyMeshBuilder {
            geometry,
            config: FuzzyConfig::default(),
            material: MaterialParams::default(),
            directions: None,
            normal_mode: NormalMode::default(),
        }
    }

    /// Builds with default material and surface-normal directions.
    pub fn new(geometry: RawGeometry, config: FuzzyConfig) -> Result<Self, FuzzyError> {
        Self::builder(geometry).config(config).build()
    }

    /// Like [`new`](Self::new) but deterministic for a given generator state.
    pub fn with_rng<R: Rng + ?Sized>(
        geometry: RawGeometry,
        config: FuzzyConfig,
        rng: &mut R,
    ) -> Result<Self, FuzzyError> {
        Self::builder(geometry).config(config).build_with_rng(rng)
    }

    pub fn config(&self) -> &FuzzyConfig {
        &self.config
    }

    pub fn defines(&self) -> &HairDefines {
        &self.defines
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The generated prefab and per-hair attributes.
    pub fn hair(&self) -> &FuzzyGeometry {
        &self.hair
    }

    pub fn instances(&self) -> &[HairInstance] {
        &self.hair.instances
    }

    pub fn hair_count(&self) -> usize {
        self.hair.instances.len()
    }

    /// The undeformed surface drawn beneath the hair.
    pub fn base_geometry(&self) -> &RawGeometry {
        &self.base
    }

    pub fn hair_material(&self) -> &MaterialParams {
        &self.hair_material
    }

    pub fn base_material(&self) -> &MaterialParams {
        &self.base_material
    }

    /// Moves the mesh within its parent. The move drives the movement force.
    pub fn set_position(&mut self, position: Vec3) {
        self.state.set_position(position);
    }

    /// Moves the mesh without disturbing the hair, e.g. for initial placement.
    pub fn place(&mut self, position: Vec3) {
        self.state.place(position);
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn set_rotation_angle(&mut self, angle: f32) {
        self.state.set_rotation_angle(angle);
    }

    /// Changes the spin axis. Resets the angle to zero.
    pub fn set_rotation_axis(&mut self, axis: Vec3) {
        self.state.set_rotation_axis(axis);
    }

    /// Recolors both the hair and the base mesh.
    pub fn set_color(&mut self, color: Color) {
        self.hair_material.color = color;
        self.base_material.color = color;
    }

    /// Sets the transform of the group this mesh belongs to.
    pub fn set_parent(&mut self, parent: Transform) {
        self.parent = parent;
    }

    /// Advances the simulation. Call exactly once per tick, before rendering.
    pub fn update(&mut self) {
        self.state.update(&self.config);
    }

    pub fn bend_inputs(&self) -> BendInputs {
        self.state.bend_inputs()
    }

    /// World transform: the mesh's position and orientation inside its parent.
    pub fn transform(&self) -> Transform {
        Transform::new()
            .position(self.state.position)
            .rotation(self.state.orientation)
            .then(&self.parent)
    }

    /// Uniform block for drawing the hair this tick.
    pub fn hair_uniforms(&self) -> HairUniforms {
        HairUniforms::new(
            self.transform().matrix(),
            &self.hair_material,
            &self.defines,
            &self.bend_inputs(),
        )
    }

    /// Uniform block for drawing the base mesh this tick.
    pub fn base_uniforms(&self) -> HairUniforms {
        HairUniforms::new(
            self.transform().matrix(),
            &self.base_material,
            &self.defines,
            &self.bend_inputs(),
        )
    }

    /// Bends hair `index` on the CPU, returning its prefab vertices in the
    /// mesh's local frame.
    ///
    /// # Panics
    /// Panics if `index >= self.hair_count()`.
    pub fn bent_hair(&self, index: usize) -> Vec<Vec3> {
        let inputs = self.bend_inputs();
        let hair = &self.hair.instances[index];
        self.hair
            .prefab
            .vertices
            .iter()
            .map(|v| bend::evaluate(Vec3::from(v.position), hair, &inputs, &self.config))
            .collect()
    }

    /// Every bent hair vertex, hair by hair, in the mesh's local frame.
    ///
    /// Matches what the vertex shader computes. Useful for tests, exports, and
    /// machines without a GPU.
    pub fn deformed_positions(&self) -> Vec<Vec3> {
        (0..self.hair_count()).flat_map(|i| self.bent_hair(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    fn patch() -> RawGeometry {
        primitives::plane(2.0, 2.0, 2, 2)
    }

    fn seeded(config: FuzzyConfig) -> FuzzyMesh {
        FuzzyMesh::with_rng(patch(), config, &mut StdRng::seed_from_u64(3)).unwrap()
    }

    #[test]
    fn one_hair_per_base_vertex() {
        let fuzzy = seeded(FuzzyConfig::default());
        assert_eq!(fuzzy.hair_count(), 9);
        let expected = fuzzy.hair_count() * fuzzy.hair().prefab.vertices.len();
        assert_eq!(fuzzy.deformed_positions().len(), expected);
    }

    #[test]
    fn at_rest_hair_is_undisplaced() {
        let config = FuzzyConfig::builder().fuzz(0.0).gravity(0.0).build().unwrap();
        let fuzzy = seeded(config);
        let prefab = &fuzzy.hair().prefab;
        for (i, hair) in fuzzy.instances().iter().enumerate() {
            for (bent, v) in fuzzy.bent_hair(i).iter().zip(&prefab.vertices) {
                let expected = Vec3::from(v.position) + hair.hair_position;
                assert!((*bent - expected).length() < 1e-4);
            }
        }
    }

    #[test]
    fn rejects_bad_config_and_directions() {
        let mut config = FuzzyConfig::default();
        config.hair_length = 0.0;
        let err = FuzzyMesh::with_rng(patch(), config, &mut StdRng::seed_from_u64(0));
        assert!(matches!(err, Err(FuzzyError::InvalidConfig(_))));

        let err = FuzzyMesh::builder(patch())
            .directions(vec![Vec3::Y; 2])
            .build_with_rng(&mut StdRng::seed_from_u64(0));
        assert!(matches!(err, Err(FuzzyError::InvalidBaseShape(_))));
    }

    #[test]
    fn explicit_directions_are_used() {
        let fuzzy = FuzzyMesh::builder(patch())
            .config(FuzzyConfig::builder().fuzz(0.0).build().unwrap())
            .directions(vec![Vec3::Z; 9])
            .build_with_rng(&mut StdRng::seed_from_u64(0))
            .unwrap();
        assert!(fuzzy.instances().iter().all(|h| h.base_direction == Vec3::Z));
    }

    #[test]
    fn color_applies_to_hair_and_base() {
        let mut fuzzy = seeded(FuzzyConfig::default());
        let color = Color::from_hsl(0.6, 0.75, 0.5);
        fuzzy.set_color(color);
        assert_eq!(fuzzy.hair_material().color, color);
        assert_eq!(fuzzy.base_material().color, color);
        assert_eq!(fuzzy.hair_uniforms().color, color.to_array());
        assert_eq!(fuzzy.base_uniforms().color, color.to_array());
    }

    #[test]
    fn hopping_up_bends_hair_down() {
        let config = FuzzyConfig::builder().fuzz(0.0).gravity(0.0).build().unwrap();
        let mut fuzzy = seeded(config);
        let tip_before = fuzzy.bent_hair(4).into_iter().map(|p| p.y).fold(f32::MIN, f32::max);

        fuzzy.set_position(Vec3::new(0.0, 3.0, 0.0));
        fuzzy.update();
        let tip_after = fuzzy.bent_hair(4).into_iter().map(|p| p.y).fold(f32::MIN, f32::max);

        assert!(tip_after < tip_before);
    }

    #[test]
    fn transform_follows_state_and_parent() {
        let mut fuzzy = seeded(FuzzyConfig::default());
        fuzzy.set_parent(Transform::from_position(Vec3::new(0.0, -8.0, 0.0)));
        fuzzy.place(Vec3::new(0.0, 13.0, 0.0));
        fuzzy.set_rotation_axis(Vec3::X);
        fuzzy.set_rotation_angle(0.5);
        fuzzy.update();

        let transform = fuzzy.transform();
        assert!((transform.position - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-6);
        assert!(transform.rotation.abs_diff_eq(glam::Quat::from_rotation_x(0.5), 1e-6));
    }
}
