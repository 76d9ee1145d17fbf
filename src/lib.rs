//! # Fuzzy Mesh
//!
//! **Procedural hair and fur on any mesh, moved by gravity, motion and spin.**
//!
//! Every vertex of a base mesh grows one hair. Each hair is a copy of a small
//! cone or cylinder, drawn instanced and bent in the vertex shader by forces
//! derived from how the mesh moves: move it and the hair trails behind, spin it
//! and the hair flies outward, stop it and the hair wobbles back into place.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fuzzy_mesh::*;
//!
//! fn main() -> Result<(), AppError> {
//!     run_with_config(AppConfig::new().title("Fuzzy"), |ctx| {
//!         let mut ball = primitives::sphere(2.0, 24, 16);
//!         ball.weld(1e-4);
//!
//!         let config = FuzzyConfig::builder().hair_length(2.0).gravity(1.0).build()?;
//!         let ball = ctx.scene.spawn(FuzzyMesh::new(ball, config)?);
//!
//!         Ok(move |frame: &mut Frame| {
//!             if let Some(fuzzy) = frame.scene.fuzzy_mut(ball) {
//!                 fuzzy.set_position(Vec3::new(0.0, (frame.time * 3.0).sin() * 4.0, 0.0));
//!             }
//!         })
//!     })
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`FuzzyConfig`]: hair shape and force response, validated once
//! - [`generate`]: per-hair attributes for a [`BaseShape`], reproducible from a seed
//! - [`SimulationState`]: turns position and angle changes into forces, once per tick
//! - [`bend`]: the per-vertex bend, on the CPU and mirrored in `shaders/fur.wgsl`
//! - [`FuzzyMesh`]: geometry, hair, material and state of one furry object
//! - [`FuzzyScene`] and [`FurPass`]: ticking and drawing many of them
//!
//! Everything up to [`FuzzyMesh`] runs without a GPU.

mod app;
pub mod bend;
mod camera;
mod config;
mod error;
mod fur_pass;
mod fuzzy_mesh;
mod generator;
mod geometry;
mod gpu;
mod instanced;
mod material;
mod mesh;
pub mod primitives;
mod scene;
mod state;
pub mod tween;

pub use app::{AppConfig, AppError, Frame, SetupContext, run, run_with_config};
pub use bend::BendInputs;
pub use camera::{Camera, OrbitCamera, OrbitMode};
pub use config::{BendMode, FuzzyConfig, FuzzyConfigBuilder};
pub use error::FuzzyError;
pub use fur_pass::{DEPTH_FORMAT, FrameUniforms, FurPass, FuzzyGpu, Lighting};
pub use fuzzy_mesh::{FuzzyMesh, FuzzyMeshBuilder};
pub use generator::{
    BaseShape, FuzzyGeometry, HairInstance, HairPrefab, NormalMode, generate, random_axis,
};
pub use geometry::{GeometryError, GeometryLoader, RawGeometry};
pub use gpu::{GpuContext, GpuError};
pub use instanced::{InstanceAttribute, InstancedGeometry};
pub use material::{Color, HairDefines, HairUniforms, InstanceRaw, MaterialParams};
pub use mesh::{Mesh, Transform, Vertex3d};
pub use scene::{FuzzyId, FuzzyScene, GroupId};
pub use state::SimulationState;

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
