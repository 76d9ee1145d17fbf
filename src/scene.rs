//! A world of fuzzy meshes.
//!
//! [`FuzzyScene`] stores fuzzy meshes as `hecs` entities and enforces the
//! per-tick contract: [`tick`](FuzzyScene::tick) updates every mesh exactly
//! once, after which [`prepare`](FuzzyScene::prepare) and
//! [`draw`](FuzzyScene::draw) render them. GPU resources are uploaded the
//! first time a mesh is prepared.
//!
//! Meshes can be grouped. A group carries a [`Transform`] applied on top of
//! each member's own position and rotation, like the body of a character
//! whose parts each wobble on their own.
//!
//! ```
//! use fuzzy_mesh::{primitives, FuzzyConfig, FuzzyMesh, FuzzyScene, Transform};
//! use glam::Vec3;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(5);
//! let mut scene = FuzzyScene::new();
//!
//! let body = scene.spawn_group(Transform::from_position(Vec3::new(0.0, -8.0, 0.0)));
//! let head = FuzzyMesh::with_rng(primitives::sphere(4.0, 12, 8), FuzzyConfig::default(), &mut rng).unwrap();
//! let head = scene.spawn_in_group(body, head);
//!
//! scene.fuzzy_mut(head).unwrap().set_position(Vec3::new(0.0, 13.0, 0.0));
//! scene.tick();
//! ```

use std::collections::HashMap;

use hecs::{Entity, World};

use crate::fuzzy_mesh::FuzzyMesh;
use crate::fur_pass::{FurPass, FuzzyGpu};
use crate::gpu::GpuContext;
use crate::mesh::Transform;

/// Handle to a fuzzy mesh in a [`FuzzyScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FuzzyId(Entity);

/// Handle to a group in a [`FuzzyScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(Entity);

/// Component on group entities.
struct GroupTransform(Transform);

/// Component linking a mesh to its group.
struct Member(Entity);

/// GPU resources, inserted by `prepare`.
struct GpuFuzzy(FuzzyGpu);

/// Fuzzy meshes and groups, ticked and drawn together.
#[derive(Default)]
pub struct FuzzyScene {
    world: World,
}

impl FuzzyScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mesh outside any group.
    pub fn spawn(&mut self, fuzzy: FuzzyMesh) -> FuzzyId {
        FuzzyId(self.world.spawn((fuzzy,)))
    }

    /// Adds an empty group placed at `transform`.
    pub fn spawn_group(&mut self, transform: Transform) -> GroupId {
        GroupId(self.world.spawn((GroupTransform(transform),)))
    }

    /// Adds a mesh whose transform is relative to `group`.
    pub fn spawn_in_group(&mut self, group: GroupId, fuzzy: FuzzyMesh) -> FuzzyId {
        FuzzyId(self.world.spawn((fuzzy, Member(group.0))))
    }

    /// Moves a group. Members follow on the next tick.
    ///
    /// Group motion does not count as mesh motion, so it does not stir the hair.
    pub fn set_group_transform(&mut self, group: GroupId, transform: Transform) {
        if let Ok(current) = self.world.query_one_mut::<&mut GroupTransform>(group.0) {
            current.0 = transform;
        }
    }

    pub fn group_transform(&self, group: GroupId) -> Option<Transform> {
        self.world.get::<&GroupTransform>(group.0).ok().map(|g| g.0)
    }

    pub fn fuzzy(&self, id: FuzzyId) -> Option<hecs::Ref<'_, FuzzyMesh>> {
        self.world.get::<&FuzzyMesh>(id.0).ok()
    }

    pub fn fuzzy_mut(&mut self, id: FuzzyId) -> Option<&mut FuzzyMesh> {
        self.world.query_one_mut::<&mut FuzzyMesh>(id.0).ok()
    }

    /// Removes a mesh and its GPU resources. Returns the mesh.
    pub fn despawn(&mut self, id: FuzzyId) -> Option<FuzzyMesh> {
        let fuzzy = self.world.remove_one::<FuzzyMesh>(id.0).ok();
        let _ = self.world.despawn(id.0);
        fuzzy
    }

    /// Number of fuzzy meshes.
    pub fn len(&self) -> usize {
        self.world.query::<&FuzzyMesh>().iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advances every mesh by one tick. Returns how many were updated.
    pub fn tick(&mut self) -> usize {
        let groups: HashMap<Entity, Transform> = self
            .world
            .query::<&GroupTransform>()
            .iter()
            .map(|(entity, group)| (entity, group.0))
            .collect();

        let mut updated = 0;
        for (_, (fuzzy, member)) in self.world.query_mut::<(&mut FuzzyMesh, Option<&Member>)>() {
            let parent = member
                .and_then(|m| groups.get(&m.0).copied())
                .unwrap_or_default();
            fuzzy.set_parent(parent);
            fuzzy.update();
            updated += 1;
        }
        updated
    }

    /// Uploads new meshes and writes this tick's uniforms. Call after [`tick`](Self::tick).
    pub fn prepare(&mut self, gpu: &GpuContext, pass: &FurPass) {
        let mut uploads = Vec::new();
        for (entity, (fuzzy, resources)) in self
            .world
            .query::<(&FuzzyMesh, Option<&GpuFuzzy>)>()
            .iter()
        {
            match resources {
                Some(resources) => pass.write(gpu, &resources.0, fuzzy),
                None => uploads.push((entity, pass.upload(gpu, fuzzy))),
            }
        }

        for (entity, resources) in uploads {
            if self.world.insert_one(entity, GpuFuzzy(resources)).is_err() {
                log::warn!("fuzzy mesh {entity:?} vanished during upload");
            }
        }
    }

    /// Records draws for every prepared mesh.
    pub fn draw(&self, pass: &FurPass, render_pass: &mut wgpu::RenderPass) {
        for (_, resources) in self.world.query::<&GpuFuzzy>().iter() {
            pass.draw(render_pass, &resources.0);
        }
    }
}
