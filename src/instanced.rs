//! Prefab instancing.
//!
//! An [`InstancedGeometry`] replicates one template shape (the prefab) a fixed
//! number of times and carries named per-instance data streams alongside it.
//! Each stream is defined once by a fill callback invoked per instance index:
//!
//! ```
//! use fuzzy_mesh::{primitives, InstancedGeometry};
//!
//! let prefab = primitives::cone(0.1, 1.0, 3, 4, true);
//! let mut geometry = InstancedGeometry::new(prefab, 3);
//!
//! geometry.define_instance_attribute("lift", 1, |data, i| data[0] = i as f32 * 0.5);
//!
//! let lift = geometry.attribute("lift").unwrap();
//! assert_eq!(lift.get(2), &[1.0]);
//! ```
//!
//! Streams are stored planar (one `Vec<f32>` per attribute).
//! [`InstancedGeometry::interleaved`] packs them into a single per-instance
//! record for vertex buffer upload.

use crate::geometry::RawGeometry;

/// One named per-instance data stream.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceAttribute {
    /// Name the stream is looked up by.
    pub name: String,
    /// Number of `f32` components per instance.
    pub components: usize,
    /// `components × instance_count` values, instance-major.
    pub data: Vec<f32>,
}

impl InstanceAttribute {
    /// Values of instance `index`.
    pub fn get(&self, index: usize) -> &[f32] {
        &self.data[index * self.components..(index + 1) * self.components]
    }
}

/// A prefab shape replicated `instance_count` times with per-instance streams.
#[derive(Clone, Debug)]
pub struct InstancedGeometry {
    prefab: RawGeometry,
    instance_count: usize,
    attributes: Vec<InstanceAttribute>,
}

impl InstancedGeometry {
    /// Creates an instanced geometry with no attributes yet.
    pub fn new(prefab: RawGeometry, instance_count: usize) -> Self {
        Self {
            prefab,
            instance_count,
            attributes: Vec::new(),
        }
    }

    /// The shared template shape.
    pub fn prefab(&self) -> &RawGeometry {
        &self.prefab
    }

    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Total vertex count if every instance were expanded.
    pub fn expanded_vertex_count(&self) -> usize {
        self.prefab.vertices.len() * self.instance_count
    }

    /// Defines (or replaces) the stream `name`.
    ///
    /// `fill` is called once per instance, in index order, with a zeroed slice
    /// of `components` values to write into.
    pub fn define_instance_attribute<F>(&mut self, name: &str, components: usize, mut fill: F)
    where
        F: FnMut(&mut [f32], usize),
    {
        let mut data = vec![0.0; components * self.instance_count];
        if components > 0 {
            for (i, chunk) in data.chunks_exact_mut(components).enumerate() {
                fill(chunk, i);
            }
        }

        let attribute = InstanceAttribute {
            name: name.to_string(),
            components,
            data,
        };

        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Looks up a stream by name.
    pub fn attribute(&self, name: &str) -> Option<&InstanceAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// All streams, in definition order.
    pub fn attributes(&self) -> &[InstanceAttribute] {
        &self.attributes
    }

    /// Components in one interleaved instance record.
    pub fn stride(&self) -> usize {
        self.attributes.iter().map(|a| a.components).sum()
    }

    /// Packs every stream into one record per instance, in definition order.
    pub fn interleaved(&self) -> Vec<f32> {
        let stride = self.stride();
        let mut out = Vec::with_capacity(stride * self.instance_count);
        for i in 0..self.instance_count {
            for attribute in &self.attributes {
                out.extend_from_slice(attribute.get(i));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    #[test]
    fn fill_sees_every_index_once() {
        let mut geometry = InstancedGeometry::new(primitives::cube(1.0), 4);
        let mut seen = Vec::new();
        geometry.define_instance_attribute("id", 1, |data, i| {
            seen.push(i);
            data[0] = i as f32;
        });
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(geometry.expanded_vertex_count(), 24 * 4);
    }

    #[test]
    fn redefining_replaces_stream() {
        let mut geometry = InstancedGeometry::new(primitives::cube(1.0), 2);
        geometry.define_instance_attribute("a", 1, |data, _| data[0] = 1.0);
        geometry.define_instance_attribute("a", 2, |data, _| data.fill(2.0));
        assert_eq!(geometry.attributes().len(), 1);
        assert_eq!(geometry.attribute("a").unwrap().get(1), &[2.0, 2.0]);
    }

    #[test]
    fn interleaves_in_definition_order() {
        let mut geometry = InstancedGeometry::new(primitives::cube(1.0), 2);
        geometry.define_instance_attribute("s", 1, |data, i| data[0] = i as f32);
        geometry.define_instance_attribute("v", 3, |data, i| {
            data.copy_from_slice(&[10.0 + i as f32, 20.0, 30.0])
        });
        assert_eq!(geometry.stride(), 4);
        assert_eq!(
            geometry.interleaved(),
            vec![0.0, 10.0, 20.0, 30.0, 1.0, 11.0, 20.0, 30.0]
        );
        assert!(geometry.attribute("missing").is_none());
    }
}
