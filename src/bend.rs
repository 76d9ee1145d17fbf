//! Per-vertex hair bending.
//!
//! Every hair starts as the upright prefab (root at the origin, tip at
//! `y = hair_length`). [`evaluate`] bends one prefab vertex toward the hair's
//! base direction plus the forces acting on it, then moves it to the hair's
//! root. The function is pure, so the CPU version here and the WGSL version in
//! `shaders/fur.wgsl` compute the same thing.
//!
//! Both bend modes aim the hair at
//!
//! ```text
//! to(f) = normalize(base_direction + total_force * f)
//! ```
//!
//! where `f` is a height fraction in `[0, 1]`, so the root follows the base
//! direction and the tip leans furthest into the force.
//!
//! - [`BendMode::Shortcut`] rotates the whole vertex by the rotation at the
//!   vertex's own height.
//! - [`BendMode::Recursive`] builds the hair's spine from segments of height
//!   `hair_length / hair_height_segments`. A segment ending at height `b` is
//!   rotated by the rotation at `b / hair_length`; the last, partial segment
//!   ends at the vertex height. The vertex's radial offset is rotated by the
//!   rotation at its own height and added on top.
//!
//! With a single height segment both modes produce the same position.

use glam::{Quat, Vec3};

use crate::config::{BendMode, FuzzyConfig};
use crate::generator::HairInstance;

/// Below this, `dot(from, to) + 1` is treated as zero (antiparallel vectors).
const ANTIPARALLEL_EPSILON: f32 = 0.00001;

/// Amplitude of the settle wobble applied to the global force.
const SETTLE_AMPLITUDE: f32 = 0.05;

/// The minimal rotation taking unit vector `from` onto unit vector `to`.
///
/// When the vectors are (nearly) opposite the cross product is useless, so a
/// half turn about an axis perpendicular to `from` is returned instead.
///
/// ```
/// use fuzzy_mesh::bend::quat_from_unit_vectors;
/// use glam::Vec3;
///
/// let q = quat_from_unit_vectors(Vec3::Y, Vec3::X);
/// assert!((q * Vec3::Y - Vec3::X).length() < 1e-6);
/// ```
pub fn quat_from_unit_vectors(from: Vec3, to: Vec3) -> Quat {
    let mut r = from.dot(to) + 1.0;

    let v = if r < ANTIPARALLEL_EPSILON {
        r = 0.0;
        if from.x.abs() > from.z.abs() {
            Vec3::new(-from.y, from.x, 0.0)
        } else {
            Vec3::new(0.0, -from.z, from.y)
        }
    } else {
        from.cross(to)
    };

    Quat::from_xyzw(v.x, v.y, v.z, r).normalize()
}

/// Per-frame values driving the bend, produced by
/// [`SimulationState::bend_inputs`](crate::SimulationState::bend_inputs).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BendInputs {
    /// Movement force plus gravity, in the mesh's local frame.
    pub global_force: Vec3,
    /// Magnitude of the force caused by rotation.
    pub centrifugal_force: f32,
    /// Unit, non-negative direction the centrifugal force pushes along.
    pub centrifugal_direction: Vec3,
    /// Phase of the settle wobble.
    pub settle_time: f32,
    /// Strength of the settle wobble, in `[0, 1]`.
    pub settle_scale: f32,
}

impl BendInputs {
    /// Inputs for a mesh that has never moved: gravity only.
    pub fn at_rest(gravity: f32) -> Self {
        Self {
            global_force: Vec3::new(0.0, -gravity, 0.0),
            centrifugal_force: 0.0,
            centrifugal_direction: Vec3::new(1.0, 0.0, 1.0).normalize(),
            settle_time: 0.0,
            settle_scale: 1.0,
        }
    }
}

/// The force bending `hair`, before height scaling.
pub fn total_force(hair: &HairInstance, inputs: &BendInputs) -> Vec3 {
    let wobble = (inputs.settle_time + hair.settle_offset).sin();
    let mut force = inputs.global_force * (1.0 - wobble * SETTLE_AMPLITUDE * inputs.settle_scale);
    force += hair.hair_position * inputs.centrifugal_direction * inputs.centrifugal_force;
    force * hair.force_factor
}

/// Bends prefab vertex `local` of `hair` and returns its position in the
/// mesh's local frame.
pub fn evaluate(local: Vec3, hair: &HairInstance, inputs: &BendInputs, config: &FuzzyConfig) -> Vec3 {
    let force = total_force(hair, inputs);
    let inverse_length = 1.0 / config.hair_length;
    let rotation_at = |height: f32| {
        let to = (hair.base_direction + force * (height * inverse_length))
            .normalize_or(hair.base_direction);
        quat_from_unit_vectors(Vec3::Y, to)
    };

    let bent = match config.bend_mode {
        BendMode::Shortcut => rotation_at(local.y) * local,
        BendMode::Recursive => {
            let mut position = rotation_at(local.y) * Vec3::new(local.x, 0.0, local.z);

            let segments = config.hair_height_segments;
            let step = config.segment_step();
            for k in 0..segments {
                let start = k as f32 * step;
                if local.y <= start {
                    break;
                }
                let end = if k + 1 == segments {
                    local.y
                } else {
                    ((k + 1) as f32 * step).min(local.y)
                };
                position += rotation_at(end) * Vec3::new(0.0, end - start, 0.0);
            }
            position
        }
    };

    bent + hair.hair_position
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hair(direction: Vec3) -> HairInstance {
        HairInstance {
            force_factor: 1.0,
            settle_offset: 0.3,
            hair_position: Vec3::new(0.5, 1.0, -0.25),
            base_direction: direction,
        }
    }

    fn config(mode: BendMode, segments: u32) -> FuzzyConfig {
        FuzzyConfig::builder()
            .bend_mode(mode)
            .hair_length(2.0)
            .hair_height_segments(segments)
            .build()
            .unwrap()
    }

    fn windy() -> BendInputs {
        BendInputs {
            global_force: Vec3::new(0.8, -1.0, 0.3),
            centrifugal_force: 0.6,
            centrifugal_direction: Vec3::new(1.0, 0.0, 1.0).normalize(),
            settle_time: 1.7,
            settle_scale: 0.4,
        }
    }

    #[test]
    fn rotation_maps_from_onto_to() {
        let pairs = [
            (Vec3::Y, Vec3::new(1.0, 1.0, 0.0).normalize()),
            (Vec3::Y, Vec3::new(-0.3, 0.2, 0.9).normalize()),
            (Vec3::X, Vec3::Z),
        ];
        for (from, to) in pairs {
            let q = quat_from_unit_vectors(from, to);
            assert!((q * from - to).length() < 1e-5);
            assert!((q.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn antiparallel_vectors_give_half_turn() {
        for from in [Vec3::Y, Vec3::X, Vec3::new(0.0, 0.6, -0.8)] {
            let q = quat_from_unit_vectors(from, -from);
            assert!(q.is_finite());
            assert!((q * from + from).length() < 1e-5);
        }
    }

    #[test]
    fn same_vector_is_identity() {
        let q = quat_from_unit_vectors(Vec3::Y, Vec3::Y);
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn settle_wobble_scales_global_force() {
        let hair = HairInstance {
            hair_position: Vec3::ZERO,
            ..hair(Vec3::Y)
        };
        let inputs = BendInputs {
            settle_time: std::f32::consts::FRAC_PI_2 - hair.settle_offset,
            settle_scale: 1.0,
            ..BendInputs::at_rest(2.0)
        };
        let force = total_force(&hair, &inputs);
        assert!((force.y - (-2.0 * 0.95)).abs() < 1e-5);
    }

    #[test]
    fn centrifugal_term_uses_hair_position() {
        let hair = HairInstance {
            force_factor: 2.0,
            ..hair(Vec3::Y)
        };
        let inputs = BendInputs {
            global_force: Vec3::ZERO,
            centrifugal_force: 3.0,
            centrifugal_direction: Vec3::X,
            settle_time: 0.0,
            settle_scale: 0.0,
        };
        let force = total_force(&hair, &inputs);
        assert!((force - Vec3::new(0.5 * 3.0 * 2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn modes_agree_with_one_segment() {
        let hair = hair(Vec3::new(0.2, 0.9, 0.1).normalize());
        let inputs = windy();
        let shortcut = config(BendMode::Shortcut, 1);
        let recursive = config(BendMode::Recursive, 1);
        for local in [
            Vec3::new(0.1, 0.0, 0.0),
            Vec3::new(0.05, 0.7, -0.05),
            Vec3::new(0.0, 2.0, 0.0),
        ] {
            let a = evaluate(local, &hair, &inputs, &shortcut);
            let b = evaluate(local, &hair, &inputs, &recursive);
            assert!((a - b).length() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn no_force_leaves_upright_hair_alone() {
        let hair = HairInstance {
            settle_offset: 0.0,
            ..hair(Vec3::Y)
        };
        let inputs = BendInputs::at_rest(0.0);
        for mode in [BendMode::Shortcut, BendMode::Recursive] {
            let config = config(mode, 8);
            for local in [
                Vec3::new(0.1, 0.0, 0.0),
                Vec3::new(0.03, 0.9, 0.02),
                Vec3::new(0.0, 2.0, 0.0),
            ] {
                let out = evaluate(local, &hair, &inputs, &config);
                assert!((out - (local + hair.hair_position)).length() < 1e-5);
            }
        }
    }

    #[test]
    fn gravity_pulls_sideways_hair_down() {
        let hair = hair(Vec3::X);
        let inputs = BendInputs::at_rest(1.0);
        let tip = Vec3::new(0.0, 2.0, 0.0);
        for mode in [BendMode::Shortcut, BendMode::Recursive] {
            let out = evaluate(tip, &hair, &inputs, &config(mode, 16)) - hair.hair_position;
            assert!(out.y < 0.0);
            assert!(out.x > 0.0);
        }
    }

    #[test]
    fn recursive_spine_is_no_longer_than_the_hair() {
        let hair = hair(Vec3::Z);
        let tip = Vec3::new(0.0, 2.0, 0.0);
        let inputs = windy();

        let shortcut = evaluate(tip, &hair, &inputs, &config(BendMode::Shortcut, 16));
        assert!(((shortcut - hair.hair_position).length() - 2.0).abs() < 1e-5);

        let recursive = evaluate(tip, &hair, &inputs, &config(BendMode::Recursive, 16));
        assert!((recursive - hair.hair_position).length() <= 2.0 + 1e-5);
    }

    #[test]
    fn degenerate_target_falls_back_to_base_direction() {
        // Force exactly cancels the base direction at the tip.
        let hair = HairInstance {
            hair_position: Vec3::ZERO,
            ..hair(Vec3::Y)
        };
        let inputs = BendInputs {
            settle_scale: 0.0,
            ..BendInputs::at_rest(1.0)
        };
        let out = evaluate(Vec3::new(0.0, 2.0, 0.0), &hair, &inputs, &config(BendMode::Shortcut, 4));
        assert!(out.is_finite());
        assert!((out - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    }
}
