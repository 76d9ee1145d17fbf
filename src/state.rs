//! Per-mesh physical state.
//!
//! Hair reacts to how its mesh moves, not to a velocity the caller supplies.
//! The setters record the new position or angle next to the previous one, and
//! [`SimulationState::update`] turns the difference into forces. Call it once
//! per tick: skipping a tick or updating twice skews the derived speeds.
//!
//! ```
//! use fuzzy_mesh::{FuzzyConfig, SimulationState};
//! use glam::Vec3;
//!
//! let config = FuzzyConfig::default();
//! let mut state = SimulationState::new(&config);
//!
//! state.set_position(Vec3::new(0.0, 2.0, 0.0));
//! state.update(&config);
//!
//! // Moving up leaves the hair trailing down.
//! assert!(state.movement_force.y < 0.0);
//! ```

use std::f32::consts::TAU;

use glam::{Quat, Vec3};

use crate::bend::{BendInputs, quat_from_unit_vectors};
use crate::config::FuzzyConfig;

/// Amount `settle_time` advances per tick.
const SETTLE_TICK: f32 = 0.1;

/// How strongly fresh motion re-excites the settle wobble.
const SETTLE_GAIN: f32 = 0.1;

/// Motion history and accumulated forces of one fuzzy mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    /// World position set by the last [`set_position`](Self::set_position).
    pub position: Vec3,
    pub previous_position: Vec3,
    /// `previous_position - position` at the last update.
    pub position_delta: Vec3,
    /// Decaying sum of scaled position deltas.
    pub movement_force: Vec3,
    /// Movement force plus gravity, rotated into the mesh's local frame.
    pub global_force: Vec3,
    /// Rotation angle about `rotation_axis`, in radians.
    pub angle: f32,
    pub previous_angle: f32,
    /// Decaying sum of scaled rotation speeds.
    pub centrifugal_force: f32,
    pub settle_time: f32,
    /// Strength of the settle wobble, never above 1.
    pub settle_scale: f32,
    /// Unit axis the mesh spins about.
    pub rotation_axis: Vec3,
    /// Unit vector with non-negative components derived from `rotation_axis`.
    pub centrifugal_direction: Vec3,
    /// Orientation from `rotation_axis` and `angle`, refreshed by `update`.
    pub orientation: Quat,
}

impl SimulationState {
    /// A mesh at the origin, unrotated, with gravity already applied.
    pub fn new(config: &FuzzyConfig) -> Self {
        Self {
            position: Vec3::ZERO,
            previous_position: Vec3::ZERO,
            position_delta: Vec3::ZERO,
            movement_force: Vec3::ZERO,
            global_force: Vec3::new(0.0, -config.gravity, 0.0),
            angle: 0.0,
            previous_angle: 0.0,
            centrifugal_force: 0.0,
            settle_time: 0.0,
            settle_scale: 1.0,
            rotation_axis: Vec3::Y,
            centrifugal_direction: Vec3::new(1.0, 0.0, 1.0).normalize(),
            orientation: Quat::IDENTITY,
        }
    }

    /// Moves the mesh, remembering where it was.
    pub fn set_position(&mut self, position: Vec3) {
        self.previous_position = self.position;
        self.position = position;
    }

    /// Moves the mesh without the move registering as motion.
    pub fn place(&mut self, position: Vec3) {
        self.previous_position = position;
        self.position = position;
    }

    /// Sets the rotation angle about the current axis, remembering the old one.
    pub fn set_rotation_angle(&mut self, angle: f32) {
        self.previous_angle = self.angle;
        self.angle = angle;
    }

    /// Switches the spin axis and resets the angle to zero.
    ///
    /// The centrifugal direction is `(1, 0, 1)` carried along by the rotation
    /// from `+Y` to `axis`, normalized and made non-negative. A zero `axis`
    /// keeps the current one.
    pub fn set_rotation_axis(&mut self, axis: Vec3) {
        self.set_rotation_angle(0.0);

        let axis = axis.normalize_or(self.rotation_axis);
        let q = quat_from_unit_vectors(Vec3::Y, axis);
        self.centrifugal_direction = (q * Vec3::new(1.0, 0.0, 1.0)).normalize().abs();
        self.rotation_axis = axis;
    }

    /// Advances the simulation by one tick.
    pub fn update(&mut self, config: &FuzzyConfig) {
        self.position_delta = self.previous_position - self.position;
        self.movement_force =
            self.movement_force * config.movement_decay + self.position_delta * config.movement_force_factor;
        let world_force = self.movement_force + Vec3::new(0.0, -config.gravity, 0.0);
        self.previous_position = self.position;

        let rotation_speed = (self.previous_angle - self.angle).abs() % TAU;
        self.centrifugal_force =
            self.centrifugal_force * config.centrifugal_decay + rotation_speed * config.centrifugal_force_factor;
        self.previous_angle = self.angle;

        // Uses last tick's orientation; the one set below applies from the next tick.
        self.global_force = self.orientation.conjugate() * world_force;
        self.orientation = Quat::from_axis_angle(self.rotation_axis, self.angle);

        self.settle_time += SETTLE_TICK;
        self.settle_scale = (self.settle_scale * config.settle_decay
            + (self.movement_force.length() + rotation_speed) * SETTLE_GAIN)
            .min(1.0);
    }

    /// The values the bend needs this tick.
    pub fn bend_inputs(&self) -> BendInputs {
        BendInputs {
            global_force: self.global_force,
            centrifugal_force: self.centrifugal_force,
            centrifugal_direction: self.centrifugal_direction,
            settle_time: self.settle_time,
            settle_scale: self.settle_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn starts_at_rest_under_gravity() {
        let config = FuzzyConfig::builder().gravity(2.5).build().unwrap();
        let state = SimulationState::new(&config);
        assert_eq!(state.bend_inputs(), BendInputs::at_rest(2.5));
    }

    #[test]
    fn moving_down_pushes_hair_up() {
        let config = FuzzyConfig::builder()
            .movement_force_factor(1.0)
            .movement_decay(0.0)
            .build()
            .unwrap();
        let mut state = SimulationState::new(&config);
        state.set_position(Vec3::new(0.0, -1.0, 0.0));
        state.update(&config);

        assert_eq!(state.position_delta, Vec3::new(0.0, 1.0, 0.0));
        assert!((state.movement_force.y - 1.0).abs() < 1e-6);
        assert!((state.global_force.y - (1.0 - config.gravity)).abs() < 1e-6);
        assert_eq!(state.previous_position, state.position);
    }

    #[test]
    fn placing_is_not_movement() {
        let config = FuzzyConfig::default();
        let mut state = SimulationState::new(&config);
        state.place(Vec3::new(0.0, 13.0, 0.0));
        state.update(&config);
        assert_eq!(state.movement_force, Vec3::ZERO);
    }

    #[test]
    fn standing_still_decays_movement() {
        let config = FuzzyConfig::default();
        let mut state = SimulationState::new(&config);
        state.set_position(Vec3::X);
        state.update(&config);
        let first = state.movement_force;
        state.update(&config);
        assert_eq!(state.position_delta, Vec3::ZERO);
        assert!((state.movement_force - first * config.movement_decay).length() < 1e-6);
    }

    #[test]
    fn spinning_builds_centrifugal_force() {
        let config = FuzzyConfig::builder().centrifugal_force_factor(2.0).build().unwrap();
        let mut state = SimulationState::new(&config);
        state.centrifugal_force = 0.5;

        state.set_rotation_axis(Vec3::X);
        state.set_rotation_angle(FRAC_PI_2);
        state.update(&config);

        let expected = 0.5 * config.centrifugal_decay + FRAC_PI_2 * 2.0;
        assert!((state.centrifugal_force - expected).abs() < 1e-5);
        assert_eq!(state.previous_angle, FRAC_PI_2);
    }

    #[test]
    fn rotation_speed_wraps_full_turns() {
        let config = FuzzyConfig::builder().centrifugal_decay(0.0).build().unwrap();
        let mut state = SimulationState::new(&config);
        state.set_rotation_angle(TAU + 0.25);
        state.update(&config);
        assert!((state.centrifugal_force - 0.25).abs() < 1e-5);
    }

    #[test]
    fn centrifugal_direction_is_unit_and_non_negative() {
        let config = FuzzyConfig::default();
        let mut state = SimulationState::new(&config);
        for axis in [
            Vec3::X,
            Vec3::NEG_Y,
            Vec3::new(-0.3, 0.4, -0.8),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::Z,
        ] {
            state.set_rotation_axis(axis);
            let d = state.centrifugal_direction;
            assert!((d.length() - 1.0).abs() < 1e-5);
            assert!(d.min_element() >= 0.0);
            assert!((state.rotation_axis - axis.normalize()).length() < 1e-6);
        }
    }

    #[test]
    fn axis_change_resets_angle() {
        let config = FuzzyConfig::default();
        let mut state = SimulationState::new(&config);
        state.set_rotation_angle(1.2);
        state.set_rotation_axis(Vec3::Z);
        assert_eq!(state.angle, 0.0);
        assert_eq!(state.previous_angle, 1.2);
    }

    #[test]
    fn settle_scale_stays_in_unit_range() {
        let config = FuzzyConfig::default();
        let mut state = SimulationState::new(&config);
        for tick in 0..200 {
            let t = tick as f32 * 0.3;
            state.set_position(Vec3::new(t.sin() * 5.0, (t * 1.7).cos() * 3.0, 0.0));
            state.set_rotation_angle(t * 2.0);
            state.update(&config);
            assert!(state.settle_scale <= 1.0);
            assert!(state.settle_scale >= 0.0);
        }
        for _ in 0..200 {
            state.update(&config);
        }
        assert!(state.settle_scale < 0.1);
    }

    #[test]
    fn global_force_is_expressed_in_local_frame() {
        let config = FuzzyConfig::builder().gravity(1.0).build().unwrap();
        let mut state = SimulationState::new(&config);
        state.set_rotation_axis(Vec3::Z);
        state.set_rotation_angle(FRAC_PI_2);
        // First tick still uses the identity orientation.
        state.update(&config);
        assert!((state.global_force - Vec3::NEG_Y).length() < 1e-5);
        // A quarter turn about Z makes world down point along local -X.
        state.update(&config);
        let expected = Quat::from_rotation_z(FRAC_PI_2).conjugate() * Vec3::NEG_Y;
        assert!((state.global_force - expected).length() < 1e-5);
        assert!((state.global_force - Vec3::NEG_X).length() < 1e-5);
    }
}
