//! Hair configuration.
//!
//! [`FuzzyConfig`] is an immutable value describing the hair shape and how it
//! reacts to forces. Build one with [`FuzzyConfig::builder`], which fills in
//! defaults for anything you don't set and validates the result:
//!
//! ```
//! use fuzzy_mesh::{BendMode, FuzzyConfig};
//!
//! let config = FuzzyConfig::builder()
//!     .hair_length(2.0)
//!     .hair_radial_segments(4)
//!     .gravity(2.0)
//!     .force_factor(0.5, 0.75)
//!     .bend_mode(BendMode::Shortcut)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.hair_length, 2.0);
//! ```
//!
//! # Decay ordering
//!
//! `settle_decay` should be higher than both `movement_decay` and
//! `centrifugal_decay`, otherwise the hair settles before the forces driving it
//! have died down. This is not enforced; the builder logs a warning instead.

use crate::error::FuzzyError;

/// How the bend transform turns forces into hair curvature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BendMode {
    /// One rotation for the whole hair, chosen by the vertex height.
    ///
    /// Cheap, but long hairs look like rigid sticks.
    Shortcut,
    /// A chain of independently rotated segments, one per height step.
    ///
    /// Costs a loop per vertex and gives soft, natural curvature.
    #[default]
    Recursive,
}

impl BendMode {
    /// Index used by the GPU uniform block (`0` shortcut, `1` recursive).
    pub fn as_index(self) -> u32 {
        match self {
            BendMode::Shortcut => 0,
            BendMode::Recursive => 1,
        }
    }
}

/// Immutable per-mesh hair parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FuzzyConfig {
    /// Bend algorithm used per vertex.
    pub bend_mode: BendMode,
    /// Length of a single hair.
    pub hair_length: f32,
    /// Number of sides around a hair.
    pub hair_radial_segments: u32,
    /// Number of rings along a hair; also the segment count of the recursive bend.
    pub hair_height_segments: u32,
    /// Radius at the tip. Zero makes pointy (cone) hairs.
    pub hair_radius_top: f32,
    /// Radius at the root.
    pub hair_radius_base: f32,
    /// Lower bound of the random per-hair force multiplier.
    pub min_force_factor: f32,
    /// Upper bound of the random per-hair force multiplier.
    pub max_force_factor: f32,
    /// Amount of random jitter applied to each hair's base direction.
    pub fuzz: f32,
    /// Downward pull applied to every hair.
    pub gravity: f32,
    /// Scale applied to rotation speed when accumulating centrifugal force.
    pub centrifugal_force_factor: f32,
    /// Per-tick decay of the centrifugal force.
    pub centrifugal_decay: f32,
    /// Scale applied to position deltas when accumulating movement force.
    pub movement_force_factor: f32,
    /// Per-tick decay of the movement force.
    pub movement_decay: f32,
    /// Per-tick decay of the settle wobble.
    pub settle_decay: f32,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            bend_mode: BendMode::Recursive,
            hair_length: 1.0,
            hair_radial_segments: 3,
            hair_height_segments: 16,
            hair_radius_top: 0.0,
            hair_radius_base: 0.1,
            min_force_factor: 1.0,
            max_force_factor: 1.0,
            fuzz: 0.25,
            gravity: 1.0,
            centrifugal_force_factor: 1.0,
            centrifugal_decay: 0.8,
            movement_force_factor: 0.75,
            movement_decay: 0.7,
            settle_decay: 0.97,
        }
    }
}

impl FuzzyConfig {
    /// Starts a builder seeded with the default values.
    pub fn builder() -> FuzzyConfigBuilder {
        FuzzyConfigBuilder::default()
    }

    /// Height of one segment of the recursive bend.
    pub fn segment_step(&self) -> f32 {
        self.hair_length / self.hair_height_segments as f32
    }

    /// True when hairs come to a point.
    pub fn is_pointy(&self) -> bool {
        self.hair_radius_top == 0.0
    }

    /// Checks ranges and counts.
    ///
    /// Called by [`FuzzyConfigBuilder::build`] and again by the generator, so
    /// a config edited through its public fields is still checked before use.
    pub fn validate(&self) -> Result<(), FuzzyError> {
        if !self.hair_length.is_finite() || self.hair_length <= 0.0 {
            return Err(FuzzyError::InvalidConfig(format!(
                "hair_length must be a positive number, got {}",
                self.hair_length
            )));
        }
        if self.hair_radial_segments < 1 {
            return Err(FuzzyError::InvalidConfig(
                "hair_radial_segments must be at least 1".to_string(),
            ));
        }
        if self.hair_height_segments < 1 {
            return Err(FuzzyError::InvalidConfig(
                "hair_height_segments must be at least 1".to_string(),
            ));
        }
        if !self.min_force_factor.is_finite() || !self.max_force_factor.is_finite() {
            return Err(FuzzyError::InvalidConfig(
                "force factors must be finite".to_string(),
            ));
        }
        if self.min_force_factor > self.max_force_factor {
            return Err(FuzzyError::InvalidConfig(format!(
                "min_force_factor ({}) exceeds max_force_factor ({})",
                self.min_force_factor, self.max_force_factor
            )));
        }
        if self.hair_radius_top < 0.0 || self.hair_radius_base < 0.0 {
            return Err(FuzzyError::InvalidConfig(format!(
                "hair radii must not be negative (top {}, base {})",
                self.hair_radius_top, self.hair_radius_base
            )));
        }
        Ok(())
    }

    fn warn_on_decay_order(&self) {
        if self.settle_decay <= self.movement_decay || self.settle_decay <= self.centrifugal_decay {
            log::warn!(
                "settle_decay ({}) should exceed movement_decay ({}) and centrifugal_decay ({})",
                self.settle_decay,
                self.movement_decay,
                self.centrifugal_decay
            );
        }
    }
}

/// Fluent builder for [`FuzzyConfig`].
///
/// Every setter is optional. [`build`](Self::build) validates the result.
#[derive(Clone, Debug, Default)]
pub struct FuzzyConfigBuilder {
    config: FuzzyConfig,
}

impl FuzzyConfigBuilder {
    pub fn bend_mode(mut self, mode: BendMode) -> Self {
        self.config.bend_mode = mode;
        self
    }

    pub fn hair_length(mut self, length: f32) -> Self {
        self.config.hair_length = length;
        self
    }

    pub fn hair_radial_segments(mut self, segments: u32) -> Self {
        self.config.hair_radial_segments = segments;
        self
    }

    pub fn hair_height_segments(mut self, segments: u32) -> Self {
        self.config.hair_height_segments = segments;
        self
    }

    pub fn hair_radius_top(mut self, radius: f32) -> Self {
        self.config.hair_radius_top = radius;
        self
    }

    pub fn hair_radius_base(mut self, radius: f32) -> Self {
        self.config.hair_radius_base = radius;
        self
    }

    /// Sets both bounds of the random per-hair force multiplier.
    pub fn force_factor(mut self, min: f32, max: f32) -> Self {
        self.config.min_force_factor = min;
        self.config.max_force_factor = max;
        self
    }

    pub fn fuzz(mut self, fuzz: f32) -> Self {
        self.config.fuzz = fuzz;
        self
    }

    pub fn gravity(mut self, gravity: f32) -> Self {
        self.config.gravity = gravity;
        self
    }

    pub fn centrifugal_force_factor(mut self, factor: f32) -> Self {
        self.config.centrifugal_force_factor = factor;
        self
    }

    pub fn centrifugal_decay(mut self, decay: f32) -> Self {
        self.config.centrifugal_decay = decay;
        self
    }

    pub fn movement_force_factor(mut self, factor: f32) -> Self {
        self.config.movement_force_factor = factor;
        self
    }

    pub fn movement_decay(mut self, decay: f32) -> Self {
        self.config.movement_decay = decay;
        self
    }

    pub fn settle_decay(mut self, decay: f32) -> Self {
        self.config.settle_decay = decay;
        self
    }

    /// Validates and returns the finished configuration.
    pub fn build(self) -> Result<FuzzyConfig, FuzzyError> {
        self.config.validate()?;
        self.config.warn_on_decay_order();
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = FuzzyConfig::builder().build().unwrap();
        assert_eq!(config, FuzzyConfig::default());
        assert_eq!(config.bend_mode, BendMode::Recursive);
        assert!(config.is_pointy());
    }

    #[test]
    fn segment_step_divides_length() {
        let config = FuzzyConfig::builder()
            .hair_length(2.0)
            .hair_height_segments(8)
            .build()
            .unwrap();
        assert!((config.segment_step() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_positive_length() {
        for length in [0.0, -1.0, f32::NAN] {
            let err = FuzzyConfig::builder().hair_length(length).build().unwrap_err();
            assert!(matches!(err, FuzzyError::InvalidConfig(_)));
        }
    }

    #[test]
    fn rejects_zero_segments() {
        let radial = FuzzyConfig::builder().hair_radial_segments(0).build();
        let height = FuzzyConfig::builder().hair_height_segments(0).build();
        assert!(matches!(radial, Err(FuzzyError::InvalidConfig(_))));
        assert!(matches!(height, Err(FuzzyError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_inverted_force_range() {
        let err = FuzzyConfig::builder().force_factor(2.0, 1.0).build();
        assert!(matches!(err, Err(FuzzyError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_negative_radius() {
        let err = FuzzyConfig::builder().hair_radius_base(-0.1).build();
        assert!(matches!(err, Err(FuzzyError::InvalidConfig(_))));
    }

    #[test]
    fn bad_decay_order_still_builds() {
        let config = FuzzyConfig::builder().settle_decay(0.5).build();
        assert!(config.is_ok());
    }

    #[test]
    fn bend_mode_indices() {
        assert_eq!(BendMode::Shortcut.as_index(), 0);
        assert_eq!(BendMode::Recursive.as_index(), 1);
    }
}
