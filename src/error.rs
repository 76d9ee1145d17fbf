//! Errors raised while building a fuzzy mesh.

use thiserror::Error;

/// Errors produced when validating a configuration or generating hair geometry.
///
/// Both kinds are detected once, at construction time. Per-frame operations
/// never fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FuzzyError {
    /// A numeric range or count in the configuration is out of bounds.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// The base shape lacks usable anchor, direction, or topology data.
    #[error("invalid base shape: {0}")]
    InvalidBaseShape(String),
}
