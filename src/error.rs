//! Error types for layout configuration and computation.
//!
//! Only configuration problems and malformed input are errors. Problems with
//! individual records (a link pointing at a missing node, a node that went
//! non-finite) are reported as [`Diagnostic`](crate::Diagnostic)s and
//! never abort a layout.

use thiserror::Error;

/// Invalid configuration, rejected before any tick runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("iteration count must not be negative, got {0}")]
    NegativeIterations(i64),

    #[error("distanceMin must be a finite, non-negative number, got {0}")]
    InvalidDistanceMin(f64),

    #[error("distanceMax ({max}) must not be smaller than distanceMin ({min})")]
    InvertedDistanceRange { min: f64, max: f64 },

    #[error("center must be finite, got ({0}, {1})")]
    NonFiniteCenter(f64, f64),

    #[error("link distance must be a finite, non-negative number, got {0}")]
    InvalidLinkDistance(f64),

    #[error("link distance field path must not be empty")]
    EmptyFieldPath,

    #[error("link strength must be finite, got {0}")]
    InvalidLinkStrength(f64),

    #[error("repulsivity must be finite, got {0}")]
    InvalidRepulsivity(f64),

    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("time step must be finite and positive, got {0}")]
    InvalidTimeStep(f64),
}

/// The main error type for layout operations.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Input(String),
}

impl From<serde_json::Error> for LayoutError {
    fn from(error: serde_json::Error) -> Self {
        Self::Input(error.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for LayoutError {
    fn from(error: serde_wasm_bindgen::Error) -> Self {
        Self::Input(error.to_string())
    }
}
