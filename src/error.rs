//! Error taxonomy for the evaluation layer.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised eagerly by the codec, bounds generator, and evaluators.
///
/// Infeasible candidates are never an error: they show up as nonzero
/// constraint residuals.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Decision vector length does not match the configured layout.
    #[error("decision vector has length {actual}, expected {expected}")]
    Shape { expected: usize, actual: usize },

    /// Configuration is missing a field or has inconsistent values.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A lower bound exceeds its upper bound.
    #[error("bounds inverted at index {index} ({variable}): lower {lower} > upper {upper}")]
    Bounds {
        index: usize,
        variable: String,
        lower: f64,
        upper: f64,
    },

    /// An exogenous profile or load band disagrees with the configured dimensions.
    #[error("{what} has shape {actual:?}, expected {expected:?}")]
    Dimension {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, DispatchError>;
