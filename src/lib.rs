//! Constraint and profit evaluation for virtual power plant dispatch.
//!
//! A candidate dispatch is a flat vector of continuous powers and on/off
//! states. [`dispatch::DispatchProblem`] decodes it, evaluates the profit
//! objective and the equality/inequality residuals, and supplies variable
//! bounds to an external optimizer.

/// Plant configuration and presets.
pub mod config;
pub mod dispatch;
pub mod error;
pub mod io;
/// Exogenous profiles and the dispatchable-load band.
pub mod profiles;
pub mod report;
pub mod sampling;
pub mod scenario;
/// Biomass capacity envelope.
pub mod sizing;

pub use config::{ConfigError, VppConfig};
pub use error::{DispatchError, Result};
