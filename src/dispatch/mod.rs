//! Decision-vector codec and constraint/objective evaluation.

/// Variable bounds.
pub mod bounds;
/// Decoding into per-asset matrices.
pub mod decision;
/// SoC continuity residuals.
pub mod equality;
pub mod inequality;
/// Offset arena for the flat decision vector.
pub mod layout;
pub mod objective;
pub mod problem;

// Re-export the main types for convenience
pub use bounds::{Bounds, bounds};
pub use decision::{DecisionSet, decompose};
pub use equality::{equality_count, equality_residuals};
pub use inequality::{InequalityBlock, inequality_count, inequality_residuals};
pub use layout::{Block, VariableLayout, VariableRef};
pub use objective::{ProfitBreakdown, profit, profit_breakdown, settlement_net_power};
pub use problem::{DispatchProblem, Evaluation, Problem};
