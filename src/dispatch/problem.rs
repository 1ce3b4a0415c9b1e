//! Optimizer-facing binding of a validated plant, its profiles, and its band.

use tracing::debug;

use super::bounds::{self, Bounds};
use super::decision::DecisionSet;
use super::equality::{self, equality_count};
use super::inequality::{self, inequality_count};
use super::layout::VariableLayout;
use super::objective::{self, ProfitBreakdown};
use crate::config::VppConfig;
use crate::error::{DispatchError, Result};
use crate::profiles::{LoadBand, Profiles};

/// The interface an external optimizer programs against.
///
/// `objective` is minimized; equality residuals should be zero and
/// inequality residuals non-positive.
pub trait Problem: Send + Sync {
    /// Length of the decision vector.
    fn n_var(&self) -> usize;

    /// Number of equality residuals.
    fn n_eq(&self) -> usize;

    /// Number of inequality residuals.
    fn n_ieq(&self) -> usize;

    /// Bounds of every decision variable.
    fn bounds(&self) -> &Bounds;

    /// Objective, equality residuals, and inequality residuals of `x`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Shape` if `x` has the wrong length.
    fn evaluate(&self, x: &[f64]) -> Result<Evaluation>;
}

/// Result of evaluating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub profit: f64,
    /// Value to minimize: `-profit`.
    pub objective: f64,
    pub equality: Vec<f64>,
    pub inequality: Vec<f64>,
}

impl Evaluation {
    /// Largest absolute equality residual, or 0 if there are none.
    pub fn max_equality_violation(&self) -> f64 {
        self.equality.iter().fold(0.0, |acc, r| acc.max(r.abs()))
    }

    /// Largest positive inequality residual, or 0 if all are satisfied.
    pub fn max_inequality_violation(&self) -> f64 {
        self.inequality.iter().fold(0.0, |acc, &r| acc.max(r))
    }

    /// Whether every residual is within `tolerance`.
    pub fn is_feasible(&self, tolerance: f64) -> bool {
        self.max_equality_violation() <= tolerance && self.max_inequality_violation() <= tolerance
    }
}

/// A plant bound to its exogenous data, validated once.
///
/// Holds no mutable state, so distinct candidates can be evaluated from
/// several threads at once.
#[derive(Debug, Clone)]
pub struct DispatchProblem {
    config: VppConfig,
    profiles: Profiles,
    band: LoadBand,
    layout: VariableLayout,
    bounds: Bounds,
}

impl DispatchProblem {
    /// Validates inputs and precomputes the layout and bounds.
    ///
    /// # Errors
    ///
    /// Returns `Config` for an invalid plant, `Dimension` for profiles or a
    /// band that disagree with it, and `Bounds` for an inverted bound.
    pub fn new(config: VppConfig, profiles: Profiles, band: LoadBand) -> Result<Self> {
        config.ensure_valid()?;
        profiles.check_dimensions(&config)?;
        band.check_dimensions(&config)?;
        let layout = VariableLayout::new(&config)?;
        let bounds = bounds::build(&layout, &config, &band)?;
        debug!(
            horizon = layout.horizon(),
            n_var = layout.len(),
            n_continuous = layout.n_continuous(),
            n_binary = layout.n_binary(),
            n_eq = equality_count(&layout, &config),
            n_ieq = inequality_count(&layout, &config),
            "dispatch problem ready"
        );
        Ok(Self {
            config,
            profiles,
            band,
            layout,
            bounds,
        })
    }

    pub fn config(&self) -> &VppConfig {
        &self.config
    }

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    pub fn band(&self) -> &LoadBand {
        &self.band
    }

    pub fn layout(&self) -> &VariableLayout {
        &self.layout
    }

    /// Decodes `x` against this problem's layout.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Shape` if `x` has the wrong length.
    pub fn decompose(&self, x: &[f64]) -> Result<DecisionSet> {
        self.layout.decompose(x)
    }

    /// Profit of `x`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Shape` if `x` has the wrong length.
    pub fn profit(&self, x: &[f64]) -> Result<f64> {
        self.breakdown(x).map(|b| b.profit())
    }

    /// Negated profit of `x`, the value an optimizer minimizes.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Shape` if `x` has the wrong length.
    pub fn objective(&self, x: &[f64]) -> Result<f64> {
        self.profit(x).map(|p| -p)
    }

    /// Every profit term of `x`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Shape` if `x` has the wrong length.
    pub fn breakdown(&self, x: &[f64]) -> Result<ProfitBreakdown> {
        let d = self.decompose(x)?;
        Ok(objective::breakdown(&d, &self.config, &self.profiles))
    }

    /// SoC continuity residuals of `x`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Shape` if `x` has the wrong length.
    pub fn equality(&self, x: &[f64]) -> Result<Vec<f64>> {
        let d = self.decompose(x)?;
        Ok(equality::soc_continuity(&d, &self.config))
    }

    /// Inequality residuals of `x`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Shape` if `x` has the wrong length.
    pub fn inequality(&self, x: &[f64]) -> Result<Vec<f64>> {
        let d = self.decompose(x)?;
        Ok(inequality::residuals(&d, &self.config, &self.band))
    }

    /// Evaluates an already decoded decision set.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Dimension` if `d` was shaped for another plant.
    pub fn evaluate_decision(&self, d: &DecisionSet) -> Result<Evaluation> {
        d.check_shape(&self.layout)?;
        let profit = objective::breakdown(d, &self.config, &self.profiles).profit();
        Ok(Evaluation {
            profit,
            objective: -profit,
            equality: equality::soc_continuity(d, &self.config),
            inequality: inequality::residuals(d, &self.config, &self.band),
        })
    }

    /// Checks that `eval` has one residual per constraint of this problem.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Dimension` for a residual vector of the wrong
    /// length.
    pub fn check_evaluation(&self, eval: &Evaluation) -> Result<()> {
        check_len("equality residuals", eval.equality.len(), self.n_eq())?;
        check_len("inequality residuals", eval.inequality.len(), self.n_ieq())
    }
}

impl Problem for DispatchProblem {
    fn n_var(&self) -> usize {
        self.layout.len()
    }

    fn n_eq(&self) -> usize {
        equality_count(&self.layout, &self.config)
    }

    fn n_ieq(&self) -> usize {
        inequality_count(&self.layout, &self.config)
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn evaluate(&self, x: &[f64]) -> Result<Evaluation> {
        let d = self.decompose(x)?;
        self.evaluate_decision(&d)
    }
}

fn check_len(what: &'static str, actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(DispatchError::Dimension {
            what,
            expected: (1, expected),
            actual: (1, actual),
        })
    }
}
