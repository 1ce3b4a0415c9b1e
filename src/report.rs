//! Per-step power balance, profit terms, and constraint violations of one
//! decoded candidate.

use std::fmt;

use ndarray::Array2;

use crate::dispatch::inequality::block_ranges;
use crate::dispatch::objective::breakdown;
use crate::dispatch::{DecisionSet, DispatchProblem, Evaluation, ProfitBreakdown};
use crate::error::Result;

/// Residual magnitude below which a constraint counts as satisfied.
pub const VIOLATION_TOLERANCE: f64 = 1e-6;

/// Power balance at one step.
///
/// Gated quantities (`biomass`, `dispatchable_load`, `charge`, `discharge`)
/// are power times on/off state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepBalance {
    pub t: usize,
    pub solar: f64,
    pub wind: f64,
    pub biomass: f64,
    pub fixed_load: f64,
    pub dispatchable_load: f64,
    pub charge: f64,
    pub discharge: f64,
    /// Net power as billed: both storage directions subtracted.
    pub settlement_net: f64,
    /// Net power as it flows: discharge injected, charge withdrawn.
    pub physical_net: f64,
    pub export: f64,
    pub import: f64,
}

/// Violations attributed to one constraint block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockViolation {
    pub block: &'static str,
    /// Residuals outside tolerance.
    pub count: usize,
    /// Largest violation in the block, 0 if none.
    pub max: f64,
}

/// Violations of SoC continuity and of each inequality block.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationSummary {
    pub blocks: Vec<BlockViolation>,
}

impl ViolationSummary {
    /// Attributes the residuals of `eval` to their blocks.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Dimension` if `eval` does not have one
    /// residual per constraint of `problem`.
    pub fn new(problem: &DispatchProblem, eval: &Evaluation, tolerance: f64) -> Result<Self> {
        problem.check_evaluation(eval)?;
        let mut blocks = Vec::with_capacity(10);
        blocks.push(summarize(
            "soc_continuity",
            eval.equality.iter().map(|r| r.abs()),
            tolerance,
        ));
        for (block, range) in block_ranges(problem.layout(), problem.config()) {
            blocks.push(summarize(
                block.name(),
                eval.inequality[range].iter().copied(),
                tolerance,
            ));
        }
        Ok(Self { blocks })
    }

    /// Total number of violated residuals.
    pub fn total(&self) -> usize {
        self.blocks.iter().map(|b| b.count).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// The block with the largest violation, if any.
    pub fn worst(&self) -> Option<&BlockViolation> {
        self.blocks
            .iter()
            .filter(|b| b.count > 0)
            .max_by(|a, b| a.max.total_cmp(&b.max))
    }
}

fn summarize(
    block: &'static str,
    violations: impl Iterator<Item = f64>,
    tolerance: f64,
) -> BlockViolation {
    let mut count = 0;
    let mut max = 0.0_f64;
    for v in violations {
        if v > tolerance {
            count += 1;
        }
        max = max.max(v);
    }
    BlockViolation { block, count, max }
}

impl fmt::Display for ViolationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Violations ---")?;
        for b in &self.blocks {
            writeln!(f, "{:<22} {:>4}  max {:.6}", b.block, b.count, b.max)?;
        }
        write!(f, "Total violated:        {}", self.total())
    }
}

/// Everything a reader needs to judge one candidate.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub steps: Vec<StepBalance>,
    pub profit: ProfitBreakdown,
    pub evaluation: Evaluation,
    pub violations: ViolationSummary,
}

impl DispatchReport {
    /// Builds the report for a decision set decoded against `problem`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Dimension` if `decision` was shaped for
    /// another plant.
    pub fn new(problem: &DispatchProblem, decision: &DecisionSet) -> Result<Self> {
        let d = decision;
        let evaluation = problem.evaluate_decision(d)?;
        let violations = ViolationSummary::new(problem, &evaluation, VIOLATION_TOLERANCE)?;
        let profiles = problem.profiles();
        let steps = (0..problem.layout().horizon())
            .map(|t| {
                let gated = |p: &Array2<f64>, u: &Array2<f64>| {
                    (&p.column(t) * &u.column(t)).sum()
                };
                let solar = profiles.solar.column(t).sum();
                let wind = profiles.wind.column(t).sum();
                let biomass = gated(&d.p_bm, &d.u_bm);
                let fixed_load = profiles.fixed_load.column(t).sum();
                let dispatchable_load = gated(&d.p_dl, &d.u_dl);
                let charge = gated(&d.p_chg, &d.u_chg);
                let discharge = gated(&d.p_dch, &d.u_dch);
                let supply = solar + wind + biomass - fixed_load - dispatchable_load;
                let settlement_net = supply - charge - discharge;
                StepBalance {
                    t,
                    solar,
                    wind,
                    biomass,
                    fixed_load,
                    dispatchable_load,
                    charge,
                    discharge,
                    settlement_net,
                    physical_net: supply - charge + discharge,
                    export: settlement_net.max(0.0),
                    import: (-settlement_net).max(0.0),
                }
            })
            .collect();

        Ok(Self {
            steps,
            profit: breakdown(d, problem.config(), profiles),
            evaluation,
            violations,
        })
    }

    /// Energy exported over the horizon under the settlement convention.
    pub fn total_export(&self) -> f64 {
        self.steps.iter().map(|s| s.export).sum()
    }

    pub fn total_import(&self) -> f64 {
        self.steps.iter().map(|s| s.import).sum()
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Dispatch Report ---")?;
        for s in &self.steps {
            writeln!(
                f,
                "t={:>3} | pv={:.3} wt={:.3} bm={:.3} | load={:.3} dl={:.3} | \
                 chg={:.3} dch={:.3} | net={:>7.3} (phys {:>7.3})",
                s.t,
                s.solar,
                s.wind,
                s.biomass,
                s.fixed_load,
                s.dispatchable_load,
                s.charge,
                s.discharge,
                s.settlement_net,
                s.physical_net,
            )?;
        }
        writeln!(f, "Total export:          {:.4} pu", self.total_export())?;
        writeln!(f, "Total import:          {:.4} pu", self.total_import())?;
        writeln!(f, "{}", self.profit)?;
        write!(f, "{}", self.violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VppConfig;
    use crate::dispatch::{Block, VariableLayout};
    use crate::error::DispatchError;
    use crate::profiles::{LoadBand, Profiles};
    use ndarray::array;

    fn problem() -> DispatchProblem {
        let cfg = VppConfig::minimal();
        let mut profiles = Profiles::zeros(&cfg);
        profiles.fixed_load = array![[1.0, 1.0]];
        profiles.solar = array![[0.5, 0.0]];
        let band = LoadBand {
            min: array![[0.0, 0.0]],
            max: array![[1.0, 1.0]],
        };
        DispatchProblem::new(cfg, profiles, band).unwrap()
    }

    #[test]
    fn discharge_shown_in_both_conventions() {
        let p = problem();
        let layout = p.layout().clone();
        let mut x = vec![0.0; layout.len()];
        x[layout.index(Block::DischargePower, 0, 0)] = 0.25;
        x[layout.index(Block::DischargeState, 0, 0)] = 1.0;
        let report = DispatchReport::new(&p, &p.decompose(&x).unwrap()).unwrap();
        let s = report.steps[0];
        assert!((s.settlement_net + 0.75).abs() < 1e-12);
        assert!((s.physical_net + 0.25).abs() < 1e-12);
        assert!((s.import - 0.75).abs() < 1e-12);
        assert_eq!(s.export, 0.0);
        assert_eq!(report.profit.profit(), report.evaluation.profit);
    }

    #[test]
    fn exclusion_violation_is_attributed() {
        let p = problem();
        let layout = p.layout().clone();
        let mut x = vec![0.0; layout.len()];
        x[layout.index(Block::ChargeState, 0, 1)] = 1.0;
        x[layout.index(Block::DischargeState, 0, 1)] = 1.0;
        let report = DispatchReport::new(&p, &p.decompose(&x).unwrap()).unwrap();
        let worst = report.violations.worst().unwrap();
        assert_eq!(worst.block, "storage_exclusion");
        assert_eq!(worst.count, 1);
        assert_eq!(worst.max, 1.0);
        assert_eq!(report.violations.total(), 1);
    }

    #[test]
    fn clean_candidate_has_no_violations() {
        let p = problem();
        let x = vec![0.0; p.layout().len()];
        let report = DispatchReport::new(&p, &p.decompose(&x).unwrap()).unwrap();
        assert!(report.violations.is_clean());
        assert!(report.violations.worst().is_none());
        assert_eq!(report.violations.blocks.len(), 10);
        let text = report.to_string();
        assert!(text.contains("--- Dispatch Report ---"));
        assert!(text.contains("storage_exclusion"));
    }

    #[test]
    fn decision_for_another_plant_is_an_error() {
        let p = problem();
        let baseline = VariableLayout::new(&VppConfig::baseline()).unwrap();
        let err = DispatchReport::new(&p, &DecisionSet::zeros(&baseline)).unwrap_err();
        assert!(matches!(err, DispatchError::Dimension { what: "p_bm", .. }));
    }

    #[test]
    fn summary_rejects_foreign_residuals() {
        let p = problem();
        let eval = Evaluation {
            profit: 0.0,
            objective: 0.0,
            equality: vec![0.0; 30],
            inequality: vec![0.0; 4],
        };
        let err = ViolationSummary::new(&p, &eval, VIOLATION_TOLERANCE).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Dimension {
                what: "equality residuals",
                expected: (1, 1),
                actual: (1, 30)
            }
        ));
    }
}
