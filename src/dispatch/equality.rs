//! Storage state-of-charge continuity.

use super::decision::DecisionSet;
use super::layout::VariableLayout;
use crate::config::VppConfig;
use crate::error::Result;

/// Number of continuity residuals: `Nbat · (T - 1)`.
pub fn equality_count(layout: &VariableLayout, config: &VppConfig) -> usize {
    config.n_storage() * (layout.horizon() - 1)
}

/// Evaluates SoC continuity for candidate `x`.
///
/// Entry order is outer over `t = 1..T`, inner over storage unit. Step 0
/// has no predecessor and carries no residual.
///
/// # Errors
///
/// Returns `Config` for an invalid plant and `Shape` for a vector of the
/// wrong length.
pub fn equality_residuals(x: &[f64], config: &VppConfig) -> Result<Vec<f64>> {
    config.ensure_valid()?;
    let layout = VariableLayout::new(config)?;
    let decision = layout.decompose(x)?;
    Ok(soc_continuity(&decision, config))
}

/// `soc[i,t] - soc[i,t-1] - p_chg[i,t]·η_chg[i] + p_dch[i,t]/η_dch[i]`
pub(crate) fn soc_continuity(d: &DecisionSet, config: &VppConfig) -> Vec<f64> {
    let horizon = d.soc.ncols();
    let mut residuals = Vec::with_capacity(config.n_storage() * horizon.saturating_sub(1));
    for t in 1..horizon {
        for (i, unit) in config.storage.iter().enumerate() {
            residuals.push(
                d.soc[[i, t]] - d.soc[[i, t - 1]] - d.p_chg[[i, t]] * unit.eta_charge
                    + d.p_dch[[i, t]] / unit.eta_discharge,
            );
        }
    }
    residuals
}
