//! Capacity, ramp, mutual-exclusion, and band constraints.
//!
//! A residual `<= 0` is satisfied. Blocks are concatenated in the order of
//! [`InequalityBlock::ALL`], and every block is ordered outer over time,
//! inner over asset.

use std::ops::Range;

use super::decision::DecisionSet;
use super::layout::VariableLayout;
use crate::config::VppConfig;
use crate::error::Result;
use crate::profiles::LoadBand;

/// One sub-block of the inequality residual vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InequalityBlock {
    BiomassMin,
    BiomassMax,
    BiomassRampUp,
    BiomassRampDown,
    ChargeCapacity,
    DischargeCapacity,
    StorageExclusion,
    LoadMin,
    LoadMax,
}

impl InequalityBlock {
    /// Concatenation order.
    pub const ALL: [InequalityBlock; 9] = [
        InequalityBlock::BiomassMin,
        InequalityBlock::BiomassMax,
        InequalityBlock::BiomassRampUp,
        InequalityBlock::BiomassRampDown,
        InequalityBlock::ChargeCapacity,
        InequalityBlock::DischargeCapacity,
        InequalityBlock::StorageExclusion,
        InequalityBlock::LoadMin,
        InequalityBlock::LoadMax,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InequalityBlock::BiomassMin => "biomass_min",
            InequalityBlock::BiomassMax => "biomass_max",
            InequalityBlock::BiomassRampUp => "biomass_ramp_up",
            InequalityBlock::BiomassRampDown => "biomass_ramp_down",
            InequalityBlock::ChargeCapacity => "charge_capacity",
            InequalityBlock::DischargeCapacity => "discharge_capacity",
            InequalityBlock::StorageExclusion => "storage_exclusion",
            InequalityBlock::LoadMin => "load_min",
            InequalityBlock::LoadMax => "load_max",
        }
    }

    /// Number of residuals in this block.
    pub fn len(self, layout: &VariableLayout, config: &VppConfig) -> usize {
        let t = layout.horizon();
        match self {
            InequalityBlock::BiomassMin | InequalityBlock::BiomassMax => config.n_biomass() * t,
            InequalityBlock::BiomassRampUp | InequalityBlock::BiomassRampDown => {
                config.n_biomass() * (t - 1)
            }
            InequalityBlock::ChargeCapacity
            | InequalityBlock::DischargeCapacity
            | InequalityBlock::StorageExclusion => config.n_storage() * t,
            InequalityBlock::LoadMin | InequalityBlock::LoadMax => config.dispatchable_loads * t,
        }
    }
}

/// Position of each block inside the concatenated residual vector.
pub fn block_ranges(
    layout: &VariableLayout,
    config: &VppConfig,
) -> Vec<(InequalityBlock, Range<usize>)> {
    let mut start = 0;
    InequalityBlock::ALL
        .iter()
        .map(|&block| {
            let end = start + block.len(layout, config);
            let range = start..end;
            start = end;
            (block, range)
        })
        .collect()
}

/// Total number of inequality residuals.
pub fn inequality_count(layout: &VariableLayout, config: &VppConfig) -> usize {
    InequalityBlock::ALL
        .iter()
        .map(|b| b.len(layout, config))
        .sum()
}

/// Evaluates every inequality constraint for candidate `x`.
///
/// # Errors
///
/// Returns `Config` for an invalid plant, `Dimension` for a band of the
/// wrong shape, and `Shape` for a vector of the wrong length.
pub fn inequality_residuals(x: &[f64], config: &VppConfig, band: &LoadBand) -> Result<Vec<f64>> {
    config.ensure_valid()?;
    band.check_dimensions(config)?;
    let layout = VariableLayout::new(config)?;
    let decision = layout.decompose(x)?;
    Ok(residuals(&decision, config, band))
}

pub(crate) fn residuals(d: &DecisionSet, config: &VppConfig, band: &LoadBand) -> Vec<f64> {
    let horizon = d.p_bm.ncols();
    let mut out = Vec::new();

    // biomass
    for t in 0..horizon {
        for (i, unit) in config.biomass.iter().enumerate() {
            out.push(unit.p_min * d.u_bm[[i, t]] - d.p_bm[[i, t]]);
        }
    }
    for t in 0..horizon {
        for (i, unit) in config.biomass.iter().enumerate() {
            out.push(d.p_bm[[i, t]] - unit.p_max * d.u_bm[[i, t]]);
        }
    }
    for t in 1..horizon {
        for (i, unit) in config.biomass.iter().enumerate() {
            out.push(d.p_bm[[i, t]] - d.p_bm[[i, t - 1]] - unit.ramp_up);
        }
    }
    for t in 1..horizon {
        for (i, unit) in config.biomass.iter().enumerate() {
            out.push(d.p_bm[[i, t - 1]] - d.p_bm[[i, t]] - unit.ramp_down);
        }
    }

    // storage
    for t in 0..horizon {
        for (i, unit) in config.storage.iter().enumerate() {
            out.push(d.p_chg[[i, t]] - unit.p_max * d.u_chg[[i, t]]);
        }
    }
    for t in 0..horizon {
        for (i, unit) in config.storage.iter().enumerate() {
            out.push(d.p_dch[[i, t]] - unit.p_max * d.u_dch[[i, t]]);
        }
    }
    for t in 0..horizon {
        for i in 0..config.n_storage() {
            out.push(d.u_chg[[i, t]] + d.u_dch[[i, t]] - 1.0);
        }
    }

    // dispatchable loads
    for t in 0..horizon {
        for i in 0..config.dispatchable_loads {
            out.push(band.min[[i, t]] * d.u_dl[[i, t]] - d.p_dl[[i, t]]);
        }
    }
    for t in 0..horizon {
        for i in 0..config.dispatchable_loads {
            out.push(d.p_dl[[i, t]] - band.max[[i, t]] * d.u_dl[[i, t]]);
        }
    }

    out
}
