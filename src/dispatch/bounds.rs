//! Lower and upper bounds for every decision variable.

use super::layout::{Block, VariableLayout};
use crate::config::VppConfig;
use crate::error::{DispatchError, Result};
use crate::profiles::LoadBand;

/// Bound vectors in the flat decision-vector layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    /// Number of bounded variables.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Whether every entry of `x` lies within its bounds.
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.len()
            && x
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }
}

/// Builds bounds for `config` with the dispatchable-load `band`.
///
/// # Errors
///
/// Returns `Config` for an invalid plant, `Dimension` for a band of the
/// wrong shape, and `Bounds` if any lower bound exceeds its upper bound.
pub fn bounds(config: &VppConfig, band: &LoadBand) -> Result<Bounds> {
    config.ensure_valid()?;
    band.check_dimensions(config)?;
    let layout = VariableLayout::new(config)?;
    build(&layout, config, band)
}

/// Fills the bound vectors; state blocks keep the default `[0, 1]`.
pub(crate) fn build(layout: &VariableLayout, config: &VppConfig, band: &LoadBand) -> Result<Bounds> {
    let mut lower = vec![0.0; layout.len()];
    let mut upper = vec![1.0; layout.len()];

    for t in 0..layout.horizon() {
        for (i, unit) in config.biomass.iter().enumerate() {
            let k = layout.index(Block::BiomassPower, i, t);
            lower[k] = unit.p_min;
            upper[k] = unit.p_max;
        }
        for (i, unit) in config.storage.iter().enumerate() {
            for block in [Block::ChargePower, Block::DischargePower] {
                let k = layout.index(block, i, t);
                lower[k] = 0.0;
                upper[k] = unit.p_max;
            }
            let k = layout.index(Block::StateOfCharge, i, t);
            lower[k] = unit.soc_min;
            upper[k] = unit.soc_max;
        }
        for i in 0..config.dispatchable_loads {
            let k = layout.index(Block::DispatchableLoad, i, t);
            lower[k] = band.min[[i, t]];
            upper[k] = band.max[[i, t]];
        }
    }

    if let Some(index) = (0..lower.len()).find(|&k| !(lower[k] <= upper[k])) {
        let variable = layout
            .describe(index)
            .map_or_else(|| format!("x[{index}]"), |v| v.to_string());
        return Err(DispatchError::Bounds {
            index,
            variable,
            lower: lower[index],
            upper: upper[index],
        });
    }

    Ok(Bounds { lower, upper })
}
