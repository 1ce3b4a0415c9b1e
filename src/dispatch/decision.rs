//! Decomposition of a flat decision vector into per-asset matrices.

use ndarray::Array2;

use super::layout::{Block, VariableLayout};
use crate::config::VppConfig;
use crate::error::{DispatchError, Result};

/// Threshold above which a raw state value reads as "on".
pub const STATE_THRESHOLD: f64 = 0.5;

/// Maps a raw state value to 0.0 or 1.0.
pub fn binarize(raw: f64) -> f64 {
    if raw > STATE_THRESHOLD { 1.0 } else { 0.0 }
}

/// The nine `(assets × horizon)` matrices decoded from one candidate.
///
/// Built fresh on every call and owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionSet {
    /// Biomass power.
    pub p_bm: Array2<f64>,
    /// Storage charge power.
    pub p_chg: Array2<f64>,
    /// Storage discharge power.
    pub p_dch: Array2<f64>,
    /// Storage state of charge.
    pub soc: Array2<f64>,
    /// Dispatchable load power.
    pub p_dl: Array2<f64>,
    /// Biomass on/off state.
    pub u_bm: Array2<f64>,
    /// Storage charging state.
    pub u_chg: Array2<f64>,
    /// Storage discharging state.
    pub u_dch: Array2<f64>,
    /// Dispatchable load on/off state.
    pub u_dl: Array2<f64>,
}

impl DecisionSet {
    /// An all-zero decision set shaped for `layout`.
    pub fn zeros(layout: &VariableLayout) -> Self {
        let shape = |block: Block| (layout.span(block).assets, layout.horizon());
        Self {
            p_bm: Array2::zeros(shape(Block::BiomassPower)),
            p_chg: Array2::zeros(shape(Block::ChargePower)),
            p_dch: Array2::zeros(shape(Block::DischargePower)),
            soc: Array2::zeros(shape(Block::StateOfCharge)),
            p_dl: Array2::zeros(shape(Block::DispatchableLoad)),
            u_bm: Array2::zeros(shape(Block::BiomassState)),
            u_chg: Array2::zeros(shape(Block::ChargeState)),
            u_dch: Array2::zeros(shape(Block::DischargeState)),
            u_dl: Array2::zeros(shape(Block::DispatchableState)),
        }
    }

    /// The matrix holding `block`.
    pub fn matrix(&self, block: Block) -> &Array2<f64> {
        match block {
            Block::BiomassPower => &self.p_bm,
            Block::ChargePower => &self.p_chg,
            Block::DischargePower => &self.p_dch,
            Block::StateOfCharge => &self.soc,
            Block::DispatchableLoad => &self.p_dl,
            Block::BiomassState => &self.u_bm,
            Block::ChargeState => &self.u_chg,
            Block::DischargeState => &self.u_dch,
            Block::DispatchableState => &self.u_dl,
        }
    }

    /// Checks every matrix against `(assets, horizon)` of `layout`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Dimension` naming the first mismatching block.
    pub fn check_shape(&self, layout: &VariableLayout) -> Result<()> {
        for span in layout.spans() {
            let expected = (span.assets, layout.horizon());
            let actual = self.matrix(span.block).dim();
            if actual != expected {
                return Err(DispatchError::Dimension {
                    what: span.block.name(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Flattens back into the vector layout.
    ///
    /// Continuous blocks reproduce the decoded vector exactly; state blocks
    /// come out as their thresholded 0/1 values.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Dimension` if the set was shaped for another
    /// layout.
    pub fn to_vector(&self, layout: &VariableLayout) -> Result<Vec<f64>> {
        self.check_shape(layout)?;
        let mut x = Vec::with_capacity(layout.len());
        for span in layout.spans() {
            let m = self.matrix(span.block);
            for t in 0..layout.horizon() {
                for i in 0..span.assets {
                    x.push(m[[i, t]]);
                }
            }
        }
        Ok(x)
    }
}

impl VariableLayout {
    /// Decodes `x` into its nine matrices.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Shape` if `x` does not have exactly `Nr + Ni`
    /// entries.
    pub fn decompose(&self, x: &[f64]) -> Result<DecisionSet> {
        self.check_len(x)?;
        let states = |block| self.extract(x, block).mapv_into(binarize);
        Ok(DecisionSet {
            p_bm: self.extract(x, Block::BiomassPower),
            p_chg: self.extract(x, Block::ChargePower),
            p_dch: self.extract(x, Block::DischargePower),
            soc: self.extract(x, Block::StateOfCharge),
            p_dl: self.extract(x, Block::DispatchableLoad),
            u_bm: states(Block::BiomassState),
            u_chg: states(Block::ChargeState),
            u_dch: states(Block::DischargeState),
            u_dl: states(Block::DispatchableState),
        })
    }
}

/// Decodes `x` against `config`.
///
/// # Errors
///
/// Returns `DispatchError::Config` for an invalid configuration and
/// `DispatchError::Shape` for a vector of the wrong length.
pub fn decompose(x: &[f64], config: &VppConfig) -> Result<DecisionSet> {
    config.ensure_valid()?;
    let layout = VariableLayout::new(config)?;
    layout.decompose(x)
}
