//! Offset arena for the flat decision vector.
//!
//! The vector holds nine blocks in a fixed order: five continuous blocks
//! (`p_bm`, `p_chg`, `p_dch`, `soc`, `p_dl`) followed by four binary blocks
//! (`u_bm`, `u_chg`, `u_dch`, `u_dl`). A block for `n` assets spans
//! `n * horizon` entries, and within a block flat index `t * n + i` holds
//! the value for asset `i` at step `t`.

use std::fmt;

use ndarray::Array2;

use crate::config::{ConfigError, VppConfig};
use crate::error::{DispatchError, Result};

/// One of the nine decision blocks, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    BiomassPower,
    ChargePower,
    DischargePower,
    StateOfCharge,
    DispatchableLoad,
    BiomassState,
    ChargeState,
    DischargeState,
    DispatchableState,
}

impl Block {
    /// All blocks in the order they appear in the decision vector.
    pub const ALL: [Block; 9] = [
        Block::BiomassPower,
        Block::ChargePower,
        Block::DischargePower,
        Block::StateOfCharge,
        Block::DispatchableLoad,
        Block::BiomassState,
        Block::ChargeState,
        Block::DischargeState,
        Block::DispatchableState,
    ];

    /// Short variable name used in reports and exports.
    pub fn name(self) -> &'static str {
        match self {
            Block::BiomassPower => "p_bm",
            Block::ChargePower => "p_chg",
            Block::DischargePower => "p_dch",
            Block::StateOfCharge => "soc",
            Block::DispatchableLoad => "p_dl",
            Block::BiomassState => "u_bm",
            Block::ChargeState => "u_chg",
            Block::DischargeState => "u_dch",
            Block::DispatchableState => "u_dl",
        }
    }

    /// Whether the block holds on/off states thresholded at 0.5.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Block::BiomassState
                | Block::ChargeState
                | Block::DischargeState
                | Block::DispatchableState
        )
    }

    fn position(self) -> usize {
        self as usize
    }
}

/// Location and width of one block inside the flat vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub block: Block,
    /// Flat index of the block's first entry.
    pub offset: usize,
    /// Number of assets (matrix rows) in the block.
    pub assets: usize,
}

/// A single decision variable identified by block, asset, and step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableRef {
    pub block: Block,
    pub asset: usize,
    pub t: usize,
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}, t={}]", self.block.name(), self.asset, self.t)
    }
}

/// Offsets and strides of every block, derived once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLayout {
    horizon: usize,
    spans: [BlockSpan; 9],
    n_continuous: usize,
    n_binary: usize,
}

impl VariableLayout {
    /// Computes the layout for a plant.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the horizon is zero.
    pub fn new(config: &VppConfig) -> std::result::Result<Self, ConfigError> {
        if config.horizon == 0 {
            return Err(ConfigError::new("horizon", "must be > 0"));
        }
        let horizon = config.horizon;
        let assets_of = |block: Block| match block {
            Block::BiomassPower | Block::BiomassState => config.n_biomass(),
            Block::ChargePower
            | Block::DischargePower
            | Block::StateOfCharge
            | Block::ChargeState
            | Block::DischargeState => config.n_storage(),
            Block::DispatchableLoad | Block::DispatchableState => config.dispatchable_loads,
        };

        let mut offset = 0;
        let spans = Block::ALL.map(|block| {
            let span = BlockSpan {
                block,
                offset,
                assets: assets_of(block),
            };
            offset += span.assets * horizon;
            span
        });

        let n_continuous = spans
            .iter()
            .filter(|s| !s.block.is_binary())
            .map(|s| s.assets * horizon)
            .sum();
        let n_binary = offset - n_continuous;

        Ok(Self {
            horizon,
            spans,
            n_continuous,
            n_binary,
        })
    }

    /// Number of time steps.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of continuous variables (`Nr`).
    pub fn n_continuous(&self) -> usize {
        self.n_continuous
    }

    /// Number of binary-coded variables (`Ni`).
    pub fn n_binary(&self) -> usize {
        self.n_binary
    }

    /// Total decision vector length (`Nr + Ni`).
    pub fn len(&self) -> usize {
        self.n_continuous + self.n_binary
    }

    /// True if the plant has no dispatchable assets at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Span of a block.
    pub fn span(&self, block: Block) -> BlockSpan {
        self.spans[block.position()]
    }

    /// All spans in vector order.
    pub fn spans(&self) -> &[BlockSpan] {
        &self.spans
    }

    /// Flat index of `block[asset, t]`.
    pub fn index(&self, block: Block, asset: usize, t: usize) -> usize {
        let span = self.span(block);
        debug_assert!(asset < span.assets && t < self.horizon);
        span.offset + t * span.assets + asset
    }

    /// Identifies the variable stored at flat index `k`.
    pub fn describe(&self, k: usize) -> Option<VariableRef> {
        self.spans.iter().find_map(|span| {
            let width = span.assets * self.horizon;
            if k >= span.offset && k < span.offset + width {
                let local = k - span.offset;
                Some(VariableRef {
                    block: span.block,
                    asset: local % span.assets,
                    t: local / span.assets,
                })
            } else {
                None
            }
        })
    }

    /// Fails with `ShapeError` unless `x` has exactly `Nr + Ni` entries.
    pub fn check_len(&self, x: &[f64]) -> Result<()> {
        if x.len() == self.len() {
            Ok(())
        } else {
            Err(DispatchError::Shape {
                expected: self.len(),
                actual: x.len(),
            })
        }
    }

    /// Reshapes one block of `x` into an `(assets, horizon)` matrix.
    ///
    /// The caller must have checked the length of `x`.
    pub(crate) fn extract(&self, x: &[f64], block: Block) -> Array2<f64> {
        let span = self.span(block);
        let n = span.assets;
        let raw = &x[span.offset..span.offset + n * self.horizon];
        Array2::from_shape_fn((n, self.horizon), |(i, t)| raw[t * n + i])
    }
}
