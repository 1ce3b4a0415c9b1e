//! Operating profit of a dispatch candidate.
//!
//! Net power per step counts renewables and gated biomass as injections and
//! subtracts fixed load, gated dispatchable load, and gated storage power in
//! both directions. That last term follows the settlement model: discharge
//! is billed as storage throughput rather than injected. The report module
//! shows the physical balance next to it.

use std::fmt;

use super::decision::DecisionSet;
use super::layout::VariableLayout;
use crate::config::VppConfig;
use crate::error::Result;
use crate::profiles::Profiles;

/// Every revenue and cost term of the profit objective.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfitBreakdown {
    /// Export revenue at the settlement tariff.
    pub revenue: f64,
    /// Import cost at the distributor tariff.
    pub import_cost: f64,
    pub solar_cost: f64,
    pub wind_cost: f64,
    /// Linear biomass generation cost.
    pub biomass_cost: f64,
    /// Startup cost, charged on each off-to-on transition after step 0.
    pub startup_cost: f64,
    /// Dispatchable load compensation.
    pub curtailment_cost: f64,
    /// Storage throughput cost.
    pub storage_cost: f64,
}

impl ProfitBreakdown {
    /// Sum of all cost terms.
    pub fn expense(&self) -> f64 {
        self.import_cost
            + self.solar_cost
            + self.wind_cost
            + self.biomass_cost
            + self.startup_cost
            + self.curtailment_cost
            + self.storage_cost
    }

    /// Revenue minus expense.
    pub fn profit(&self) -> f64 {
        self.revenue - self.expense()
    }
}

impl fmt::Display for ProfitBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Profit ---")?;
        writeln!(f, "Revenue:               {:.4}", self.revenue)?;
        writeln!(f, "Import cost:           {:.4}", self.import_cost)?;
        writeln!(f, "Solar cost:            {:.4}", self.solar_cost)?;
        writeln!(f, "Wind cost:             {:.4}", self.wind_cost)?;
        writeln!(f, "Biomass cost:          {:.4}", self.biomass_cost)?;
        writeln!(f, "Startup cost:          {:.4}", self.startup_cost)?;
        writeln!(f, "Curtailment cost:      {:.4}", self.curtailment_cost)?;
        writeln!(f, "Storage cost:          {:.4}", self.storage_cost)?;
        write!(f, "Profit:                {:.4}", self.profit())
    }
}

/// Net power per step under the settlement convention.
pub fn settlement_net_power(d: &DecisionSet, profiles: &Profiles) -> Vec<f64> {
    let horizon = d.p_bm.ncols();
    (0..horizon)
        .map(|t| {
            let solar = profiles.solar.column(t).sum();
            let wind = profiles.wind.column(t).sum();
            let biomass = (&d.p_bm.column(t) * &d.u_bm.column(t)).sum();
            let fixed = profiles.fixed_load.column(t).sum();
            let dispatchable = (&d.p_dl.column(t) * &d.u_dl.column(t)).sum();
            let storage = (&d.p_chg.column(t) * &d.u_chg.column(t)).sum()
                + (&d.p_dch.column(t) * &d.u_dch.column(t)).sum();
            solar + wind + biomass - fixed - dispatchable - storage
        })
        .collect()
}

/// Profit of candidate `x`. Higher is better.
///
/// # Errors
///
/// Returns `Config` for an invalid plant, `Dimension` for profiles that
/// disagree with it, and `Shape` for a vector of the wrong length.
pub fn profit(x: &[f64], config: &VppConfig, profiles: &Profiles) -> Result<f64> {
    profit_breakdown(x, config, profiles).map(|b| b.profit())
}

/// Every term of the profit of candidate `x`.
///
/// # Errors
///
/// Same as [`profit`].
pub fn profit_breakdown(x: &[f64], config: &VppConfig, profiles: &Profiles) -> Result<ProfitBreakdown> {
    config.ensure_valid()?;
    profiles.check_dimensions(config)?;
    let layout = VariableLayout::new(config)?;
    let decision = layout.decompose(x)?;
    Ok(breakdown(&decision, config, profiles))
}

pub(crate) fn breakdown(d: &DecisionSet, config: &VppConfig, profiles: &Profiles) -> ProfitBreakdown {
    let horizon = d.p_bm.ncols();
    let base = config.tariff_base;
    let net = settlement_net_power(d, profiles);

    let mut out = ProfitBreakdown::default();
    for (t, &p) in net.iter().enumerate() {
        out.revenue += p.max(0.0) * profiles.settlement_tariff[t] / base;
        out.import_cost += (-p).max(0.0) * profiles.distributor_tariff[t] / base;
    }

    for t in 0..horizon {
        for (i, &cost) in config.solar_costs.iter().enumerate() {
            out.solar_cost += profiles.solar[[i, t]] * cost;
        }
        for (i, &cost) in config.wind_costs.iter().enumerate() {
            out.wind_cost += profiles.wind[[i, t]] * cost;
        }
        for (i, unit) in config.biomass.iter().enumerate() {
            out.biomass_cost += d.p_bm[[i, t]] * d.u_bm[[i, t]] * unit.unit_cost;
            if t > 0 && d.u_bm[[i, t]] > d.u_bm[[i, t - 1]] {
                out.startup_cost += unit.startup_cost;
            }
        }
        for i in 0..config.dispatchable_loads {
            out.curtailment_cost +=
                d.p_dl[[i, t]] * d.u_dl[[i, t]] * profiles.curtailment_tariff[t] / base;
        }
        for (i, unit) in config.storage.iter().enumerate() {
            out.storage_cost += (d.p_chg[[i, t]] * d.u_chg[[i, t]]
                + d.p_dch[[i, t]] * d.u_dch[[i, t]])
                * unit.unit_cost;
        }
    }
    out
}
