//! Exogenous per-scenario profiles and the dispatchable-load band.

use ndarray::Array2;
use serde::Deserialize;

use crate::config::{ConfigError, VppConfig};
use crate::error::{DispatchError, Result};

/// Fixed power profiles and tariff series for one scenario.
///
/// Matrices are `(assets × horizon)`; tariffs have one entry per step.
/// Evaluators only ever read these values.
#[derive(Debug, Clone, PartialEq)]
pub struct Profiles {
    /// Fixed (non-dispatchable) load power, `[Nl, T]`.
    pub fixed_load: Array2<f64>,
    /// Solar generation, `[Npv, T]`.
    pub solar: Array2<f64>,
    /// Wind generation, `[Nwt, T]`.
    pub wind: Array2<f64>,
    /// Reference consumption of each dispatchable load, `[Ndl, T]`.
    pub dispatchable_reference: Array2<f64>,
    /// Settlement price paid for exported energy.
    pub settlement_tariff: Vec<f64>,
    /// Distributor price charged for imported energy.
    pub distributor_tariff: Vec<f64>,
    /// Compensation paid for dispatchable load service.
    pub curtailment_tariff: Vec<f64>,
}

/// Installed-capacity multipliers applied to per-unit profiles.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapacityScaling {
    /// Solar capacity (p.u.).
    pub solar: f64,
    /// Wind capacity (p.u.).
    pub wind: f64,
    /// Load capacity (p.u.), applied to fixed and dispatchable loads.
    pub load: f64,
}

impl Default for CapacityScaling {
    fn default() -> Self {
        Self {
            solar: 1.0,
            wind: 1.0,
            load: 1.0,
        }
    }
}

impl CapacityScaling {
    /// Validates every factor and returns a list of errors.
    ///
    /// Each factor must be finite and > 0.
    pub fn validate(&self) -> Vec<ConfigError> {
        [
            ("capacity.solar", self.solar),
            ("capacity.wind", self.wind),
            ("capacity.load", self.load),
        ]
        .into_iter()
        .filter(|(_, v)| !(v.is_finite() && *v > 0.0))
        .map(|(field, _)| ConfigError::new(field, "must be finite and > 0"))
        .collect()
    }
}

impl Profiles {
    /// All-zero profiles shaped for `config`.
    pub fn zeros(config: &VppConfig) -> Self {
        let t = config.horizon;
        Self {
            fixed_load: Array2::zeros((config.fixed_loads, t)),
            solar: Array2::zeros((config.n_solar(), t)),
            wind: Array2::zeros((config.n_wind(), t)),
            dispatchable_reference: Array2::zeros((config.dispatchable_loads, t)),
            settlement_tariff: vec![0.0; t],
            distributor_tariff: vec![0.0; t],
            curtailment_tariff: vec![0.0; t],
        }
    }

    /// Checks every profile against the configured asset counts and horizon.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Dimension` naming the first mismatching profile.
    pub fn check_dimensions(&self, config: &VppConfig) -> Result<()> {
        let t = config.horizon;
        check_shape("fixed_load", &self.fixed_load, (config.fixed_loads, t))?;
        check_shape("solar", &self.solar, (config.n_solar(), t))?;
        check_shape("wind", &self.wind, (config.n_wind(), t))?;
        check_shape(
            "dispatchable_reference",
            &self.dispatchable_reference,
            (config.dispatchable_loads, t),
        )?;
        check_series("settlement_tariff", &self.settlement_tariff, t)?;
        check_series("distributor_tariff", &self.distributor_tariff, t)?;
        check_series("curtailment_tariff", &self.curtailment_tariff, t)
    }

    /// Returns a copy with power profiles multiplied by installed capacity.
    ///
    /// Tariffs are left untouched.
    pub fn scaled(&self, capacity: &CapacityScaling) -> Self {
        Self {
            fixed_load: &self.fixed_load * capacity.load,
            solar: &self.solar * capacity.solar,
            wind: &self.wind * capacity.wind,
            dispatchable_reference: &self.dispatchable_reference * capacity.load,
            settlement_tariff: self.settlement_tariff.clone(),
            distributor_tariff: self.distributor_tariff.clone(),
            curtailment_tariff: self.curtailment_tariff.clone(),
        }
    }
}

/// Time-varying admissible range of each dispatchable load, `[Ndl, T]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBand {
    pub min: Array2<f64>,
    pub max: Array2<f64>,
}

impl LoadBand {
    /// Band of `reference · (1 ± tolerance)`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the tolerance is negative or not finite.
    pub fn around(
        reference: &Array2<f64>,
        tolerance: f64,
    ) -> std::result::Result<Self, ConfigError> {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(ConfigError::new(
                "curtailment_tolerance",
                "must be finite and >= 0",
            ));
        }
        Ok(Self {
            min: reference.mapv(|r| r - r * tolerance),
            max: reference.mapv(|r| r + r * tolerance),
        })
    }

    /// Checks both band edges against `[Ndl, T]`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Dimension` if either edge has the wrong shape.
    pub fn check_dimensions(&self, config: &VppConfig) -> Result<()> {
        let expected = (config.dispatchable_loads, config.horizon);
        check_shape("load band min", &self.min, expected)?;
        check_shape("load band max", &self.max, expected)
    }
}

fn check_shape(what: &'static str, m: &Array2<f64>, expected: (usize, usize)) -> Result<()> {
    if m.dim() == expected {
        Ok(())
    } else {
        Err(DispatchError::Dimension {
            what,
            expected,
            actual: m.dim(),
        })
    }
}

fn check_series(what: &'static str, series: &[f64], horizon: usize) -> Result<()> {
    if series.len() == horizon {
        Ok(())
    } else {
        Err(DispatchError::Dimension {
            what,
            expected: (1, horizon),
            actual: (1, series.len()),
        })
    }
}
