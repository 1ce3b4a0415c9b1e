//! TOML scenario files: plant, raw profiles, installed capacity, and band.
//!
//! Loading runs the whole initialization phase (capacity scaling, load band,
//! biomass sizing) and yields values that evaluation never touches again.
//!
//! ```toml
//! curtailment_tolerance = 0.2
//!
//! [vpp]
//! preset = "minimal"
//!
//! [capacity]
//! solar = 2.75
//!
//! [profiles]
//! fixed_load = [[1.0, 1.0]]
//! solar = [[0.0, 0.0]]
//! wind = [[0.0, 0.0]]
//! dispatchable_reference = [[0.5, 0.5]]
//! settlement_tariff = [0.0, 0.0]
//! distributor_tariff = [0.0, 0.0]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, VppConfig};
use crate::dispatch::DispatchProblem;
use crate::error::DispatchError;
use crate::profiles::{CapacityScaling, LoadBand, Profiles};
use crate::sizing::BiomassSizing;

/// Band half-width used when a scenario does not set one.
pub const DEFAULT_CURTAILMENT_TOLERANCE: f64 = 0.2;

/// Share of the distributor tariff paid as dispatchable-load compensation
/// when a scenario gives no curtailment tariff.
pub const DEFAULT_CURTAILMENT_SHARE: f64 = 0.15;

fn default_tolerance() -> f64 {
    DEFAULT_CURTAILMENT_TOLERANCE
}

/// Errors raised while loading a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid plant configuration: {}", join_errors(.0))]
    Invalid(Vec<ConfigError>),

    #[error("profile {what} row {row} has {actual} steps, expected {expected}")]
    RaggedProfile {
        what: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// On-disk layout of a scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    pub vpp: PlantSection,
    pub profiles: ProfileSection,
    #[serde(default)]
    pub capacity: CapacityScaling,
    #[serde(default = "default_tolerance")]
    pub curtailment_tolerance: f64,
}

/// The `[vpp]` table: a named preset, optionally with another horizon, or
/// a full plant description.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PlantSection {
    Preset(PresetRef),
    Inline(VppConfig),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetRef {
    pub preset: String,
    #[serde(default)]
    pub horizon: Option<usize>,
}

/// The `[profiles]` table, one row per asset.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSection {
    #[serde(default)]
    pub fixed_load: Vec<Vec<f64>>,
    #[serde(default)]
    pub solar: Vec<Vec<f64>>,
    #[serde(default)]
    pub wind: Vec<Vec<f64>>,
    #[serde(default)]
    pub dispatchable_reference: Vec<Vec<f64>>,
    pub settlement_tariff: Vec<f64>,
    pub distributor_tariff: Vec<f64>,
    /// Defaults to a fixed share of the distributor tariff.
    #[serde(default)]
    pub curtailment_tariff: Option<Vec<f64>>,
}

impl PlantSection {
    /// Resolves the plant.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown preset.
    pub fn resolve(&self) -> Result<VppConfig, ConfigError> {
        match self {
            PlantSection::Preset(r) => {
                let mut config = VppConfig::from_preset(&r.preset)?;
                if let Some(horizon) = r.horizon {
                    config.horizon = horizon;
                }
                Ok(config)
            }
            PlantSection::Inline(config) => Ok(config.clone()),
        }
    }
}

impl ProfileSection {
    /// Converts the raw rows into unscaled profiles for `horizon` steps.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::RaggedProfile` if a row has the wrong length.
    pub fn to_profiles(&self, horizon: usize) -> Result<Profiles, ScenarioError> {
        let distributor_tariff = self.distributor_tariff.clone();
        let curtailment_tariff = match &self.curtailment_tariff {
            Some(series) => series.clone(),
            None => distributor_tariff
                .iter()
                .map(|tau| tau * DEFAULT_CURTAILMENT_SHARE)
                .collect(),
        };
        Ok(Profiles {
            fixed_load: to_matrix("fixed_load", &self.fixed_load, horizon)?,
            solar: to_matrix("solar", &self.solar, horizon)?,
            wind: to_matrix("wind", &self.wind, horizon)?,
            dispatchable_reference: to_matrix(
                "dispatchable_reference",
                &self.dispatchable_reference,
                horizon,
            )?,
            settlement_tariff: self.settlement_tariff.clone(),
            distributor_tariff,
            curtailment_tariff,
        })
    }
}

fn to_matrix(
    what: &'static str,
    rows: &[Vec<f64>],
    horizon: usize,
) -> Result<Array2<f64>, ScenarioError> {
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != horizon) {
        return Err(ScenarioError::RaggedProfile {
            what,
            row,
            expected: horizon,
            actual: r.len(),
        });
    }
    Ok(Array2::from_shape_fn((rows.len(), horizon), |(i, t)| {
        rows[i][t]
    }))
}

/// A fully initialized scenario, ready to bind to a [`DispatchProblem`].
#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: VppConfig,
    /// Profiles after capacity scaling.
    pub profiles: Profiles,
    pub band: LoadBand,
    pub sizing: BiomassSizing,
    pub capacity: CapacityScaling,
    pub curtailment_tolerance: f64,
}

impl Scenario {
    /// Reads and initializes a scenario file.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError` if the file cannot be read or any part of the
    /// scenario is invalid.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "scenario loaded");
        Ok(scenario)
    }

    /// Parses and initializes a scenario from TOML text.
    ///
    /// # Errors
    ///
    /// Same as [`Scenario::load`], minus I/O.
    pub fn from_toml_str(s: &str) -> Result<Self, ScenarioError> {
        let file: ScenarioFile = toml::from_str(s)?;
        file.initialize()
    }

    /// Builds a scenario from already typed parts.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for a bad plant or a capacity factor that is not
    /// finite and > 0, and `Dispatch` for profiles that disagree with the
    /// plant.
    pub fn from_parts(
        config: VppConfig,
        raw: Profiles,
        capacity: CapacityScaling,
        curtailment_tolerance: f64,
    ) -> Result<Self, ScenarioError> {
        let mut errors = config.validate();
        errors.extend(capacity.validate());
        if !errors.is_empty() {
            return Err(ScenarioError::Invalid(errors));
        }
        raw.check_dimensions(&config)?;

        let profiles = raw.scaled(&capacity);
        let band = LoadBand::around(&profiles.dispatchable_reference, curtailment_tolerance)
            .map_err(|e| ScenarioError::Invalid(vec![e]))?;
        let sizing = BiomassSizing::from_profiles(&profiles);
        info!(
            horizon = config.horizon,
            biomass = config.n_biomass(),
            storage = config.n_storage(),
            dispatchable_loads = config.dispatchable_loads,
            peak_demand = sizing.max,
            base_demand = sizing.min,
            "scenario initialized"
        );
        Ok(Self {
            config,
            profiles,
            band,
            sizing,
            capacity,
            curtailment_tolerance,
        })
    }

    /// Binds the scenario to an evaluation problem.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if the band produces inverted bounds.
    pub fn into_problem(self) -> Result<DispatchProblem, DispatchError> {
        DispatchProblem::new(self.config, self.profiles, self.band)
    }
}

impl ScenarioFile {
    /// Runs the initialization phase.
    ///
    /// # Errors
    ///
    /// See [`Scenario::from_parts`].
    pub fn initialize(&self) -> Result<Scenario, ScenarioError> {
        let config = self
            .vpp
            .resolve()
            .map_err(|e| ScenarioError::Invalid(vec![e]))?;
        let raw = self.profiles.to_profiles(config.horizon)?;
        Scenario::from_parts(config, raw, self.capacity, self.curtailment_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[vpp]
preset = "minimal"

[profiles]
fixed_load = [[1.0, 1.0]]
solar = [[0.5, 0.0]]
wind = [[0.0, 0.2]]
dispatchable_reference = [[0.5, 0.25]]
settlement_tariff = [200.0, 200.0]
distributor_tariff = [600.0, 400.0]
"#;

    #[test]
    fn preset_scenario_with_defaults() {
        let s = Scenario::from_toml_str(MINIMAL).unwrap();
        assert_eq!(s.config, VppConfig::minimal());
        assert_eq!(s.curtailment_tolerance, DEFAULT_CURTAILMENT_TOLERANCE);
        assert_eq!(s.capacity, CapacityScaling::default());
        assert!((s.profiles.curtailment_tariff[0] - 90.0).abs() < 1e-9);
        assert!((s.profiles.curtailment_tariff[1] - 60.0).abs() < 1e-9);
        assert!((s.band.max[[0, 0]] - 0.6).abs() < 1e-12);
        assert!((s.band.min[[0, 1]] - 0.2).abs() < 1e-12);
        assert!((s.sizing.max - 1.5).abs() < 1e-12);
    }

    #[test]
    fn capacity_scales_before_band() {
        let toml = format!("{MINIMAL}\n[capacity]\nsolar = 2.0\nload = 2.0\n");
        let s = Scenario::from_toml_str(&toml).unwrap();
        assert_eq!(s.profiles.solar[[0, 0]], 1.0);
        assert_eq!(s.profiles.fixed_load[[0, 0]], 2.0);
        assert!((s.band.max[[0, 0]] - 1.2).abs() < 1e-12);
    }

    #[test]
    fn negative_capacity_is_invalid() {
        let toml = format!("{MINIMAL}\n[capacity]\nsolar = -2.0\n");
        let err = Scenario::from_toml_str(&toml).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Invalid(ref v) if v.len() == 1 && v[0].field == "capacity.solar"
        ));
    }

    #[test]
    fn capacity_errors_join_plant_errors() {
        let mut config = VppConfig::minimal();
        config.horizon = 0;
        let raw = Profiles::zeros(&VppConfig::minimal());
        let capacity = CapacityScaling {
            wind: f64::INFINITY,
            ..CapacityScaling::default()
        };
        let err = Scenario::from_parts(config, raw, capacity, 0.2).unwrap_err();
        let ScenarioError::Invalid(errors) = err else {
            panic!("expected invalid scenario, got {err:?}");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["horizon", "capacity.wind"]);
    }

    #[test]
    fn inline_plant() {
        let toml = r#"
curtailment_tolerance = 0.0

[vpp]
horizon = 1
fixed_loads = 1

[[vpp.biomass]]
p_min = 0.0
p_max = 2.0
ramp_up = 1.0
ramp_down = 1.0
unit_cost = 0.1
startup_cost = 0.0

[profiles]
fixed_load = [[0.7]]
settlement_tariff = [0.0]
distributor_tariff = [0.0]
"#;
        let s = Scenario::from_toml_str(toml).unwrap();
        assert_eq!(s.config.n_biomass(), 1);
        assert_eq!(s.config.n_storage(), 0);
        assert_eq!(s.profiles.solar.dim(), (0, 1));
        assert!(s.into_problem().is_ok());
    }

    #[test]
    fn ragged_row_is_reported() {
        let toml = MINIMAL.replace("solar = [[0.5, 0.0]]", "solar = [[0.5]]");
        let err = Scenario::from_toml_str(&toml).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::RaggedProfile {
                what: "solar",
                row: 0,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn missing_asset_row_is_dimension_error() {
        let toml = MINIMAL.replace("wind = [[0.0, 0.2]]\n", "");
        let err = Scenario::from_toml_str(&toml).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Dispatch(DispatchError::Dimension { what: "wind", .. })
        ));
    }

    #[test]
    fn unknown_preset_is_invalid() {
        let toml = MINIMAL.replace("\"minimal\"", "\"huge\"");
        let err = Scenario::from_toml_str(&toml).unwrap_err();
        assert!(matches!(err, ScenarioError::Invalid(ref v) if v[0].field == "preset"));
    }

    #[test]
    fn negative_tolerance_is_invalid() {
        let toml = format!("curtailment_tolerance = -0.5\n{MINIMAL}");
        let err = Scenario::from_toml_str(&toml).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Invalid(ref v) if v[0].field == "curtailment_tolerance"
        ));
    }

    #[test]
    fn unknown_key_is_parse_error() {
        let toml = format!("seed = 4\n{MINIMAL}");
        assert!(matches!(
            Scenario::from_toml_str(&toml),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Scenario::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ScenarioError::Io { .. }));
    }
}
