//! Typed plant configuration, TOML loading, and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Default power base used to normalize tariffs (1 MVA).
pub const DEFAULT_TARIFF_BASE: f64 = 1e6;

fn default_tariff_base() -> f64 {
    DEFAULT_TARIFF_BASE
}

/// Immutable description of the plant and the dispatch horizon.
///
/// Asset counts are implied by the per-asset vectors (`biomass`, `storage`,
/// `solar_costs`, `wind_costs`) or given explicitly for assets without static
/// parameters (`dispatchable_loads`, `fixed_loads`). Index `i` of every
/// per-asset array refers to the same unit everywhere in the crate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VppConfig {
    /// Number of time steps in the horizon (must be > 0).
    pub horizon: usize,
    /// Power base dividing every tariff before it is applied.
    #[serde(default = "default_tariff_base")]
    pub tariff_base: f64,
    /// Biomass generating units.
    #[serde(default)]
    pub biomass: Vec<BiomassUnit>,
    /// Battery storage units.
    #[serde(default)]
    pub storage: Vec<StorageUnit>,
    /// Number of dispatchable loads.
    #[serde(default)]
    pub dispatchable_loads: usize,
    /// Number of fixed (non-dispatchable) loads.
    #[serde(default)]
    pub fixed_loads: usize,
    /// Unit generation cost of each solar plant.
    #[serde(default)]
    pub solar_costs: Vec<f64>,
    /// Unit generation cost of each wind plant.
    #[serde(default)]
    pub wind_costs: Vec<f64>,
}

/// Static limits and costs of one biomass unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BiomassUnit {
    /// Minimum output while on.
    pub p_min: f64,
    /// Maximum output while on.
    pub p_max: f64,
    /// Maximum increase between consecutive steps.
    pub ramp_up: f64,
    /// Maximum decrease between consecutive steps.
    pub ramp_down: f64,
    /// Operating cost per unit of power.
    pub unit_cost: f64,
    /// Cost charged on every off-to-on transition.
    pub startup_cost: f64,
}

/// Static limits and costs of one storage unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageUnit {
    /// Charge efficiency (0, 1].
    pub eta_charge: f64,
    /// Discharge efficiency (0, 1].
    pub eta_discharge: f64,
    /// Lowest admissible state of charge.
    pub soc_min: f64,
    /// Highest admissible state of charge.
    pub soc_max: f64,
    /// Charge and discharge power limit.
    pub p_max: f64,
    /// Operating cost per unit of charge or discharge power.
    pub unit_cost: f64,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"storage[1].eta_charge"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl VppConfig {
    /// Number of biomass units.
    pub fn n_biomass(&self) -> usize {
        self.biomass.len()
    }

    /// Number of storage units.
    pub fn n_storage(&self) -> usize {
        self.storage.len()
    }

    /// Number of solar plants.
    pub fn n_solar(&self) -> usize {
        self.solar_costs.len()
    }

    /// Number of wind plants.
    pub fn n_wind(&self) -> usize {
        self.wind_costs.len()
    }

    /// Returns the baseline plant: three biomass units, two batteries, two
    /// dispatchable and three fixed loads, four solar and two wind plants,
    /// over a 24-step day.
    pub fn baseline() -> Self {
        let biomass = BiomassUnit {
            p_min: 0.1,
            p_max: 0.5,
            ramp_up: 0.5,
            ramp_down: 0.5,
            unit_cost: 0.025,
            startup_cost: 10.14,
        };
        let storage = StorageUnit {
            eta_charge: 0.914,
            eta_discharge: 0.914,
            soc_min: 0.50,
            soc_max: 0.75,
            p_max: 0.1,
            unit_cost: 0.038,
        };
        Self {
            horizon: 24,
            tariff_base: DEFAULT_TARIFF_BASE,
            biomass: vec![biomass; 3],
            storage: vec![storage; 2],
            dispatchable_loads: 2,
            fixed_loads: 3,
            solar_costs: vec![0.022; 4],
            wind_costs: vec![0.027; 2],
        }
    }

    /// Returns a two-step plant with one asset of each kind.
    pub fn minimal() -> Self {
        Self {
            horizon: 2,
            tariff_base: DEFAULT_TARIFF_BASE,
            biomass: vec![BiomassUnit {
                p_min: 0.0,
                p_max: 1.0,
                ramp_up: 1.0,
                ramp_down: 1.0,
                unit_cost: 0.1,
                startup_cost: 5.0,
            }],
            storage: vec![StorageUnit {
                eta_charge: 0.9,
                eta_discharge: 0.9,
                soc_min: 0.0,
                soc_max: 1.0,
                p_max: 0.5,
                unit_cost: 0.05,
            }],
            dispatchable_loads: 1,
            fixed_loads: 1,
            solar_costs: vec![0.0],
            wind_costs: vec![0.0],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "minimal"];

    /// Loads a plant from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "minimal" => Ok(Self::minimal()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a plant from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a plant from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, misses a required
    /// field, or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.horizon == 0 {
            errors.push(ConfigError::new("horizon", "must be > 0"));
        }
        if !(self.tariff_base.is_finite() && self.tariff_base > 0.0) {
            errors.push(ConfigError::new("tariff_base", "must be finite and > 0"));
        }

        for (i, unit) in self.biomass.iter().enumerate() {
            let field = |name: &str| format!("biomass[{i}].{name}");
            check_non_negative(&mut errors, &field("p_min"), unit.p_min);
            check_non_negative(&mut errors, &field("p_max"), unit.p_max);
            check_non_negative(&mut errors, &field("ramp_up"), unit.ramp_up);
            check_non_negative(&mut errors, &field("ramp_down"), unit.ramp_down);
            check_non_negative(&mut errors, &field("unit_cost"), unit.unit_cost);
            check_non_negative(&mut errors, &field("startup_cost"), unit.startup_cost);
            if unit.p_min > unit.p_max {
                errors.push(ConfigError::new(field("p_min"), "must be <= p_max"));
            }
        }

        for (i, unit) in self.storage.iter().enumerate() {
            let field = |name: &str| format!("storage[{i}].{name}");
            check_efficiency(&mut errors, &field("eta_charge"), unit.eta_charge);
            check_efficiency(&mut errors, &field("eta_discharge"), unit.eta_discharge);
            check_non_negative(&mut errors, &field("p_max"), unit.p_max);
            check_non_negative(&mut errors, &field("unit_cost"), unit.unit_cost);
            if !(unit.soc_min.is_finite() && unit.soc_max.is_finite()) {
                errors.push(ConfigError::new(field("soc_min"), "must be finite"));
            } else if unit.soc_min > unit.soc_max {
                errors.push(ConfigError::new(field("soc_min"), "must be <= soc_max"));
            }
        }

        for (i, &cost) in self.solar_costs.iter().enumerate() {
            check_non_negative(&mut errors, &format!("solar_costs[{i}]"), cost);
        }
        for (i, &cost) in self.wind_costs.iter().enumerate() {
            check_non_negative(&mut errors, &format!("wind_costs[{i}]"), cost);
        }

        errors
    }

    /// Validates the configuration, returning the first error found.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` reported by [`VppConfig::validate`].
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        match self.validate().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn check_non_negative(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigError::new(field, "must be finite and >= 0"));
    }
}

fn check_efficiency(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value > 0.0 && value <= 1.0) {
        errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = VppConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn baseline_asset_counts() {
        let cfg = VppConfig::baseline();
        assert_eq!(cfg.n_biomass(), 3);
        assert_eq!(cfg.n_storage(), 2);
        assert_eq!(cfg.n_solar(), 4);
        assert_eq!(cfg.n_wind(), 2);
        assert_eq!(cfg.dispatchable_loads, 2);
        assert_eq!(cfg.fixed_loads, 3);
    }

    #[test]
    fn from_preset_unknown() {
        let err = VppConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert_eq!(e.field, "preset");
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in VppConfig::PRESETS {
            let cfg = VppConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(VppConfig::validate).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
horizon = 4
dispatchable_loads = 1
fixed_loads = 2
solar_costs = [0.02]
wind_costs = [0.03, 0.03]

[[biomass]]
p_min = 0.1
p_max = 0.5
ramp_up = 0.2
ramp_down = 0.2
unit_cost = 0.025
startup_cost = 10.0

[[storage]]
eta_charge = 0.9
eta_discharge = 0.95
soc_min = 0.2
soc_max = 0.8
p_max = 0.1
unit_cost = 0.04
"#;
        let cfg = VppConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.horizon), Some(4));
        assert_eq!(cfg.as_ref().map(VppConfig::n_wind), Some(2));
        assert_eq!(cfg.as_ref().map(|c| c.tariff_base), Some(DEFAULT_TARIFF_BASE));
        assert_eq!(
            cfg.as_ref().map(|c| c.storage[0].eta_discharge),
            Some(0.95)
        );
    }

    #[test]
    fn plant_file_loads() {
        let dir = std::env::temp_dir()
            .join(format!("vpp-dispatch-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("plant.toml");
        fs::write(&path, "horizon = 3\nfixed_loads = 1\ndispatchable_loads = 2\n").unwrap();

        let cfg = VppConfig::from_toml_file(&path).unwrap();
        assert_eq!(cfg.horizon, 3);
        assert_eq!(cfg.dispatchable_loads, 2);
        assert_eq!(cfg.n_biomass(), 0);
        assert!(cfg.validate().is_empty());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_plant_file_names_path() {
        let err = VppConfig::from_toml_file(Path::new("no/such/plant.toml")).unwrap_err();
        assert_eq!(err.field, "config");
        assert!(err.message.contains("no/such/plant.toml"));
    }

    #[test]
    fn missing_horizon_is_rejected() {
        let result = VppConfig::from_toml_str("fixed_loads = 1\n");
        let err = result.expect_err("horizon is required");
        assert_eq!(err.field, "toml");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let toml = r#"
horizon = 24
bogus_field = true
"#;
        assert!(VppConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_zero_horizon() {
        let mut cfg = VppConfig::baseline();
        cfg.horizon = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "horizon"));
    }

    #[test]
    fn validation_catches_inverted_biomass_limits() {
        let mut cfg = VppConfig::baseline();
        cfg.biomass[1].p_min = 0.9;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "biomass[1].p_min"));
    }

    #[test]
    fn validation_catches_bad_efficiency() {
        let mut cfg = VppConfig::baseline();
        cfg.storage[0].eta_discharge = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "storage[0].eta_discharge"));
    }

    #[test]
    fn validation_catches_inverted_soc() {
        let mut cfg = VppConfig::baseline();
        cfg.storage[1].soc_min = 0.9;
        let err = cfg.ensure_valid().expect_err("soc_min > soc_max");
        assert_eq!(err.field, "storage[1].soc_min");
    }

    #[test]
    fn validation_catches_negative_cost() {
        let mut cfg = VppConfig::baseline();
        cfg.wind_costs[1] = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "wind_costs[1]"));
    }
}
