//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use ndarray::{Array2, array};
use vpp_dispatch::VppConfig;
use vpp_dispatch::dispatch::{Block, DispatchProblem, VariableLayout};
use vpp_dispatch::profiles::{LoadBand, Profiles};
use vpp_dispatch::scenario::Scenario;

/// Minimal plant (one asset of each kind, two steps) with one unit of
/// fixed load per step and zero tariffs.
pub fn minimal_profiles(config: &VppConfig) -> Profiles {
    let mut profiles = Profiles::zeros(config);
    profiles.fixed_load = array![[1.0, 1.0]];
    profiles
}

/// Dispatchable-load band of `[0.2, 0.6]` at both steps.
pub fn minimal_band() -> LoadBand {
    LoadBand {
        min: array![[0.2, 0.2]],
        max: array![[0.6, 0.6]],
    }
}

/// Problem for the minimal plant.
pub fn minimal_problem() -> DispatchProblem {
    let config = VppConfig::minimal();
    let profiles = minimal_profiles(&config);
    DispatchProblem::new(config, profiles, minimal_band()).unwrap()
}

/// Biomass at full output on both steps, everything else off.
///
/// Serves the fixed load exactly, so net power is zero and profit is the
/// negated biomass cost.
pub fn biomass_only_candidate(layout: &VariableLayout) -> Vec<f64> {
    let mut x = vec![0.0; layout.len()];
    for t in 0..layout.horizon() {
        x[layout.index(Block::BiomassPower, 0, t)] = 1.0;
        x[layout.index(Block::BiomassState, 0, t)] = 1.0;
    }
    x
}

/// Baseline plant with synthetic profiles and realistic tariffs.
pub fn baseline_problem() -> DispatchProblem {
    let config = VppConfig::baseline();
    let mut profiles = Profiles::zeros(&config);
    profiles.fixed_load.fill(0.25);
    profiles.solar = Array2::from_shape_fn((4, 24), |(i, t)| {
        if (6..=18).contains(&t) {
            0.05 + 0.01 * i as f64
        } else {
            0.0
        }
    });
    profiles.wind.fill(0.03);
    profiles.dispatchable_reference.fill(0.15);
    profiles.settlement_tariff = vec![180.0; 24];
    profiles.distributor_tariff = vec![450.0; 24];
    profiles.curtailment_tariff = vec![67.5; 24];
    let band = LoadBand::around(&profiles.dispatchable_reference, 0.2).unwrap();
    DispatchProblem::new(config, profiles, band).unwrap()
}

/// Path of a bundled scenario file.
pub fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(format!("{name}.toml"))
}

/// Loads a bundled scenario.
pub fn load_scenario(name: &str) -> Scenario {
    Scenario::load(&scenario_path(name)).unwrap()
}
