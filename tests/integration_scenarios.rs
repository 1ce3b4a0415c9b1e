//! Integration tests for bundled scenarios, presets, and the command line.

mod common;

use std::process::Command;

use vpp_dispatch::VppConfig;
use vpp_dispatch::dispatch::Problem;
use vpp_dispatch::io::export::{read_candidate_csv, write_decision_csv, write_steps_csv};
use vpp_dispatch::report::DispatchReport;
use vpp_dispatch::sampling::screen_random_candidates;

#[test]
fn presets_validate() {
    for name in VppConfig::PRESETS {
        let config = VppConfig::from_preset(name).unwrap();
        assert!(config.validate().is_empty(), "preset {name} should be valid");
    }
}

#[test]
fn baseline_scenario_initializes() {
    let scenario = common::load_scenario("baseline");
    assert_eq!(scenario.config.horizon, 24);
    assert_eq!(scenario.capacity.solar, 2.75);
    assert_eq!(scenario.capacity.wind, 10.0);
    assert!(scenario.sizing.min <= scenario.sizing.mid);
    assert!(scenario.sizing.mid <= scenario.sizing.max);
    assert_eq!(scenario.sizing.demand.len(), 24);

    let expected_dl = scenario.profiles.distributor_tariff[0] * 0.15;
    assert!((scenario.profiles.curtailment_tariff[0] - expected_dl).abs() < 1e-9);

    let problem = scenario.into_problem().unwrap();
    assert_eq!(problem.n_var(), 24 * (3 + 3 * 2 + 2) + 24 * (3 + 2 * 2 + 2));
}

#[test]
fn minimal_scenario_matches_hand_built_problem() {
    let problem = common::load_scenario("minimal").into_problem().unwrap();
    let x = common::biomass_only_candidate(problem.layout());
    let eval = problem.evaluate(&x).unwrap();
    assert!((eval.profit + 0.2).abs() < 1e-12);
}

#[test]
fn screening_is_reproducible() {
    let problem = common::load_scenario("baseline").into_problem().unwrap();
    let a = screen_random_candidates(&problem, 8, 11).unwrap().unwrap();
    let b = screen_random_candidates(&problem, 8, 11).unwrap().unwrap();
    assert_eq!(a.candidate, b.candidate);
    assert!(problem.bounds().contains(&a.candidate));
}

#[test]
fn report_export_is_deterministic() {
    let problem = common::baseline_problem();
    let best = screen_random_candidates(&problem, 4, 5).unwrap().unwrap();
    let decision = problem.decompose(&best.candidate).unwrap();
    let report = DispatchReport::new(&problem, &decision).unwrap();

    let mut a = Vec::new();
    let mut b = Vec::new();
    write_steps_csv(&report.steps, &mut a).unwrap();
    write_steps_csv(&report.steps, &mut b).unwrap();
    assert_eq!(a, b);
    assert_eq!(String::from_utf8(a).unwrap().lines().count(), 25);

    let mut long = Vec::new();
    write_decision_csv(&decision, problem.layout(), &mut long).unwrap();
    let back = read_candidate_csv(long.as_slice()).unwrap();
    let nr = problem.layout().n_continuous();
    assert_eq!(&back[..nr], &best.candidate[..nr]);
}

#[test]
fn cli_bounds_lists_every_variable() {
    let path = common::scenario_path("minimal");
    let output = Command::new(env!("CARGO_BIN_EXE_vpp-dispatch"))
        .arg("--scenario")
        .arg(&path)
        .arg("bounds")
        .output()
        .expect("vpp-dispatch process should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("18 variables"));
    assert!(stdout.contains("p_dl[0, t=1]"));
    assert!(stdout.contains("u_dl[0, t=1]"));
}

#[test]
fn cli_evaluates_candidate_file() {
    let dir = std::env::temp_dir().join(format!("vpp-dispatch-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let candidate = dir.join("candidate.csv");
    let export = dir.join("steps.csv");

    let problem = common::minimal_problem();
    let x = common::biomass_only_candidate(problem.layout());
    let body: String = x.iter().map(|v| format!("{v}\n")).collect();
    std::fs::write(&candidate, format!("x\n{body}")).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_vpp-dispatch"))
        .arg("--scenario")
        .arg(common::scenario_path("minimal"))
        .arg("evaluate")
        .arg("--candidate")
        .arg(&candidate)
        .arg("--export")
        .arg(&export)
        .output()
        .expect("vpp-dispatch process should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Objective:             0.200000"));
    assert!(export.exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn cli_reports_missing_scenario() {
    let output = Command::new(env!("CARGO_BIN_EXE_vpp-dispatch"))
        .args(["--scenario", "no/such/file.toml", "bounds"])
        .output()
        .expect("vpp-dispatch process should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no/such/file.toml"));
}
