//! Integration tests for the external model-checker oracle.
//!
//! Purpose
//! -------
//! - Run `ExternalOracle` against a scripted stand-in for a model checker
//!   and compare it with the closed-form oracle.
//! - Exercise the failure paths of the process boundary: nonzero exit,
//!   missing marker and timeout.
//!
//! Coverage
//! --------
//! - `oracle::external`: staging, argument passing, output parsing.
//! - `ExternalOracleConfig::from_model_dir`.
//! - `synthesis::RefinementLoop` driven by the external oracle.
//!
//! Exclusions
//! ----------
//! - A real PRISM installation; the scripted checker only reads the
//!   rendered constants and evaluates the Knuth–Yao fragment in `awk`.
#![cfg(unix)]

use std::{fs, path::Path, time::Duration};

use approx::assert_relative_eq;
use pmc_synthesis::{
    model::ParameterPoint,
    optimization::gateway::DefaultGateway,
    oracle::{
        ClosedFormOracle, ExternalOracle, ExternalOracleConfig, OracleError, QuantityModel,
        ValueOracle,
    },
    synthesis::{RefinementLoop, Strategy, SynthesisOptions},
};
use tempfile::TempDir;

/// Reads `x`, `y` from the rendered model and the quantity name from the
/// property file, then prints the exact probability after the marker.
const FAKE_CHECKER: &str = r#"
q=$(cat "$2")
awk -F'[=;]' -v q="$q" '
/^const double x /{ x = $2 + 0 }
/^const double y /{ y = $2 + 0 }
END {
  ps3 = (1 - x) / (1 - x * y); ps1 = y * ps3; ps0 = x * ps1
  v = (q == "ps0") ? ps0 : (q == "ps1") ? ps1 : ps3
  printf "Fake checker\nValue in the initial state: %.17g\nTime: 0.0s\n", v
}' "$1"
"#;

const MODEL_TEMPLATE: &str = "dtmc\n\nconst double x;\nconst double y;\n\nmodule die\nendmodule\n";

fn write_script(dir: &TempDir, name: &str, body: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("script should be writable");
    path.display().to_string()
}

fn models() -> Vec<QuantityModel> {
    ["ps0", "ps1", "ps3"]
        .iter()
        .map(|q| QuantityModel {
            quantity: q.to_string(),
            model_template: MODEL_TEMPLATE.to_string(),
            property: q.to_string(),
        })
        .collect()
}

/// Purpose
/// -------
/// Build an oracle that runs `/bin/sh <script>` with the given body.
fn scripted_oracle(dir: &TempDir, body: &str, timeout: Duration) -> ExternalOracle {
    let script = write_script(dir, "checker.sh", body);
    let config = ExternalOracleConfig::new("/bin/sh", models())
        .expect("every quantity has one model")
        .with_args_prefix(vec![script])
        .with_timeout(timeout);
    ExternalOracle::new(config).expect("default marker compiles")
}

#[test]
// Purpose
// -------
// The scripted checker and the closed form agree on sampled points.
//
// Expect
// ------
// - ps0, ps1, ps3 within 1e-12; x, y passed through unchanged.
fn scripted_checker_matches_closed_form() {
    let dir = TempDir::new().unwrap();
    let external = scripted_oracle(&dir, FAKE_CHECKER, Duration::from_secs(10));
    let closed = ClosedFormOracle::default();

    for (x, y) in [(0.4, 0.8), (0.1, 0.3), (0.9999, 0.0001), (0.25, 0.5)] {
        let point = ParameterPoint::new(x, y, 0.0, 0.0, 0.0);

        let a = external.evaluate(&point).expect("scripted checker should succeed");
        let b = closed.evaluate(&point).expect("closed form should succeed");

        assert_eq!((a.x, a.y), (x, y));
        assert_relative_eq!(a.ps0, b.ps0, epsilon = 1e-12);
        assert_relative_eq!(a.ps1, b.ps1, epsilon = 1e-12);
        assert_relative_eq!(a.ps3, b.ps3, epsilon = 1e-12);
    }
}

#[test]
// Purpose
// -------
// A checker that exits with status 1 surfaces its stderr.
fn nonzero_exit_is_reported() {
    let dir = TempDir::new().unwrap();
    let oracle = scripted_oracle(&dir, "echo 'model error' >&2\nexit 1\n", Duration::from_secs(10));

    let err = oracle.evaluate(&ParameterPoint::new(0.4, 0.8, 0.0, 0.0, 0.0)).expect_err("exit 1");

    match err {
        OracleError::ProcessFailed { quantity, stderr, .. } => {
            assert_eq!(quantity, "ps0");
            assert_eq!(stderr, "model error");
        }
        other => panic!("expected ProcessFailed, got {other:?}"),
    }
}

#[test]
fn output_without_marker_is_reported() {
    let dir = TempDir::new().unwrap();
    let oracle = scripted_oracle(&dir, "echo 'Result: 0.5'\n", Duration::from_secs(10));

    let err = oracle.evaluate(&ParameterPoint::new(0.4, 0.8, 0.0, 0.0, 0.0)).expect_err("marker");

    assert!(matches!(err, OracleError::MissingMarker { .. }));
}

#[test]
// Purpose
// -------
// A checker that outlives the timeout is killed and reported.
fn slow_checker_times_out() {
    let dir = TempDir::new().unwrap();
    let oracle = scripted_oracle(&dir, "sleep 5\n", Duration::from_millis(200));

    let err = oracle.evaluate(&ParameterPoint::new(0.4, 0.8, 0.0, 0.0, 0.0)).expect_err("timeout");

    assert!(matches!(err, OracleError::Timeout { .. }));
}

#[test]
// Purpose
// -------
// Model and property files are loaded per quantity from a directory.
fn config_loads_model_directory() {
    let dir = TempDir::new().unwrap();
    for q in ["ps0", "ps1", "ps3"] {
        write_file(dir.path(), &format!("die_{q}.pm"), MODEL_TEMPLATE);
        write_file(dir.path(), &format!("die_{q}.pctl"), q);
    }

    let config = ExternalOracleConfig::from_model_dir("/bin/sh", dir.path())
        .expect("all six files exist");

    assert_eq!(config.models.len(), 3);
    assert!(config.models.iter().any(|m| m.quantity == "ps1" && m.property == "ps1"));
}

#[test]
// Purpose
// -------
// A refinement run driven by the scripted checker ends like the same run
// driven by the closed form.
fn refinement_with_external_oracle_matches_closed_form() {
    let dir = TempDir::new().unwrap();
    let external = scripted_oracle(&dir, FAKE_CHECKER, Duration::from_secs(10));
    let start = ParameterPoint::new(0.4, 0.8, 0.01, 0.3, 0.9);
    let options = SynthesisOptions::default();

    let via_external = RefinementLoop::new(external, DefaultGateway::default(), options)
        .unwrap()
        .run(Strategy::PenaltyCcp, &start)
        .expect("CCP should not fail at the default threshold");
    let closed = ClosedFormOracle::default();
    let via_closed = RefinementLoop::new(closed, DefaultGateway::default(), options)
        .unwrap()
        .run(Strategy::PenaltyCcp, &start)
        .expect("CCP should not fail at the default threshold");

    assert_eq!(via_external.status, via_closed.status);
    assert_eq!(via_external.rounds, via_closed.rounds);
    assert_relative_eq!(
        via_external.last_evaluated.ps0,
        via_closed.last_evaluated.ps0,
        epsilon = 1e-9
    );
}

fn write_file(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).expect("file should be writable");
}
