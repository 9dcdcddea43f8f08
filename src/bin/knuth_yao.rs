//! knuth_yao — synthesis runs on the Knuth–Yao die fragment.
//!
//! `knuth_yao` runs the direct baseline and the three refinement strategies
//! from a fixed start at `c_lambda = 0.001`. `knuth_yao fixed` runs 100
//! chained single-step linearizations at a fixed radius.
//!
//! Set `RUST_LOG=pmc_synthesis=debug` to see per-round events.
//!
//! A run that ends without success (trust region exhausted or round cap)
//! is reported as "no instantiation found". Sub-problem, solver and oracle
//! errors are reported on stderr and make the process exit non-zero.
use std::error::Error;

use pmc_synthesis::{
    model::ParameterPoint,
    optimization::gateway::DefaultGateway,
    oracle::ClosedFormOracle,
    synthesis::{
        RefinementLoop, Strategy, SynthesisOptions, SynthesisOutcome, SynthesisResult,
        TrustRegionOptions,
    },
};

const FIXED_ROUNDS: usize = 100;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match std::env::args().nth(1).as_deref() {
        None => compare_strategies(),
        Some("fixed") => fixed_linearization(),
        Some(other) => {
            Err(format!("unknown mode '{other}', expected no argument or 'fixed'").into())
        }
    }
}

fn compare_strategies() -> Result<(), Box<dyn Error>> {
    let start = ParameterPoint::new(0.4, 0.8, 0.01, 0.3, 0.9);
    let options = SynthesisOptions::new(
        0.001,
        1e-4,
        1e6,
        TrustRegionOptions::new(10.0, 1.5, 1e-4)?,
    )?;
    let refinement =
        RefinementLoop::new(ClosedFormOracle::default(), DefaultGateway::default(), options)?;

    let mut failures = 0;
    match refinement.direct_baseline(&start) {
        Ok(p) => {
            let verdict = if p.ps0 <= options.c_lambda { "meets" } else { "misses" };
            println!("baseline: x = {}, y = {}, ps0 = {} ({verdict} threshold)", p.x, p.y, p.ps0);
        }
        Err(err) => {
            eprintln!("baseline: failed: {err}");
            failures += 1;
        }
    }

    for strategy in Strategy::ALL {
        match describe(strategy, refinement.run(strategy, &start)) {
            Ok(line) => println!("{line}"),
            Err(line) => {
                eprintln!("{line}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(format!("{failures} run(s) failed with an error").into());
    }
    Ok(())
}

/// Report line for a finished run; `Err` for runs that ended in an error.
fn describe(
    strategy: Strategy, result: SynthesisResult<SynthesisOutcome>,
) -> Result<String, String> {
    match result {
        Ok(out) => match out.solution {
            Some(p) => Ok(format!(
                "{strategy}: x = {}, y = {}, ps0 = {} after {} rounds",
                p.x, p.y, p.ps0, out.rounds
            )),
            None => {
                let p = out.last_evaluated;
                Ok(format!(
                    "{strategy}: no instantiation found ({:?} after {} rounds); \
                     last point x = {}, y = {}, ps0 = {}",
                    out.status, out.rounds, p.x, p.y, p.ps0
                ))
            }
        },
        Err(err) => Err(format!("{strategy}: failed: {err}")),
    }
}

fn fixed_linearization() -> Result<(), Box<dyn Error>> {
    let start = ParameterPoint::new(0.5, 0.5, 0.3, 0.5, 0.5);
    let options = SynthesisOptions::new(
        1.0 / 6.0,
        1e-4,
        1e6,
        TrustRegionOptions { initial_delta: 1.0, ..TrustRegionOptions::default() },
    )?;
    let refinement =
        RefinementLoop::new(ClosedFormOracle::default(), DefaultGateway::default(), options)?;

    let iterates = refinement.iterate_linearization(&start, FIXED_ROUNDS)?;
    if let Some(p) = iterates.last() {
        println!("fixed linearization: x = {}, y = {}, ps0 = {}", p.x, p.y, p.ps0);
    }
    Ok(())
}
