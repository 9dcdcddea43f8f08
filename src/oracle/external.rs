//! oracle::external — probabilities from an external model checker.
//!
//! Purpose
//! -------
//! Re-evaluate a candidate by handing the instantiated model to an external
//! probabilistic model checker (e.g. PRISM), once per quantity of interest,
//! and reading a single floating-point result from its standard output.
//!
//! Key behaviors
//! -------------
//! - Every call stages a fresh temporary directory holding the rendered model
//!   (the `const double x/y` declarations rewritten to the candidate values)
//!   and the property file; nothing is shared between calls, so concurrent
//!   evaluations never race on the same files.
//! - The checker is invoked as `program [args_prefix..] <model> <property>`
//!   and polled against a timeout; standard output and error are drained on
//!   helper threads so a chatty checker cannot block on a full pipe.
//! - The value is the first number following the configured marker
//!   (default `"Value in the initial state: "`).
//!
//! Invariants & assumptions
//! ------------------------
//! - The configuration describes exactly the quantities `ps0`, `ps1`, `ps3`;
//!   [`ExternalOracleConfig::new`] rejects anything else.
//! - A nonzero exit status, a timeout, a missing marker or an unparsable
//!   value is an [`OracleError`]; no retries are attempted.
use std::{
    io::Read,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use regex::Regex;

use crate::{
    model::point::ParameterPoint,
    oracle::{
        errors::{OracleError, OracleResult},
        traits::ValueOracle,
    },
};

/// Marker printed by PRISM in front of the computed probability.
pub const DEFAULT_MARKER: &str = "Value in the initial state: ";

/// Default upper bound on a single checker invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

const QUANTITIES: [&str; 3] = ["ps0", "ps1", "ps3"];

/// Model and property text for one quantity of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityModel {
    pub quantity: String,
    pub model_template: String,
    pub property: String,
}

/// Configuration of the external checker.
///
/// Fields
/// ------
/// - `program`: executable to run.
/// - `args_prefix`: arguments placed before the model and property paths
///   (e.g. a script path when `program` is an interpreter).
/// - `models`: one [`QuantityModel`] for each of `ps0`, `ps1`, `ps3`.
/// - `marker`: text preceding the value on standard output.
/// - `timeout`: limit per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalOracleConfig {
    pub program: PathBuf,
    pub args_prefix: Vec<String>,
    pub models: Vec<QuantityModel>,
    pub marker: String,
    pub timeout: Duration,
}

impl ExternalOracleConfig {
    /// Build a configuration with the default marker and timeout.
    ///
    /// # Errors
    /// [`OracleError::InvalidConfig`] if `models` does not contain exactly one
    /// entry for each of `ps0`, `ps1`, `ps3`.
    pub fn new(program: impl Into<PathBuf>, models: Vec<QuantityModel>) -> OracleResult<Self> {
        for quantity in QUANTITIES {
            let count = models.iter().filter(|m| m.quantity == quantity).count();
            if count != 1 {
                return Err(OracleError::InvalidConfig {
                    text: format!("expected one model for '{quantity}', found {count}"),
                });
            }
        }
        if let Some(extra) = models.iter().find(|m| !QUANTITIES.contains(&m.quantity.as_str())) {
            return Err(OracleError::InvalidConfig {
                text: format!("unexpected quantity '{}'", extra.quantity),
            });
        }
        Ok(Self {
            program: program.into(),
            args_prefix: Vec::new(),
            models,
            marker: DEFAULT_MARKER.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Load `die_{q}.pm` / `die_{q}.pctl` for every quantity from `dir`.
    ///
    /// # Errors
    /// [`OracleError::Staging`] when a file cannot be read.
    pub fn from_model_dir(program: impl Into<PathBuf>, dir: &Path) -> OracleResult<Self> {
        let mut models = Vec::with_capacity(QUANTITIES.len());
        for quantity in QUANTITIES {
            let model_template = read_text(&dir.join(format!("die_{quantity}.pm")))?;
            let property = read_text(&dir.join(format!("die_{quantity}.pctl")))?;
            models.push(QuantityModel { quantity: quantity.to_string(), model_template, property });
        }
        Self::new(program, models)
    }

    pub fn with_args_prefix(mut self, args: Vec<String>) -> Self {
        self.args_prefix = args;
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Value oracle backed by an external model-checking process.
#[derive(Debug, Clone)]
pub struct ExternalOracle {
    config: ExternalOracleConfig,
    value_re: Regex,
}

impl ExternalOracle {
    /// # Errors
    /// [`OracleError::InvalidConfig`] if the marker cannot be compiled into a
    /// pattern.
    pub fn new(config: ExternalOracleConfig) -> OracleResult<Self> {
        let pattern = format!(
            r"{}\s*(?P<value>[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)",
            regex::escape(&config.marker)
        );
        let value_re = Regex::new(&pattern)
            .map_err(|err| OracleError::InvalidConfig { text: err.to_string() })?;
        Ok(Self { config, value_re })
    }

    pub fn config(&self) -> &ExternalOracleConfig {
        &self.config
    }

    /// Check a single quantity at `(x, y)`.
    pub fn check_quantity(&self, quantity: &str, x: f64, y: f64) -> OracleResult<f64> {
        let model = self.config.models.iter().find(|m| m.quantity == quantity).ok_or_else(|| {
            OracleError::InvalidConfig { text: format!("no model for '{quantity}'") }
        })?;

        let staging = tempfile::Builder::new()
            .prefix("pmc_oracle_")
            .tempdir()
            .map_err(|err| OracleError::Staging { text: err.to_string() })?;
        let model_path = staging.path().join(format!("{quantity}.pm"));
        let property_path = staging.path().join(format!("{quantity}.pctl"));
        write_text(&model_path, &render_model(&model.model_template, x, y))?;
        write_text(&property_path, &model.property)?;

        let stdout = self.run_checker(quantity, &model_path, &property_path)?;
        self.parse_value(quantity, &stdout)
    }

    fn run_checker(&self, quantity: &str, model: &Path, property: &Path) -> OracleResult<String> {
        let program = self.config.program.display().to_string();
        tracing::trace!(%program, quantity, "invoking model checker");
        let mut child = Command::new(&self.config.program)
            .args(&self.config.args_prefix)
            .arg(model)
            .arg(property)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| OracleError::Spawn { program: program.clone(), text: err.to_string() })?;

        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let deadline = Instant::now() + self.config.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(OracleError::Timeout {
                        quantity: quantity.to_string(),
                        timeout: self.config.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => {
                    return Err(OracleError::Spawn { program, text: err.to_string() });
                }
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        if !status.success() {
            let stderr = stderr_reader.join().unwrap_or_default();
            return Err(OracleError::ProcessFailed {
                quantity: quantity.to_string(),
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(stdout)
    }

    fn parse_value(&self, quantity: &str, stdout: &str) -> OracleResult<f64> {
        let captures = self.value_re.captures(stdout).ok_or_else(|| OracleError::MissingMarker {
            quantity: quantity.to_string(),
            marker: self.config.marker.clone(),
        })?;
        let text = &captures["value"];
        text.parse::<f64>().map_err(|_| OracleError::UnparsableValue {
            quantity: quantity.to_string(),
            text: text.to_string(),
        })
    }
}

impl ValueOracle for ExternalOracle {
    fn evaluate(&self, point: &ParameterPoint) -> OracleResult<ParameterPoint> {
        let ps0 = self.check_quantity("ps0", point.x, point.y)?;
        let ps1 = self.check_quantity("ps1", point.x, point.y)?;
        let ps3 = self.check_quantity("ps3", point.x, point.y)?;
        tracing::debug!(x = point.x, y = point.y, ps0, ps1, ps3, "external model check finished");
        Ok(point.with_probabilities(ps0, ps1, ps3))
    }
}

/// Rewrite the `const double x` / `const double y` declarations of a model
/// template; declarations that are missing are prepended.
pub fn render_model(template: &str, x: f64, y: f64) -> String {
    let mut seen_x = false;
    let mut seen_y = false;
    let mut lines: Vec<String> = template
        .lines()
        .map(|line| match declared_constant(line) {
            Some("x") => {
                seen_x = true;
                format!("const double x = {x};")
            }
            Some("y") => {
                seen_y = true;
                format!("const double y = {y};")
            }
            _ => line.to_string(),
        })
        .collect();
    if !seen_y {
        lines.insert(0, format!("const double y = {y};"));
    }
    if !seen_x {
        lines.insert(0, format!("const double x = {x};"));
    }
    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

// ---- Helper Methods ----

fn declared_constant(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("const double")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    rest.trim_start().split(|c: char| c == '=' || c == ';' || c.is_whitespace()).next()
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn read_text(path: &Path) -> OracleResult<String> {
    std::fs::read_to_string(path)
        .map_err(|err| OracleError::Staging { text: format!("read {}: {err}", path.display()) })
}

fn write_text(path: &Path, text: &str) -> OracleResult<()> {
    std::fs::write(path, text)
        .map_err(|err| OracleError::Staging { text: format!("write {}: {err}", path.display()) })
}
