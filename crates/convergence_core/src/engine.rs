//! The fixed-point iteration state machine.
//!
//! `IterationEngine` is either uninitialized or holds a session seeded by
//! [`IterationEngine::initialize`]. Steps are atomic: a failing step returns
//! an error and leaves the session exactly as it was.

use crate::convergence::{exceeds_bound, is_converged, relative_error_percent};
use crate::error::EngineError;
use crate::expression::{compile, CompiledFunction};
use crate::settings::{EngineSettings, RunSettings};
use crate::trace::{CobwebPoint, CobwebTrace};
use crate::traits::UnaryMap;
use log::{debug, info, warn};
use serde::Serialize;

/// Outcome of one successful iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub x_in: f64,
    pub x_out: f64,
    pub error_percent: f64,
    /// Cobweb points drawn by this step: previous path end, `(x_in, x_out)`,
    /// `(x_out, x_out)`.
    pub segment: [CobwebPoint; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    Converged,
    IterationLimit,
    Failed(EngineError),
}

/// Everything one `run_auto` call produced, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub steps: Vec<StepRecord>,
    pub stop: StopReason,
}

impl RunReport {
    pub fn last_step(&self) -> Option<&StepRecord> {
        self.steps.last()
    }

    pub fn converged(&self) -> bool {
        matches!(self.stop, StopReason::Converged)
    }

    pub fn error(&self) -> Option<&EngineError> {
        match &self.stop {
            StopReason::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Computes `g(x_in)` under the divergence and finiteness guards.
pub fn iterate_once<M: UnaryMap + ?Sized>(
    map: &M,
    x_in: f64,
    divergence_bound: f64,
) -> Result<f64, EngineError> {
    if exceeds_bound(x_in, divergence_bound) {
        return Err(EngineError::Overflow {
            magnitude: x_in.abs(),
            bound: divergence_bound,
        });
    }
    let x_out = map.apply(x_in)?;
    if !x_out.is_finite() {
        return Err(EngineError::domain(format!(
            "g({x_in}) is not a finite real number"
        )));
    }
    Ok(x_out)
}

#[derive(Debug)]
struct Session {
    function: CompiledFunction,
    current_x: f64,
    step_count: usize,
    last_error_percent: Option<f64>,
    history: CobwebTrace,
}

#[derive(Debug, Default)]
pub struct IterationEngine {
    settings: EngineSettings,
    session: Option<Session>,
}

impl IterationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Compiles `expression`, parses `x0` and probes `g(x0)` once.
    ///
    /// On success the engine is ready with `current_x == x0`, no steps and a
    /// trace holding only the seed `(x0, 0)`. On failure the engine is left
    /// uninitialized.
    pub fn initialize(&mut self, expression: &str, x0: &str) -> Result<(), EngineError> {
        self.session = None;

        let session = Self::seed(expression, x0).map_err(|err| {
            warn!("initialize rejected g(x) = {expression:?}, x0 = {x0:?}: {err}");
            err
        })?;

        info!(
            "initialized g(x) = {}, x0 = {}",
            session.function.source(),
            session.current_x
        );
        self.session = Some(session);
        Ok(())
    }

    fn seed(expression: &str, x0: &str) -> Result<Session, EngineError> {
        let function = compile(expression)?;
        let x0 = parse_real("x0", x0)?;

        let probe = function.evaluate(x0)?;
        if !probe.is_finite() {
            return Err(EngineError::domain(format!(
                "g({x0}) is not a finite real number"
            )));
        }

        Ok(Session {
            function,
            current_x: x0,
            step_count: 0,
            last_error_percent: None,
            history: CobwebTrace::seeded(x0),
        })
    }

    /// Advances one iteration `x_{n+1} = g(x_n)`.
    pub fn step(&mut self) -> Result<StepRecord, EngineError> {
        let bound = self.settings.divergence_bound;
        let session = self.session.as_mut().ok_or(EngineError::NotInitialized)?;

        let x_in = session.current_x;
        let x_out = iterate_once(&session.function, x_in, bound).map_err(|err| {
            warn!("step {} failed at x = {x_in}: {err}", session.step_count + 1);
            err
        })?;
        let error_percent = relative_error_percent(x_in, x_out);

        let segment = session.history.push_step(x_in, x_out);
        session.step_count += 1;
        session.current_x = x_out;
        session.last_error_percent = Some(error_percent);

        debug!(
            "step {}: {x_in} -> {x_out} (error {error_percent}%)",
            session.step_count
        );

        Ok(StepRecord {
            step: session.step_count,
            x_in,
            x_out,
            error_percent,
            segment,
        })
    }

    /// Steps until the error drops below `tolerance`, a step fails, or
    /// `max_iterations` additional steps were taken.
    pub fn run_auto(
        &mut self,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<RunReport, EngineError> {
        let settings = RunSettings::new(tolerance, max_iterations)?;
        self.run_with(&settings)
    }

    pub fn run_with(&mut self, settings: &RunSettings) -> Result<RunReport, EngineError> {
        settings.validate()?;
        if self.session.is_none() {
            return Err(EngineError::NotInitialized);
        }

        let mut steps = Vec::new();
        let mut stop = StopReason::IterationLimit;

        for _ in 0..settings.max_iterations {
            match self.step() {
                Ok(record) => {
                    let done =
                        is_converged(record.error_percent, settings.tolerance, record.step);
                    steps.push(record);
                    if done {
                        stop = StopReason::Converged;
                        break;
                    }
                }
                Err(err) => {
                    stop = StopReason::Failed(err);
                    break;
                }
            }
        }

        info!(
            "run finished after {} step(s): {:?}",
            steps.len(),
            stop
        );
        Ok(RunReport { steps, stop })
    }

    /// Drops the session; the engine is uninitialized afterwards.
    pub fn reset(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("reset after {} step(s)", session.step_count);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// The g(x) text given to the last successful initialize, or `""`.
    pub fn expression(&self) -> &str {
        self.session
            .as_ref()
            .map(|s| s.function.source())
            .unwrap_or("")
    }

    pub fn function(&self) -> Option<&CompiledFunction> {
        self.session.as_ref().map(|s| &s.function)
    }

    pub fn current_x(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.current_x)
    }

    pub fn step_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.step_count)
    }

    pub fn last_error_percent(&self) -> Option<f64> {
        self.session.as_ref().and_then(|s| s.last_error_percent)
    }

    pub fn history(&self) -> &[CobwebPoint] {
        self.session
            .as_ref()
            .map(|s| s.history.points())
            .unwrap_or(&[])
    }

    pub fn trace(&self) -> Option<&CobwebTrace> {
        self.session.as_ref().map(|s| &s.history)
    }

    /// Whether the most recent step met `tolerance`.
    pub fn has_converged(&self, tolerance: f64) -> bool {
        match self.session.as_ref() {
            Some(s) => s
                .last_error_percent
                .is_some_and(|err| is_converged(err, tolerance, s.step_count)),
            None => false,
        }
    }
}

fn parse_real(field: &'static str, text: &str) -> Result<f64, EngineError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(EngineError::invalid_number(field, trimmed)),
    }
}
