//! Plain records handed to the dashboard. Shapes follow what the UI table
//! and plot code read: `{ step, x_in, x_out, error, points }` for a step and
//! `{ error_msg, kind }` for a failure.

use convergence_core::{CobwebPoint, EngineError, ErrorKind, RunReport, StepRecord, StopReason};
use serde::Serialize;

pub const INIT_SUCCESS_MESSAGE: &str = "Initialization Successful.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitReply {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl InitReply {
    pub fn from_result(result: Result<(), EngineError>) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                message: INIT_SUCCESS_MESSAGE.to_string(),
                kind: None,
            },
            Err(err) => Self {
                ok: false,
                message: err.to_string(),
                kind: Some(err.kind()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepView {
    Record {
        step: usize,
        x_in: f64,
        x_out: f64,
        error: f64,
        points: [[f64; 2]; 3],
    },
    Failure {
        error_msg: String,
        kind: ErrorKind,
    },
}

fn pair(point: CobwebPoint) -> [f64; 2] {
    [point.x, point.y]
}

impl From<&StepRecord> for StepView {
    fn from(record: &StepRecord) -> Self {
        StepView::Record {
            step: record.step,
            x_in: record.x_in,
            x_out: record.x_out,
            error: record.error_percent,
            points: record.segment.map(pair),
        }
    }
}

impl From<&EngineError> for StepView {
    fn from(err: &EngineError) -> Self {
        StepView::Failure {
            error_msg: err.to_string(),
            kind: err.kind(),
        }
    }
}

impl StepView {
    pub fn from_result(result: &Result<StepRecord, EngineError>) -> Self {
        match result {
            Ok(record) => record.into(),
            Err(err) => err.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepView::Failure { .. })
    }
}

/// Flattens a run into the sequence the table consumes: every record in
/// order, then the failure if the run stopped on one.
pub fn run_views(report: &RunReport) -> Vec<StepView> {
    let mut views: Vec<StepView> = report.steps.iter().map(StepView::from).collect();
    if let StopReason::Failed(err) = &report.stop {
        views.push(err.into());
    }
    views
}

pub fn history_pairs(points: &[CobwebPoint]) -> Vec<[f64; 2]> {
    points.iter().copied().map(pair).collect()
}
