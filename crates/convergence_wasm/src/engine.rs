//! Session object driven by the dashboard.

use crate::views::{history_pairs, run_views, InitReply, StepView};
use anyhow::{anyhow, Result};
use convergence_core::plot::{display_range, sample_curve, CurveSample, DisplayRange, DEFAULT_PADDING};
use convergence_core::table::{FormattedRow, HistoryTable};
use convergence_core::IterationEngine;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmEngine {
    pub(crate) engine: IterationEngine,
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

impl WasmEngine {
    pub(crate) fn initialize_reply(&mut self, expression: &str, x0: &str) -> InitReply {
        InitReply::from_result(self.engine.initialize(expression, x0))
    }

    /// `None` while uninitialized: the dashboard keeps its step button
    /// disabled in that state, so there is nothing to render.
    pub(crate) fn step_view(&mut self) -> Option<StepView> {
        if !self.engine.is_initialized() {
            return None;
        }
        Some(StepView::from_result(&self.engine.step()))
    }

    /// Rejected settings come back as a one-element run holding the failure,
    /// the same shape as a run that stops on a failing step.
    pub(crate) fn run_auto_views(
        &mut self,
        tolerance: f64,
        max_iterations: usize,
    ) -> Option<Vec<StepView>> {
        if !self.engine.is_initialized() {
            return None;
        }
        match self.engine.run_auto(tolerance, max_iterations) {
            Ok(report) => Some(run_views(&report)),
            Err(err) => Some(vec![StepView::from(&err)]),
        }
    }

    pub(crate) fn table_rows(&self, decimals: usize) -> Result<Vec<FormattedRow>> {
        match self.engine.trace() {
            Some(trace) => HistoryTable::from_trace(trace).format(decimals),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn current_range(&self) -> Option<DisplayRange> {
        self.engine
            .trace()
            .and_then(|trace| display_range(trace, DEFAULT_PADDING))
    }

    pub(crate) fn curve(&self, samples: usize) -> Result<Vec<CurveSample>> {
        let function = self
            .engine
            .function()
            .ok_or_else(|| anyhow!("Engine is not initialized."))?;
        let range = self
            .current_range()
            .ok_or_else(|| anyhow!("No history to derive a display range from."))?;
        sample_curve(function, range, samples)
    }
}

#[wasm_bindgen]
impl WasmEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmEngine {
        console_error_panic_hook::set_once();
        WasmEngine {
            engine: IterationEngine::new(),
        }
    }

    /// Returns `{ ok, message, kind? }`.
    pub fn initialize(&mut self, expression: &str, x0: &str) -> Result<JsValue, JsValue> {
        let reply = self.initialize_reply(expression, x0);
        to_js(&reply)
    }

    pub fn step(&mut self) -> Result<JsValue, JsValue> {
        match self.step_view() {
            Some(view) => to_js(&view),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    pub fn run_auto(&mut self, tolerance: f64, max_iterations: usize) -> Result<JsValue, JsValue> {
        match self.run_auto_views(tolerance, max_iterations) {
            Some(views) => to_js(&views),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn history(&self) -> Result<JsValue, JsValue> {
        to_js(&history_pairs(self.engine.history()))
    }

    pub fn expression(&self) -> String {
        self.engine.expression().to_string()
    }

    pub fn current_x(&self) -> Option<f64> {
        self.engine.current_x()
    }

    pub fn step_count(&self) -> usize {
        self.engine.step_count()
    }

    pub fn last_error(&self) -> Option<f64> {
        self.engine.last_error_percent()
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_initialized()
    }

    pub fn has_converged(&self, tolerance: f64) -> bool {
        self.engine.has_converged(tolerance)
    }

    pub fn history_table(&self, decimals: usize) -> Result<JsValue, JsValue> {
        let rows = self.table_rows(decimals).map_err(to_js_error)?;
        to_js(&rows)
    }

    pub fn display_range(&self) -> Result<JsValue, JsValue> {
        to_js(&self.current_range())
    }

    pub fn sample_curve(&self, samples: usize) -> Result<JsValue, JsValue> {
        let curve = self.curve(samples).map_err(to_js_error)?;
        to_js(&curve)
    }
}

impl Default for WasmEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convergence_core::ErrorKind;

    fn ready(expression: &str, x0: &str) -> WasmEngine {
        let mut engine = WasmEngine::new();
        let reply = engine.initialize_reply(expression, x0);
        assert!(reply.ok, "initialize failed: {}", reply.message);
        engine
    }

    #[test]
    fn wasm_engine_step_before_initialize_is_a_no_op() {
        let mut engine = WasmEngine::new();
        assert!(engine.step_view().is_none());
        assert!(engine.run_auto_views(0.1, 10).is_none());
        assert_eq!(engine.step_count(), 0);
    }

    #[test]
    fn wasm_engine_initialize_reports_failure_kind() {
        let mut engine = WasmEngine::new();
        let reply = engine.initialize_reply("foo(x)", "1");
        assert!(!reply.ok);
        assert_eq!(reply.kind, Some(ErrorKind::UnknownName));
        assert!(reply.message.contains("foo"));
        assert!(!engine.is_initialized());
    }

    #[test]
    fn wasm_engine_step_returns_record_with_cobweb_points() {
        let mut engine = ready("x / 2", "4");
        let view = engine.step_view().expect("initialized");
        assert_eq!(
            view,
            StepView::Record {
                step: 1,
                x_in: 4.0,
                x_out: 2.0,
                error: 100.0,
                points: [[4.0, 0.0], [4.0, 2.0], [2.0, 2.0]],
            }
        );
        assert_eq!(engine.current_x(), Some(2.0));
        assert_eq!(engine.last_error(), Some(100.0));
    }

    #[test]
    fn wasm_engine_step_failure_is_a_failure_view() {
        let mut engine = ready("1 / (x - 1)", "2");
        engine.step_view().expect("2 -> 1");
        let view = engine.step_view().expect("initialized");
        assert_eq!(
            view,
            StepView::Failure {
                error_msg: "Division by zero.".to_string(),
                kind: ErrorKind::DivisionByZero,
            }
        );
        assert_eq!(engine.step_count(), 1);
    }

    #[test]
    fn wasm_engine_run_auto_ends_with_failure_entry() {
        let mut engine = ready("2x", "1");
        let views = engine.run_auto_views(1e-9, 100).expect("initialized");
        assert_eq!(views.len(), 35);
        assert!(views[..34].iter().all(|v| !v.is_failure()));
        assert!(matches!(
            views.last(),
            Some(StepView::Failure {
                kind: ErrorKind::Overflow,
                ..
            })
        ));
    }

    #[test]
    fn wasm_engine_run_auto_reports_invalid_settings_as_failure() {
        let mut engine = ready("cos(x)", "0.5");
        for (tolerance, max_iterations) in [(0.0, 10), (-1.0, 10), (f64::NAN, 10), (0.1, 0)] {
            let views = engine
                .run_auto_views(tolerance, max_iterations)
                .expect("initialized");
            assert_eq!(views.len(), 1, "tolerance {tolerance}, max {max_iterations}");
            assert!(matches!(
                &views[0],
                StepView::Failure {
                    kind: ErrorKind::InvalidNumber,
                    ..
                }
            ));
        }
        assert_eq!(engine.step_count(), 0);
    }

    #[test]
    fn wasm_engine_exposes_table_range_and_curve() {
        let mut engine = ready("x / 2", "4");
        engine.step_view();
        engine.step_view();

        let rows = engine.table_rows(2).expect("rows");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].current_x, "1.00");
        assert!(engine.table_rows(21).is_err());

        let range = engine.current_range().expect("range");
        assert_eq!(range, DisplayRange { min: -1.0, max: 5.0 });

        let curve = engine.curve(3).expect("curve");
        assert_eq!(curve.len(), 3);
        assert_eq!(curve[1].y, Some(1.0));
    }

    #[test]
    fn wasm_engine_reset_clears_session() {
        let mut engine = ready("cos(x)", "0.5");
        engine.step_view();
        engine.reset();
        assert!(!engine.is_initialized());
        assert_eq!(engine.expression(), "");
        assert!(engine.table_rows(4).expect("empty").is_empty());
        assert!(engine.current_range().is_none());
        assert!(engine.curve(10).is_err());
    }
}
