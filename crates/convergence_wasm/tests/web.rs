#![cfg(target_arch = "wasm32")]

use convergence_core::ErrorKind;
use convergence_wasm::WasmEngine;
use serde::Deserialize;
use wasm_bindgen_test::*;

#[derive(Deserialize)]
struct FailureEntry {
    error_msg: String,
    kind: ErrorKind,
}

#[wasm_bindgen_test]
fn step_before_initialize_returns_undefined() {
    let mut engine = WasmEngine::new();
    let value = engine.step().expect("step");
    assert!(value.is_undefined());
}

#[wasm_bindgen_test]
fn initialize_and_run_return_js_values() {
    let mut engine = WasmEngine::new();
    let reply = engine.initialize("cos(x)", "0.5").expect("initialize");
    assert!(reply.is_object());
    assert!(engine.is_initialized());

    let results = engine.run_auto(0.0001, 100).expect("run");
    assert!(results.is_object());
    assert!(engine.step_count() > 0);
    assert!(engine.has_converged(0.0001));
}

#[wasm_bindgen_test]
fn run_auto_with_bad_tolerance_returns_a_failure_entry() {
    let mut engine = WasmEngine::new();
    engine.initialize("x / 2", "1").expect("initialize");
    let value = engine.run_auto(-1.0, 10).expect("failure is a value");
    let entries: Vec<FailureEntry> =
        serde_wasm_bindgen::from_value(value).expect("one failure entry");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, ErrorKind::InvalidNumber);
    assert!(entries[0].error_msg.contains("tolerance"));
    assert_eq!(engine.step_count(), 0);
}
