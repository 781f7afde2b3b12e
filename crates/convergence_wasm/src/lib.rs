//! WASM bridge exposing the iteration engine to the browser dashboard.

mod engine;
pub mod views;

pub use engine::WasmEngine;

use wasm_bindgen::prelude::*;

/// Shows the user how their input will be read, e.g. `2x+1` -> `2*x+1`.
#[wasm_bindgen]
pub fn preprocess_expression(expression: &str) -> String {
    convergence_core::preprocess(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_expression_inserts_implied_multiplication() {
        assert_eq!(preprocess_expression("3(x+1)2x"), "3*(x+1)*2*x");
    }
}
