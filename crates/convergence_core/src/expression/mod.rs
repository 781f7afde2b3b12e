//! Expression compiler: turns user text for g(x) into a checked bytecode
//! program over a closed set of symbols.
//!
//! Pipeline: [`preprocess`] (implied multiplication) -> tokenize -> security
//! screen -> [`parse`] (names resolved against the whitelist) ->
//! [`Compiler`] -> [`VM`]. There is no path from user text to anything but
//! arithmetic on `x` and the whitelisted functions and constants.

mod parser;
pub mod symbols;
mod vm;

pub use parser::{parse, preprocess, BinaryOp, Expr, MAX_DEPTH};
pub use vm::{Bytecode, Compiler, OpCode, VM};

use crate::error::EngineError;
use crate::traits::UnaryMap;
use std::cell::RefCell;

/// A validated, compiled g(x).
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    source: String,
    normalized: String,
    bytecode: Bytecode,
    // Interior mutability for the VM stack to avoid allocation per call.
    // This makes the function !Sync, which matches the single-session model.
    stack: RefCell<Vec<f64>>,
}

impl CompiledFunction {
    /// The expression exactly as the user typed it.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The expression after implied multiplications were inserted.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    pub fn evaluate(&self, x: f64) -> Result<f64, EngineError> {
        let mut stack = self.stack.borrow_mut();
        VM::execute(&self.bytecode, x, &mut stack)
    }
}

impl UnaryMap for CompiledFunction {
    fn apply(&self, x: f64) -> Result<f64, EngineError> {
        self.evaluate(x)
    }
}

/// Compiles `expression` into an evaluable function of `x`.
pub fn compile(expression: &str) -> Result<CompiledFunction, EngineError> {
    if expression.trim().is_empty() {
        return Err(EngineError::EmptyInput);
    }
    let normalized = preprocess(expression.trim());
    let expr = parse(&normalized)?;
    let bytecode = Compiler::compile(&expr);
    let stack = Vec::with_capacity(bytecode.max_stack_depth());
    Ok(CompiledFunction {
        source: expression.to_string(),
        normalized,
        bytecode,
        stack: RefCell::new(stack),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_same_values(a: &str, b: &str) {
        let fa = compile(a).expect("compile a");
        let fb = compile(b).expect("compile b");
        for x in [-3.0, -1.5, 0.0, 0.25, 1.0, 2.0, 10.0] {
            assert_eq!(fa.evaluate(x), fb.evaluate(x), "{a} vs {b} at x = {x}");
        }
    }

    #[test]
    fn blank_input_is_empty_input_error() {
        assert_eq!(compile("").unwrap_err(), EngineError::EmptyInput);
        assert_eq!(compile("   \t").unwrap_err(), EngineError::EmptyInput);
    }

    #[test]
    fn implied_multiplication_matches_explicit_form() {
        assert_same_values("2x+1", "2*x+1");
        assert_same_values("3(x)", "3*(x)");
        assert_same_values("(x+1)2", "(x+1)*2");
    }

    #[test]
    fn namespaced_names_match_bare_names() {
        assert_same_values("np.cos(x)", "cos(x)");
        assert_same_values("math.exp(-x) + numpy.pi", "exp(-x) + pi");
    }

    #[test]
    fn normalized_form_is_kept_for_display() {
        let f = compile(" 2x + 1 ").expect("compile");
        assert_eq!(f.source(), " 2x + 1 ");
        assert_eq!(f.normalized(), "2*x + 1");
    }

    #[test]
    fn unknown_function_names_the_identifier() {
        match compile("foo(x)") {
            Err(EngineError::UnknownName { name }) => assert_eq!(name, "foo"),
            other => panic!("expected UnknownName, got {other:?}"),
        }
    }

    #[test]
    fn evaluation_reports_domain_errors() {
        let f = compile("sqrt(x)").expect("compile");
        assert!(matches!(f.evaluate(-4.0), Err(EngineError::Domain { .. })));
        assert_eq!(f.evaluate(4.0), Ok(2.0));
    }

    #[test]
    fn reserved_constructs_are_rejected() {
        assert!(matches!(
            compile("__import__('os').system('ls')"),
            Err(EngineError::Security { .. })
        ));
    }
}
