//! The closed set of names an expression may reference.

use crate::error::EngineError;

/// Namespaces accepted as qualifiers in front of a whitelisted name,
/// e.g. `np.cos(x)` or `math.pi`.
pub const NAMESPACES: &[&str] = &["np", "numpy", "math"];

/// Identifiers that are never resolved, regardless of position.
const RESERVED: &[&str] = &[
    "import", "from", "lambda", "eval", "exec", "open", "compile", "globals", "locals",
    "getattr", "setattr", "delattr", "vars", "dir", "os", "sys", "subprocess", "builtins",
    "input", "print", "type", "object", "class", "def", "del", "exit", "quit",
];

pub const VARIABLE: &str = "x";

pub fn is_namespace(name: &str) -> bool {
    NAMESPACES.contains(&name)
}

pub fn is_reserved(name: &str) -> bool {
    name.contains("__") || RESERVED.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    Cbrt,
    Log,
    Log10,
    Log2,
    Exp,
    Abs,
}

impl Function {
    pub fn lookup(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" | "arcsin" => Function::Asin,
            "acos" | "arccos" => Function::Acos,
            "atan" | "arctan" => Function::Atan,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "sqrt" => Function::Sqrt,
            "cbrt" => Function::Cbrt,
            "log" => Function::Log,
            "log10" => Function::Log10,
            "log2" => Function::Log2,
            "exp" => Function::Exp,
            "abs" => Function::Abs,
            _ => return None,
        };
        Some(function)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Sqrt => "sqrt",
            Function::Cbrt => "cbrt",
            Function::Log => "log",
            Function::Log10 => "log10",
            Function::Log2 => "log2",
            Function::Exp => "exp",
            Function::Abs => "abs",
        }
    }

    /// Applies the function, rejecting arguments outside its real domain.
    /// `log` is the natural logarithm.
    pub fn apply(self, a: f64) -> Result<f64, EngineError> {
        match self {
            Function::Sqrt if a < 0.0 => {
                return Err(EngineError::domain(format!(
                    "sqrt of negative number {a}"
                )))
            }
            Function::Log | Function::Log10 | Function::Log2 if a <= 0.0 => {
                return Err(EngineError::domain(format!(
                    "{} of non-positive number {a}",
                    self.name()
                )))
            }
            Function::Asin | Function::Acos if !(-1.0..=1.0).contains(&a) => {
                return Err(EngineError::domain(format!(
                    "{} argument {a} outside [-1, 1]",
                    self.name()
                )))
            }
            _ => {}
        }

        let value = match self {
            Function::Sin => a.sin(),
            Function::Cos => a.cos(),
            Function::Tan => a.tan(),
            Function::Asin => a.asin(),
            Function::Acos => a.acos(),
            Function::Atan => a.atan(),
            Function::Sinh => a.sinh(),
            Function::Cosh => a.cosh(),
            Function::Tanh => a.tanh(),
            Function::Sqrt => a.sqrt(),
            Function::Cbrt => a.cbrt(),
            Function::Log => a.ln(),
            Function::Log10 => a.log10(),
            Function::Log2 => a.log2(),
            Function::Exp => a.exp(),
            Function::Abs => a.abs(),
        };
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "pi" => Some(Constant::Pi),
            "e" => Some(Constant::E),
            _ => None,
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
        }
    }
}
