use super::parser::{BinaryOp, Expr};
use super::symbols::Function;
use crate::error::EngineError;

/// OpCodes for the stack-based virtual machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant onto the stack.
    LoadConst(f64),
    /// Pushes the iteration variable `x` onto the stack.
    LoadX,
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top two values (b, a), pushes (a / b).
    Div,
    /// Pops top two values (b, a), pushes (a ^ b).
    Pow,
    /// Pops top value (a), pushes -a.
    Neg,
    /// Pops top value (a), pushes f(a).
    Call(Function),
}

/// A compiled sequence of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

impl Bytecode {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Deepest stack the program can reach; used to size the VM buffer.
    pub fn max_stack_depth(&self) -> usize {
        let mut depth = 0usize;
        let mut max = 0usize;
        for op in &self.ops {
            match op {
                OpCode::LoadConst(_) | OpCode::LoadX => depth += 1,
                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Pow => {
                    depth = depth.saturating_sub(1)
                }
                OpCode::Neg | OpCode::Call(_) => {}
            }
            max = max.max(depth);
        }
        max
    }
}

/// Compiles a resolved AST into `Bytecode`.
pub struct Compiler;

impl Compiler {
    pub fn compile(expr: &Expr) -> Bytecode {
        let mut ops = Vec::new();
        Self::compile_recursive(expr, &mut ops);
        Bytecode { ops }
    }

    fn compile_recursive(expr: &Expr, ops: &mut Vec<OpCode>) {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Constant(c) => ops.push(OpCode::LoadConst(c.value())),
            Expr::Variable => ops.push(OpCode::LoadX),
            Expr::Binary(left, op, right) => {
                Self::compile_recursive(left, ops);
                Self::compile_recursive(right, ops);
                ops.push(match op {
                    BinaryOp::Add => OpCode::Add,
                    BinaryOp::Sub => OpCode::Sub,
                    BinaryOp::Mul => OpCode::Mul,
                    BinaryOp::Div => OpCode::Div,
                    BinaryOp::Pow => OpCode::Pow,
                });
            }
            Expr::Neg(operand) => {
                Self::compile_recursive(operand, ops);
                ops.push(OpCode::Neg);
            }
            Expr::Call(function, arg) => {
                Self::compile_recursive(arg, ops);
                ops.push(OpCode::Call(*function));
            }
        }
    }
}

/// Stack-based virtual machine with checked arithmetic.
///
/// Every intermediate value is finite; the first operation that would leave
/// the reals (division by zero, a domain violation, overflow to infinity)
/// aborts evaluation with the matching [`EngineError`].
pub struct VM;

impl VM {
    pub fn execute(bytecode: &Bytecode, x: f64, stack: &mut Vec<f64>) -> Result<f64, EngineError> {
        stack.clear();

        for op in &bytecode.ops {
            match op {
                OpCode::LoadConst(val) => stack.push(*val),
                OpCode::LoadX => stack.push(x),
                OpCode::Add => apply_binary(stack, BinaryOp::Add)?,
                OpCode::Sub => apply_binary(stack, BinaryOp::Sub)?,
                OpCode::Mul => apply_binary(stack, BinaryOp::Mul)?,
                OpCode::Div => apply_binary(stack, BinaryOp::Div)?,
                OpCode::Pow => apply_binary(stack, BinaryOp::Pow)?,
                OpCode::Neg => {
                    let a = pop(stack)?;
                    stack.push(-a);
                }
                OpCode::Call(function) => {
                    let a = pop(stack)?;
                    stack.push(checked(function.apply(a)?)?);
                }
            }
        }

        let result = pop(stack)?;
        if !stack.is_empty() {
            return Err(EngineError::syntax("Malformed bytecode: values left on stack"));
        }
        Ok(result)
    }
}

fn pop(stack: &mut Vec<f64>) -> Result<f64, EngineError> {
    stack
        .pop()
        .ok_or_else(|| EngineError::syntax("Malformed bytecode: stack underflow"))
}

fn apply_binary(stack: &mut Vec<f64>, op: BinaryOp) -> Result<(), EngineError> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    stack.push(checked(binary(op, a, b)?)?);
    Ok(())
}

fn binary(op: BinaryOp, a: f64, b: f64) -> Result<f64, EngineError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EngineError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EngineError::DivisionByZero);
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(EngineError::domain(format!(
                    "negative number {a} raised to fractional power {b}"
                )));
            }
            a.powf(b)
        }
    };
    Ok(value)
}

fn checked(value: f64) -> Result<f64, EngineError> {
    if value.is_nan() {
        Err(EngineError::domain("result is not a real number"))
    } else if value.is_infinite() {
        Err(EngineError::Overflow {
            magnitude: value.abs(),
            bound: f64::MAX,
        })
    } else {
        Ok(value)
    }
}
