use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every failure the iteration engine can report.
///
/// Errors are returned as values from `initialize`, `step` and `run_auto`;
/// none of them leaves the engine unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Function g(x) is empty.")]
    EmptyInput,

    #[error("Invalid {field}: '{value}' is not a valid number.")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Syntax error: {message}")]
    Syntax { message: String },

    #[error("Unknown name '{name}'.")]
    UnknownName { name: String },

    #[error("Disallowed construct '{construct}'.")]
    Security { construct: String },

    #[error("Math domain error: {message}")]
    Domain { message: String },

    #[error("Overflow: magnitude {magnitude:e} exceeds the bound {bound:e}.")]
    Overflow { magnitude: f64, bound: f64 },

    #[error("Division by zero.")]
    DivisionByZero,

    #[error("Engine is not initialized.")]
    NotInitialized,
}

/// Stable, UI-facing name of an [`EngineError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "EmptyInputError")]
    EmptyInput,
    #[serde(rename = "InvalidNumberError")]
    InvalidNumber,
    #[serde(rename = "SyntaxError")]
    Syntax,
    #[serde(rename = "UnknownNameError")]
    UnknownName,
    #[serde(rename = "SecurityError")]
    Security,
    #[serde(rename = "DomainError")]
    Domain,
    #[serde(rename = "OverflowError")]
    Overflow,
    #[serde(rename = "DivisionByZeroError")]
    DivisionByZero,
    #[serde(rename = "NotInitializedError")]
    NotInitialized,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EmptyInput => "EmptyInputError",
            ErrorKind::InvalidNumber => "InvalidNumberError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::UnknownName => "UnknownNameError",
            ErrorKind::Security => "SecurityError",
            ErrorKind::Domain => "DomainError",
            ErrorKind::Overflow => "OverflowError",
            ErrorKind::DivisionByZero => "DivisionByZeroError",
            ErrorKind::NotInitialized => "NotInitializedError",
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::EmptyInput => ErrorKind::EmptyInput,
            EngineError::InvalidNumber { .. } => ErrorKind::InvalidNumber,
            EngineError::Syntax { .. } => ErrorKind::Syntax,
            EngineError::UnknownName { .. } => ErrorKind::UnknownName,
            EngineError::Security { .. } => ErrorKind::Security,
            EngineError::Domain { .. } => ErrorKind::Domain,
            EngineError::Overflow { .. } => ErrorKind::Overflow,
            EngineError::DivisionByZero => ErrorKind::DivisionByZero,
            EngineError::NotInitialized => ErrorKind::NotInitialized,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        EngineError::Syntax {
            message: message.into(),
        }
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        EngineError::Domain {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_number(field: &'static str, value: impl Into<String>) -> Self {
        EngineError::InvalidNumber {
            field,
            value: value.into(),
        }
    }
}
