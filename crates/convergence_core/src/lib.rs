//! The `convergence_core` crate is the engine behind the Convergence Engine
//! fixed-point iteration explorer.
//!
//! Key components:
//! - **Expression**: preprocessing, parser and a checked bytecode VM that turn
//!   user text for g(x) into a safely evaluable function.
//! - **Engine**: the stateful `x_{n+1} = g(x_n)` iteration with atomic steps and
//!   bounded auto-runs.
//! - **Convergence**: relative error and divergence policy.
//! - **Trace / Plot / Table**: cobweb path and the data the UI draws from it.
pub mod convergence;
pub mod engine;
pub mod error;
pub mod expression;
pub mod plot;
pub mod settings;
pub mod table;
pub mod trace;
pub mod traits;

pub use engine::{IterationEngine, RunReport, StepRecord, StopReason};
pub use error::{EngineError, ErrorKind};
pub use expression::{compile, preprocess, CompiledFunction};
pub use settings::{EngineSettings, RunSettings};
pub use trace::{CobwebPoint, CobwebTrace};
