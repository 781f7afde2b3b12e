use crate::convergence::DIVERGENCE_BOUND;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Iterates with a larger magnitude are reported as divergent instead of
    /// being fed back into g.
    pub divergence_bound: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            divergence_bound: DIVERGENCE_BOUND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Stop once a step's relative error (percent) drops strictly below this.
    pub tolerance: f64,
    /// Upper bound on additional steps taken by one run.
    pub max_iterations: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            tolerance: 0.0001,
            max_iterations: 100,
        }
    }
}

impl RunSettings {
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self, EngineError> {
        let settings = Self {
            tolerance,
            max_iterations,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Builds settings from the raw text of the tolerance field.
    pub fn parse(tolerance: &str, max_iterations: usize) -> Result<Self, EngineError> {
        let trimmed = tolerance.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| EngineError::invalid_number("tolerance", trimmed))?;
        Self::new(value, max_iterations)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(EngineError::invalid_number(
                "tolerance",
                self.tolerance.to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(EngineError::invalid_number(
                "max_iterations",
                self.max_iterations.to_string(),
            ));
        }
        Ok(())
    }
}
