use crate::convergence::relative_error_percent;
use crate::trace::CobwebTrace;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Largest number of decimals the table formatter accepts.
pub const MAX_DECIMALS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub iteration: usize,
    pub previous_x: f64,
    pub current_x: f64,
    pub error_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRow {
    pub iteration: String,
    pub previous_x: String,
    pub current_x: String,
    pub error_percent: String,
}

/// Tabular view of an iteration, one row per step plus the seed row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryTable {
    pub rows: Vec<HistoryRow>,
}

impl HistoryTable {
    /// Rebuilds the table from a cobweb trace. Row 0 is the starting guess
    /// with zero error; the error of every other row is recomputed from its
    /// iterates.
    pub fn from_trace(trace: &CobwebTrace) -> Self {
        let Some(seed) = trace.seed() else {
            return Self::default();
        };

        let mut rows = vec![HistoryRow {
            iteration: 0,
            previous_x: seed.x,
            current_x: seed.x,
            error_percent: 0.0,
        }];
        rows.extend(trace.steps().enumerate().map(|(i, (x_in, x_out))| HistoryRow {
            iteration: i + 1,
            previous_x: x_in,
            current_x: x_out,
            error_percent: relative_error_percent(x_in, x_out),
        }));
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn format(&self, decimals: usize) -> Result<Vec<FormattedRow>> {
        if decimals > MAX_DECIMALS {
            bail!("Decimal places must be between 0 and {MAX_DECIMALS}, got {decimals}.");
        }
        Ok(self
            .rows
            .iter()
            .map(|row| FormattedRow {
                iteration: row.iteration.to_string(),
                previous_x: format!("{:.*}", decimals, row.previous_x),
                current_x: format!("{:.*}", decimals, row.current_x),
                error_percent: format!("{:.*}", decimals, row.error_percent),
            })
            .collect())
    }
}
