//! Short history: the most recent raw rows, no aggregation.

use crate::core::{DaqError, Result};
use std::collections::VecDeque;

/// Fixed-capacity raw window, one bounded FIFO per column.
#[derive(Debug, Clone)]
pub struct ShortHistory {
    capacity: usize,
    columns: Vec<VecDeque<f64>>,
}

impl ShortHistory {
    /// Create an empty window holding at most `capacity` rows
    pub fn new(capacity: usize, columns: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DaqError::config("short history capacity must be at least 1"));
        }
        if columns == 0 {
            return Err(DaqError::config("short history needs at least one column"));
        }
        Ok(Self {
            capacity,
            columns: vec![VecDeque::with_capacity(capacity); columns],
        })
    }

    /// Append a row, dropping the oldest one at capacity. A row whose width
    /// differs from the column count is rejected.
    pub fn push(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DaqError::InvalidSample(format!(
                "row has {} values, short history has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (column, &value) in self.columns.iter_mut().zip(row) {
            if column.len() == self.capacity {
                column.pop_front();
            }
            column.push_back(value);
        }
        Ok(())
    }

    /// Rows currently held
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, VecDeque::len)
    }

    /// True before the first push
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned copy of every column, oldest first
    pub fn to_vecs(&self) -> Vec<Vec<f64>> {
        self.columns
            .iter()
            .map(|column| column.iter().copied().collect())
            .collect()
    }
}
