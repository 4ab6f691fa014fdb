//! Sample and snapshot types shared by every stage of the pipeline.

use crate::core::error::{DaqError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds since the Unix epoch.
///
/// Kept as a float so timestamps can be averaged alongside values when the
/// long history compacts.
pub type Timestamp = f64;

/// One acquired reading: a timestamp and an ordered tuple of column values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    timestamp: Timestamp,
    values: Vec<f64>,
}

/// How a sample's arity was conformed to the configured column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityAdjustment {
    /// The sample already had the configured number of columns
    Exact,
    /// Extra trailing columns were dropped
    Truncated {
        /// Columns removed
        dropped: usize,
    },
    /// Missing trailing columns were filled with NaN
    Padded {
        /// Columns added
        added: usize,
    },
}

impl Sample {
    /// Creates a new sample after validation
    pub fn new(timestamp: Timestamp, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(DaqError::InvalidSample(
                "sample must carry at least one value".to_string(),
            ));
        }
        if !timestamp.is_finite() {
            return Err(DaqError::InvalidSample(format!(
                "timestamp must be finite, got {}",
                timestamp
            )));
        }
        Ok(Sample { timestamp, values })
    }

    /// Creates a single-column sample
    pub fn scalar(timestamp: Timestamp, value: f64) -> Result<Self> {
        Self::new(timestamp, vec![value])
    }

    /// Returns the acquisition timestamp
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns the column values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Truncates or NaN-pads the value tuple to exactly `columns` entries.
    pub fn conform(&mut self, columns: usize) -> ArityAdjustment {
        let arity = self.values.len();
        if arity > columns {
            self.values.truncate(columns);
            ArityAdjustment::Truncated {
                dropped: arity - columns,
            }
        } else if arity < columns {
            self.values.resize(columns, f64::NAN);
            ArityAdjustment::Padded {
                added: columns - arity,
            }
        } else {
            ArityAdjustment::Exact
        }
    }

    /// Time column followed by the value columns, the row layout the histories fold.
    pub fn row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.values.len() + 1);
        row.push(self.timestamp);
        row.extend_from_slice(&self.values);
        row
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.timestamp)?;
        for value in &self.values {
            write!(f, "\t{}", value)?;
        }
        Ok(())
    }
}

/// Owned, point-in-time copy of a history view.
///
/// `times` and every entry of `columns` have the same length when taken from
/// the store; renderers still trim defensively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Shared time axis
    pub times: Vec<Timestamp>,
    /// One sequence per value column
    pub columns: Vec<Vec<f64>>,
}

impl HistorySnapshot {
    /// Builds a snapshot from row-layout columns where index 0 is time.
    pub fn from_time_major(mut columns: Vec<Vec<f64>>) -> Self {
        if columns.is_empty() {
            return Self::default();
        }
        let times = columns.remove(0);
        HistorySnapshot { times, columns }
    }

    /// Number of points on the time axis
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True before any sample has been folded in
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of value columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_requires_values() {
        assert!(Sample::new(1.0, vec![]).is_err());
        assert!(Sample::new(f64::NAN, vec![1.0]).is_err());
        assert!(Sample::new(1.0, vec![f64::NAN]).is_ok());
    }

    #[test]
    fn test_conform_truncates_and_pads() {
        let mut wide = Sample::new(1.0, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(wide.conform(2), ArityAdjustment::Truncated { dropped: 1 });
        assert_eq!(wide.values(), &[1.0, 2.0]);

        let mut narrow = Sample::scalar(1.0, 5.0).unwrap();
        assert_eq!(narrow.conform(3), ArityAdjustment::Padded { added: 2 });
        assert_eq!(narrow.values()[0], 5.0);
        assert!(narrow.values()[1].is_nan());
        assert!(narrow.values()[2].is_nan());

        let mut exact = Sample::scalar(1.0, 5.0).unwrap();
        assert_eq!(exact.conform(1), ArityAdjustment::Exact);
    }

    #[test]
    fn test_row_puts_time_first() {
        let sample = Sample::new(10.5, vec![1.0, 2.0]).unwrap();
        assert_eq!(sample.row(), vec![10.5, 1.0, 2.0]);
    }

    #[test]
    fn test_snapshot_from_time_major() {
        let snapshot =
            HistorySnapshot::from_time_major(vec![vec![1.0, 2.0], vec![10.0, 20.0]]);
        assert_eq!(snapshot.times, vec![1.0, 2.0]);
        assert_eq!(snapshot.columns, vec![vec![10.0, 20.0]]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.column_count(), 1);
        assert!(HistorySnapshot::from_time_major(Vec::new()).is_empty());
    }
}
