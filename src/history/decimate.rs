//! Long history: bounded, adaptively decimated view over an unbounded run.
//!
//! Each column holds at most `capacity` buckets. A bucket is the running mean
//! of `denom` consecutive rows once full, or of `count < denom` rows while the
//! newest bucket is still filling. When a new bucket is needed but the columns
//! are full, adjacent buckets are averaged pairwise, halving the bucket count
//! and doubling `denom`. Older data therefore loses resolution geometrically
//! while memory stays O(capacity) per column.
//!
//! All columns advance in lockstep; the history store feeds the time column as
//! column 0 so the time axis is decimated exactly like the values.

use crate::core::{DaqError, Result};

/// Emitted whenever a push triggers a compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compaction {
    /// Rows per full bucket after the compaction
    pub denom: u64,
    /// Buckets per column after the compaction
    pub buckets: usize,
}

/// Decimated per-column history.
#[derive(Debug, Clone)]
pub struct LongHistory {
    capacity: usize,
    columns: Vec<Vec<f64>>,
    denom: u64,
    count: u64,
}

impl LongHistory {
    /// Create an empty history with `columns` lockstep columns of at most
    /// `capacity` buckets each.
    pub fn new(capacity: usize, columns: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DaqError::config("long history capacity must be at least 1"));
        }
        if columns == 0 {
            return Err(DaqError::config("long history needs at least one column"));
        }
        Ok(Self {
            capacity,
            columns: vec![Vec::with_capacity(capacity); columns],
            denom: 1,
            count: 0,
        })
    }

    /// Fold one row (one value per column) into the history.
    ///
    /// `row` must have exactly one entry per column; anything else is
    /// rejected with [`DaqError::InvalidSample`] and leaves the history as is.
    pub fn push(&mut self, row: &[f64]) -> Result<Option<Compaction>> {
        if row.len() != self.columns.len() {
            return Err(DaqError::InvalidSample(format!(
                "row has {} values, long history has {} columns",
                row.len(),
                self.columns.len()
            )));
        }

        if self.count != 0 && self.count != self.denom {
            // Newest bucket is still filling: online running mean.
            let n = self.count as f64;
            for (column, &value) in self.columns.iter_mut().zip(row) {
                if let Some(bucket) = column.last_mut() {
                    *bucket = (n * *bucket + value) / (n + 1.0);
                }
            }
            self.count += 1;
            return Ok(None);
        }

        if self.len() < self.capacity {
            for (column, &value) in self.columns.iter_mut().zip(row) {
                column.push(value);
            }
            self.count = 1;
            return Ok(None);
        }

        Ok(Some(self.compact(row)))
    }

    fn compact(&mut self, row: &[f64]) -> Compaction {
        let buckets = self.len();
        let odd = buckets % 2 == 1;

        let compacted: Vec<Vec<f64>> = self
            .columns
            .iter()
            .zip(row)
            .map(|(column, &value)| {
                let mut next = Vec::with_capacity(self.capacity);
                next.extend(column.chunks_exact(2).map(|pair| (pair[0] + pair[1]) / 2.0));
                match column.last() {
                    // The unpaired bucket absorbs the incoming row.
                    Some(&last) if odd => next.push((last + value) / 2.0),
                    _ => next.push(value),
                }
                next
            })
            .collect();

        self.columns = compacted;
        self.count = if odd { 2 } else { 1 };
        self.denom = self.denom.saturating_mul(2);

        Compaction {
            denom: self.denom,
            buckets: self.len(),
        }
    }

    /// Buckets per column
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// True before the first push
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows represented by one full bucket
    pub fn denom(&self) -> u64 {
        self.denom
    }

    /// Rows folded into the newest bucket
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Bucket values, one vector per column
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn feed(history: &mut LongHistory, values: &[f64]) {
        for &value in values {
            history.push(&[value]).unwrap();
        }
    }

    #[test]
    fn test_fill_then_compact_then_fold() {
        let mut history = LongHistory::new(4, 1).unwrap();

        feed(&mut history, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(history.columns()[0], vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(history.denom(), 1);

        let compaction = history.push(&[5.0]).unwrap();
        assert_eq!(compaction, Some(Compaction { denom: 2, buckets: 3 }));
        assert_eq!(history.columns()[0], vec![1.5, 3.5, 5.0]);
        assert_eq!(history.count(), 1);

        assert_eq!(history.push(&[6.0]).unwrap(), None);
        assert_eq!(history.columns()[0], vec![1.5, 3.5, 5.5]);
        assert_eq!(history.count(), 2);
    }

    #[test]
    fn test_second_compaction_yields_exact_means() {
        let mut history = LongHistory::new(4, 1).unwrap();
        let raw: Vec<f64> = (1..=9).map(f64::from).collect();
        feed(&mut history, &raw);

        // 1..4 and 5..8 collapse into two buckets of four, 9 starts a new one.
        assert_eq!(history.columns()[0], vec![2.5, 6.5, 9.0]);
        assert_eq!(history.denom(), 4);
        assert_eq!(history.count(), 1);
    }

    #[test]
    fn test_odd_capacity_merges_unpaired_bucket() {
        let mut history = LongHistory::new(3, 1).unwrap();
        feed(&mut history, &[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(history.columns()[0], vec![1.5, 3.5]);
        assert_eq!(history.denom(), 2);
        assert_eq!(history.count(), 2);

        // count == denom, room for one more bucket
        history.push(&[10.0]).unwrap();
        assert_eq!(history.columns()[0], vec![1.5, 3.5, 10.0]);
        assert_eq!(history.count(), 1);
    }

    #[test]
    fn test_capacity_one() {
        let mut history = LongHistory::new(1, 1).unwrap();
        history.push(&[2.0]).unwrap();
        assert_eq!(history.columns()[0], vec![2.0]);

        history.push(&[4.0]).unwrap();
        assert_eq!(history.columns()[0], vec![3.0]);
        assert_eq!(history.denom(), 2);
        assert_eq!(history.count(), 2);

        history.push(&[5.0]).unwrap();
        assert_eq!(history.columns()[0], vec![4.0]);
        assert_eq!(history.denom(), 4);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_row_width_mismatch_rejected() {
        let mut history = LongHistory::new(4, 2).unwrap();
        history.push(&[1.0, 10.0]).unwrap();

        let err = history.push(&[2.0]).unwrap_err();
        assert_eq!(err.category(), "validation");
        assert!(history.push(&[3.0, 30.0, 300.0]).is_err());

        assert_eq!(history.columns(), &[vec![1.0], vec![10.0]]);
        assert_eq!(history.count(), 1);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(LongHistory::new(0, 1).is_err());
        assert!(LongHistory::new(4, 0).is_err());
    }

    #[test]
    fn test_columns_move_in_lockstep() {
        let mut history = LongHistory::new(2, 3).unwrap();
        for i in 0..7 {
            let t = f64::from(i);
            history.push(&[t, t * 10.0, -t]).unwrap();
        }
        let lens: Vec<usize> = history.columns().iter().map(Vec::len).collect();
        assert_eq!(lens, vec![history.len(); 3]);
        for (time, value) in history.columns()[0].iter().zip(&history.columns()[1]) {
            assert!((value - time * 10.0).abs() < 1e-9);
        }
    }

    /// Arithmetic mean of a raw slice
    fn mean(raw: &[f64]) -> f64 {
        raw.iter().sum::<f64>() / raw.len() as f64
    }

    proptest! {
        #[test]
        fn length_never_exceeds_capacity(
            capacity in 1usize..40,
            values in prop::collection::vec(-1000.0f64..1000.0, 0..400),
        ) {
            let mut history = LongHistory::new(capacity, 2).unwrap();
            for value in values {
                history.push(&[value, -value]).unwrap();
                prop_assert!(history.len() <= capacity);
                prop_assert_eq!(history.columns()[0].len(), history.columns()[1].len());
                prop_assert!(history.count() >= 1 && history.count() <= history.denom());
            }
        }

        #[test]
        fn even_capacity_buckets_are_exact_means(
            half in 1usize..16,
            raw in prop::collection::vec(-100i32..100, 1..300),
        ) {
            let capacity = half * 2;
            let raw: Vec<f64> = raw.into_iter().map(f64::from).collect();
            let mut history = LongHistory::new(capacity, 1).unwrap();
            feed(&mut history, &raw);

            let denom = usize::try_from(history.denom()).unwrap();
            let buckets = &history.columns()[0];
            for (i, bucket) in buckets.iter().enumerate() {
                let start = i * denom;
                let end = if i + 1 == buckets.len() { raw.len() } else { start + denom };
                prop_assert!((bucket - mean(&raw[start..end])).abs() < 1e-6);
            }
            let newest = usize::try_from(history.count()).unwrap();
            prop_assert_eq!((buckets.len() - 1) * denom + newest, raw.len());
        }
    }
}
