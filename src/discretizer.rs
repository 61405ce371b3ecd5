//! Observation discretization.
//!
//! The discretizer maps a continuous observation vector to per-dimension
//! bucket indices and combines them into one integer state index. The
//! approximator never sees these indices; they exist for bookkeeping and for
//! deduplicating stored transitions.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{MetisError, Result};

// Nudges values sitting exactly on a bucket boundary down one bucket, so the
// top edge of the range still lands in the last bucket.
const BUCKET_EPS: f64 = 1e-8;

/// Per-dimension bucketing configuration: `disc_numbers[i]` buckets spanning
/// `[0, var_ranges[i]]` on dimension `i`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateDiscretizer {
    disc_numbers: Vec<usize>,
    var_ranges: Vec<f32>,
}

impl StateDiscretizer {
    pub fn new(disc_numbers: Vec<usize>, var_ranges: Vec<f32>) -> Result<Self> {
        if disc_numbers.len() != var_ranges.len() {
            return Err(MetisError::dimension_mismatch(
                format!("{} bucket counts", var_ranges.len()),
                format!("{} bucket counts", disc_numbers.len()),
            ));
        }
        if disc_numbers.is_empty() {
            return Err(MetisError::invalid_parameter(
                "disc_numbers",
                "at least one discretized dimension is required",
            ));
        }
        if disc_numbers.iter().any(|&n| n == 0) {
            return Err(MetisError::invalid_parameter(
                "disc_numbers",
                "every dimension needs at least one bucket",
            ));
        }
        if var_ranges.iter().any(|&r| !(r > 0.0)) {
            return Err(MetisError::invalid_parameter(
                "var_ranges",
                "variable ranges must be positive and finite",
            ));
        }
        Ok(StateDiscretizer {
            disc_numbers,
            var_ranges,
        })
    }

    /// Number of discretized dimensions.
    pub fn dims(&self) -> usize {
        self.disc_numbers.len()
    }

    pub fn disc_numbers(&self) -> &[usize] {
        &self.disc_numbers
    }

    pub fn var_ranges(&self) -> &[f32] {
        &self.var_ranges
    }

    /// Total number of distinct combined state indices.
    pub fn space_size(&self) -> i64 {
        self.disc_numbers.iter().map(|&n| n as i64).product()
    }

    /// Bucket index per dimension. Values above the dimension's range clamp to
    /// the top bucket; the comparison is strict, so a value exactly equal to
    /// the range still goes through the scaling branch (and the epsilon nudge
    /// keeps it in the top bucket rather than one past it).
    ///
    /// The arithmetic runs in `f64`: the 1e-8 nudge is below `f32` resolution
    /// for bucket counts of interest and would otherwise vanish.
    pub fn disc_indices(&self, observation: ArrayView1<f32>) -> Vec<i64> {
        self.disc_numbers
            .iter()
            .zip(&self.var_ranges)
            .zip(observation.iter())
            .map(|((&buckets, &range), &value)| {
                let buckets = buckets as f64;
                if f64::from(value) > f64::from(range) {
                    (buckets - BUCKET_EPS) as i64
                } else {
                    (f64::from(value) * buckets / f64::from(range) - BUCKET_EPS) as i64
                }
            })
            .collect()
    }

    /// Combine per-dimension bucket indices into one state index: dimension
    /// `i` contributes `indices[i]` scaled by the product of the bucket counts
    /// of all dimensions below it.
    pub fn state_index(&self, indices: &[i64]) -> i64 {
        let mut retval = indices[0];
        for i in 1..self.disc_numbers.len() {
            let mut temp = indices[i];
            for j in 0..i {
                temp *= self.disc_numbers[j] as i64;
            }
            retval += temp;
        }
        retval
    }

    /// Combined state index for a raw observation.
    pub fn index_of(&self, observation: ArrayView1<f32>) -> i64 {
        self.state_index(&self.disc_indices(observation))
    }
}
