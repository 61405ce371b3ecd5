//! Small numeric helpers shared by the agent core.

use ndarray::{Array1, ArrayView1};

use crate::error::{MetisError, Result};

/// Largest value in `values`, seeded with the first element and scanning with
/// strict `>`. Ties resolve to the first value encountered in natural order,
/// unlike the shuffled tie-break used during action selection.
pub fn max_value(values: ArrayView1<f32>) -> Result<f32> {
    let mut iter = values.iter();
    let first = iter
        .next()
        .ok_or_else(|| MetisError::EmptyBuffer("max_value over empty vector".to_string()))?;
    let mut max = *first;
    for &val in iter {
        if val > max {
            max = val;
        }
    }
    Ok(max)
}

/// One-hot feature vector of length `len` with `1.0` at `index`.
pub fn one_hot(len: usize, index: usize) -> Array1<f32> {
    let mut v = Array1::zeros(len);
    v[index] = 1.0;
    v
}
