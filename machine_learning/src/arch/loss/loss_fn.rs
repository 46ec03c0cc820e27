use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::Result;

/// How the per-element losses of a batch are reduced to a scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    #[default]
    Sum,
    Mean,
}

impl Reduction {
    /// The factor every element's contribution is scaled by for a batch of `n` elements.
    pub(super) fn scale(&self, n: usize) -> f32 {
        match self {
            Reduction::Sum => 1.,
            Reduction::Mean if n == 0 => 0.,
            Reduction::Mean => 1. / n as f32,
        }
    }
}

/// Scores a model's output against the expected one.
pub trait LossFn {
    /// Computes the scalar loss of a batch.
    ///
    /// # Arguments
    /// * `y_pred` - The model's output.
    /// * `y` - The expected output, same shape as `y_pred`.
    ///
    /// # Returns
    /// The reduced loss or a size mismatch.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32>;

    /// Computes the derivative of `loss` with respect to every element of `y_pred`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>>;
}
