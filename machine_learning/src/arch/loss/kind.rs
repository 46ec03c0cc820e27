use ndarray::{Array2, ArrayView2};

use super::{BceWithLogits, FocalLoss, LossFn, Mse};
use crate::Result;

/// Any of the supported loss functions.
#[derive(Debug, Clone, Copy)]
pub enum Loss {
    Focal(FocalLoss),
    BceWithLogits(BceWithLogits),
    Mse(Mse),
}

impl Default for Loss {
    fn default() -> Self {
        Self::Focal(FocalLoss::default())
    }
}

impl LossFn for Loss {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        match self {
            Self::Focal(l) => l.loss(y_pred, y),
            Self::BceWithLogits(l) => l.loss(y_pred, y),
            Self::Mse(l) => l.loss(y_pred, y),
        }
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Self::Focal(l) => l.loss_prime(y_pred, y),
            Self::BceWithLogits(l) => l.loss_prime(y_pred, y),
            Self::Mse(l) => l.loss_prime(y_pred, y),
        }
    }
}
