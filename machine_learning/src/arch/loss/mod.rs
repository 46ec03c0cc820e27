mod bce_with_logits;
mod focal;
mod kind;
mod loss_fn;
mod mse;

pub use bce_with_logits::BceWithLogits;
pub use focal::FocalLoss;
pub use kind::Loss;
pub use loss_fn::{LossFn, Reduction};
pub use mse::Mse;

use ndarray::ArrayView2;

use crate::{MlErr, Result};

/// Fails if the prediction and the target don't have the same shape.
fn check_shapes(y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<()> {
    if y_pred.dim() != y.dim() {
        return Err(MlErr::SizeMismatch {
            what: "loss prediction and target",
            got: y_pred.len(),
            expected: y.len(),
        });
    }

    Ok(())
}

/// `ln(1 + e^x)` without overflowing for large `x`.
fn softplus(x: f32) -> f32 {
    x.max(0.) + (-x.abs()).exp().ln_1p()
}

/// The logistic function, stable on both tails.
fn sigmoid(x: f32) -> f32 {
    if x >= 0. {
        1. / (1. + (-x).exp())
    } else {
        let e = x.exp();
        e / (1. + e)
    }
}
