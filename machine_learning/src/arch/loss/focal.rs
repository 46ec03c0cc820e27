use ndarray::{Array2, ArrayView2, Zip};

use super::{LossFn, Reduction, check_shapes, sigmoid, softplus};
use crate::{MlErr, Result};

/// Binary focal loss computed from logits.
///
/// With `p = σ(z)`, every element contributes
///
/// ```text
/// -|y - p|^γ · (α·y·ln(p) + (1 - α)·(1 - y)·ln(1 - p))
/// ```
///
/// The `|y - p|^γ` factor shrinks the contribution of well classified elements, so the gradient
/// is dominated by the hard ones. With `γ = 0` and `α = 0.5` it is half the binary cross entropy.
#[derive(Debug, Clone, Copy)]
pub struct FocalLoss {
    alpha: f32,
    gamma: f32,
    reduction: Reduction,
}

impl Default for FocalLoss {
    fn default() -> Self {
        Self {
            alpha: Self::DEFAULT_ALPHA,
            gamma: Self::DEFAULT_GAMMA,
            reduction: Reduction::Sum,
        }
    }
}

impl FocalLoss {
    pub const DEFAULT_ALPHA: f32 = 0.25;
    pub const DEFAULT_GAMMA: f32 = 2.0;

    /// Creates a new `FocalLoss`.
    ///
    /// # Arguments
    /// * `alpha` - The weight of the positive class, in `[0, 1]`.
    /// * `gamma` - The focusing exponent, non negative.
    /// * `reduction` - How the element losses are reduced.
    ///
    /// # Returns
    /// A new `FocalLoss` or an error if a hyperparameter is out of range.
    pub fn new(alpha: f32, gamma: f32, reduction: Reduction) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(MlErr::InvalidConfig {
                what: "focal loss alpha",
                reason: format!("expected a value in [0, 1], got {alpha}"),
            });
        }

        if !(gamma >= 0. && gamma.is_finite()) {
            return Err(MlErr::InvalidConfig {
                what: "focal loss gamma",
                reason: format!("expected a finite non negative value, got {gamma}"),
            });
        }

        Ok(Self {
            alpha,
            gamma,
            reduction,
        })
    }

    fn element_loss(&self, z: f32, y: f32) -> f32 {
        let p = sigmoid(z);
        let coeff = (y - p).abs().powf(self.gamma);
        coeff * -self.log_likelihood(z, y)
    }

    fn element_grad(&self, z: f32, y: f32) -> f32 {
        let Self { alpha, gamma, .. } = *self;

        let p = sigmoid(z);
        let diff = y - p;
        let coeff = diff.abs().powf(gamma);

        let dlikelihood = alpha * y * (1. - p) - (1. - alpha) * (1. - y) * p;
        // |diff|^(γ - 1) overflows for confident logits, so divide the finite coeff instead.
        let dcoeff = if gamma == 0. || diff == 0. {
            0.
        } else {
            -gamma * coeff * p * (1. - p) / diff
        };

        -(dcoeff * self.log_likelihood(z, y) + coeff * dlikelihood)
    }

    /// `α·y·ln(p) + (1 - α)·(1 - y)·ln(1 - p)`, using `ln σ(z) = -softplus(-z)` and
    /// `ln(1 - σ(z)) = -softplus(z)`.
    fn log_likelihood(&self, z: f32, y: f32) -> f32 {
        let alpha = self.alpha;
        -alpha * y * softplus(-z) - (1. - alpha) * (1. - y) * softplus(z)
    }
}

impl LossFn for FocalLoss {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        check_shapes(y_pred, y)?;

        let total = Zip::from(&y_pred)
            .and(&y)
            .fold(0., |acc, &z, &y| acc + self.element_loss(z, y));

        Ok(total * self.reduction.scale(y_pred.len()))
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        check_shapes(y_pred, y)?;

        let scale = self.reduction.scale(y_pred.len());
        let d = Zip::from(&y_pred)
            .and(&y)
            .map_collect(|&z, &y| self.element_grad(z, y) * scale);

        Ok(d)
    }
}
