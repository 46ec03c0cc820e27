use ndarray::{Array2, ArrayView2, Zip};

use super::{LossFn, Reduction, check_shapes, sigmoid, softplus};
use crate::Result;

/// Binary cross entropy computed straight from logits.
///
/// Element loss: `softplus(z) - y * z`, which equals `-(y ln σ(z) + (1 - y) ln(1 - σ(z)))`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BceWithLogits {
    reduction: Reduction,
}

impl BceWithLogits {
    pub fn new(reduction: Reduction) -> Self {
        Self { reduction }
    }
}

impl LossFn for BceWithLogits {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
        check_shapes(y_pred, y)?;

        let total = Zip::from(&y_pred)
            .and(&y)
            .fold(0., |acc, &z, &y| acc + softplus(z) - y * z);

        Ok(total * self.reduction.scale(y_pred.len()))
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Array2<f32>> {
        check_shapes(y_pred, y)?;

        let scale = self.reduction.scale(y_pred.len());
        let d = Zip::from(&y_pred)
            .and(&y)
            .map_collect(|&z, &y| (sigmoid(z) - y) * scale);

        Ok(d)
    }
}
