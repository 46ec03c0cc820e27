use ndarray::{linalg, prelude::*};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer: `a = act_fn(x · w + b)`.
///
/// The parameters are laid out as the row-major `(in, out)` weight matrix followed by the `out`
/// biases.
#[derive(Debug, Clone)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,

    // Forward metadata
    x: Option<Array2<f32>>,
    z: Array2<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The input and output widths of the layer.
    /// * `act_fn` - An optional activation function applied to the affine output.
    ///
    /// # Returns
    /// A new `Dense` instance.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
            act_fn,
            x: None,
            z: Array2::zeros((0, dim.1)),
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Writes a Xavier uniform initialization of the weights and zeroed biases into `params`.
    ///
    /// # Arguments
    /// * `params` - This layer's parameter slice.
    /// * `rng` - The random number generator to sample the weights with.
    ///
    /// # Returns
    /// An error if the slice doesn't match the layer size.
    pub fn init<R: Rng>(&self, params: &mut [f32], rng: &mut R) -> Result<()> {
        self.check_len("dense layer parameters", params.len())?;

        let range = (6. / (self.dim.0 + self.dim.1) as f32).sqrt();
        let distribution = Uniform::new_inclusive(-range, range)?;

        let (weights, biases) = params.split_at_mut(self.size - self.dim.1);
        weights
            .iter_mut()
            .for_each(|w| *w = distribution.sample(rng));
        biases.fill(0.);

        Ok(())
    }

    /// Computes the layer's output for a batch of inputs, caching what the backward pass needs.
    ///
    /// # Arguments
    /// * `params` - This layer's parameter slice.
    /// * `x` - A batch of inputs, one row per sample.
    ///
    /// # Returns
    /// The activations for every sample or a size mismatch.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense layer input",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;

        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut z);
        z += &b;

        let a = match &self.act_fn {
            Some(act_fn) => z.mapv(|z| act_fn.f(z)),
            None => z.clone(),
        };

        self.x = Some(x.to_owned());
        self.z = z;
        Ok(a)
    }

    /// Accumulates this layer's gradient and propagates the delta to the previous layer.
    ///
    /// # Arguments
    /// * `params` - This layer's parameter slice.
    /// * `grad` - This layer's gradient slice, added onto.
    /// * `d` - The derivative of the loss with respect to this layer's output.
    ///
    /// # Returns
    /// The derivative of the loss with respect to this layer's input.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        let x = self.x.take().ok_or(MlErr::MissingForward)?;

        if d.dim() != self.z.dim() {
            return Err(MlErr::SizeMismatch {
                what: "dense layer delta",
                got: d.len(),
                expected: self.z.len(),
            });
        }

        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&self.z, |d, &z| *d *= act_fn.df(z));
        }

        let (w, _) = self.view_params(params)?;
        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &x.t(), &d, 1.0, &mut dw);
        db += &d.sum_axis(Axis(0));

        let mut d_prev = Array2::zeros((d.nrows(), self.dim.0));
        linalg::general_mat_mul(1.0, &d, &w.t(), 0.0, &mut d_prev);

        Ok(d_prev)
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        self.check_len("dense layer gradient", grad.len())?;

        let (dw_raw, db_raw) = grad.split_at_mut(self.size - self.dim.1);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw).map_err(|_| self.mismatch())?;
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw).map_err(|_| self.mismatch())?;
        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        self.check_len("dense layer parameters", params.len())?;

        let (w_raw, b_raw) = params.split_at(self.size - self.dim.1);
        let w = ArrayView2::from_shape(self.dim, w_raw).map_err(|_| self.mismatch())?;
        let b = ArrayView1::from_shape(self.dim.1, b_raw).map_err(|_| self.mismatch())?;
        Ok((w, b))
    }

    fn check_len(&self, what: &'static str, got: usize) -> Result<()> {
        if got != self.size {
            return Err(MlErr::SizeMismatch {
                what,
                got,
                expected: self.size,
            });
        }

        Ok(())
    }

    fn mismatch(&self) -> MlErr {
        MlErr::SizeMismatch {
            what: "dense layer shape",
            got: self.size,
            expected: (self.dim.0 + 1) * self.dim.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn forward_computes_affine_transform() {
        let mut dense = Dense::new((2, 1), None);
        let params = [2.0, 3.0, 1.0];
        let x = array![[1.0, 1.0], [0.0, 2.0]];

        let a = dense.forward(&params, x.view()).unwrap();
        assert_eq!(a, array![[6.0f32], [7.0]]);
    }

    #[test]
    fn backward_accumulates_gradient() {
        let mut dense = Dense::new((2, 1), None);
        let params = [2.0, 3.0, 1.0];
        let mut grad = [0.0f32; 3];
        let x = array![[1.0, 2.0]];

        for _ in 0..2 {
            dense.forward(&params, x.view()).unwrap();
            let d_prev = dense.backward(&params, &mut grad, array![[1.0]]).unwrap();
            assert_eq!(d_prev, array![[2.0f32, 3.0]]);
        }

        assert_eq!(grad, [2.0f32, 4.0, 2.0]);
    }

    #[test]
    fn backward_without_forward_fails() {
        let mut dense = Dense::new((2, 1), None);
        let params = [0.0; 3];
        let mut grad = [0.0; 3];

        let err = dense.backward(&params, &mut grad, array![[1.0]]);
        assert_eq!(err, Err(MlErr::MissingForward));
    }

    #[test]
    fn forward_rejects_wrong_input_width() {
        let mut dense = Dense::new((3, 1), None);
        let params = [0.0; 4];
        let x = Array2::zeros((2, 2));

        assert!(matches!(
            dense.forward(&params, x.view()),
            Err(MlErr::SizeMismatch { got: 2, expected: 3, .. })
        ));
    }

    #[test]
    fn init_bounds_weights_and_zeroes_biases() {
        let dense = Dense::new((4, 2), None);
        let mut params = vec![7.0; dense.size()];
        let mut rng = StdRng::seed_from_u64(0);

        dense.init(&mut params, &mut rng).unwrap();

        let range = (6.0f32 / 6.0).sqrt();
        assert!(params[..8].iter().all(|w| w.abs() <= range));
        assert_eq!(params[8..], [0.0f32, 0.0]);
    }
}
