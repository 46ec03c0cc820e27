use std::mem;

use log::debug;
use ndarray::{Array2, ArrayView2};
use rand::Rng;
use rayon::prelude::*;

use super::{Mode, Model, layers::Layer};
use crate::{MlErr, Result};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
///
/// Every layer reads its parameters from a contiguous slice of the model's flat parameter
/// buffer, in layer order.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
    params: Vec<f32>,
    grad: Vec<f32>,
    mode: Mode,
}

impl Sequential {
    /// Creates a new `Sequential` with zeroed parameters.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        let layers: Vec<Layer> = layers.into_iter().collect();
        let size = layers.iter().map(|layer| layer.size()).sum();

        Self {
            layers,
            params: vec![0.; size],
            grad: vec![0.; size],
            mode: Mode::default(),
        }
    }

    /// Replaces the model's parameters.
    ///
    /// # Arguments
    /// * `params` - The new parameters, must be as long as the model's size.
    ///
    /// # Returns
    /// The model or a size mismatch.
    pub fn with_params(mut self, params: Vec<f32>) -> Result<Self> {
        if params.len() != self.params.len() {
            return Err(MlErr::SizeMismatch {
                what: "model parameters",
                got: params.len(),
                expected: self.params.len(),
            });
        }

        self.params = params;
        Ok(self)
    }

    /// Initializes every layer's parameters by sampling from `rng`.
    pub fn init_params<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let mut rest: &mut [f32] = &mut self.params;

        for layer in &self.layers {
            let (params, tail) = mem::take(&mut rest).split_at_mut(layer.size());
            rest = tail;
            layer.init(params, rng)?;
        }

        debug!(size = self.params.len(); "initialized sequential parameters");
        Ok(())
    }

    /// Returns the model's layers.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.params.len()
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mode = self.mode;
        let mut rest: &[f32] = &self.params;
        let mut a: Option<Array2<f32>> = None;

        for layer in self.layers.iter_mut() {
            let (params, tail) = rest.split_at(layer.size());
            rest = tail;

            let next = match &a {
                Some(a) => layer.forward(params, a.view(), mode)?,
                None => layer.forward(params, x, mode)?,
            };
            a = Some(next);
        }

        Ok(a.unwrap_or_else(|| x.to_owned()))
    }

    fn backward(&mut self, mut d: Array2<f32>) -> Result<()> {
        let mut params_rest: &[f32] = &self.params;
        let mut grad_rest: &mut [f32] = &mut self.grad;

        for layer in self.layers.iter_mut().rev() {
            let size = layer.size();

            let (params_head, params) = params_rest.split_at(params_rest.len() - size);
            params_rest = params_head;

            let split = grad_rest.len() - size;
            let (grad_head, grad) = mem::take(&mut grad_rest).split_at_mut(split);
            grad_rest = grad_head;

            d = layer.backward(params, grad, d)?;
        }

        Ok(())
    }

    fn zero_grad(&mut self) {
        self.grad.par_iter_mut().for_each(|g| *g = 0.);
    }

    fn params(&self) -> &[f32] {
        &self.params
    }

    fn params_and_grad(&mut self) -> (&mut [f32], &[f32]) {
        (&mut self.params, &self.grad)
    }
}
