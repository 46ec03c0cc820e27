use ndarray::{Array2, ArrayView2};

use crate::error::Result;

/// Whether a model is being trained or evaluated.
///
/// Layers with training-only behavior, such as dropout, only apply it in `Mode::Train`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Train,
    Eval,
}

/// A parameterized function that can be trained through backpropagation.
///
/// The model owns a flat parameter buffer and a gradient buffer of the same length, the
/// optimizer state is tied one to one to them.
pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Returns the mode the model is currently in.
    fn mode(&self) -> Mode;

    /// Switches the model into the given mode.
    fn set_mode(&mut self, mode: Mode);

    /// Switches the model into training mode.
    fn train(&mut self) {
        self.set_mode(Mode::Train);
    }

    /// Switches the model into evaluation mode.
    fn eval(&mut self) {
        self.set_mode(Mode::Eval);
    }

    /// Makes a forward pass through the model.
    ///
    /// # Arguments
    /// * `x` - A batch of inputs, one row per sample.
    ///
    /// # Returns
    /// The model's output for the batch or an error if the shapes don't match.
    fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Backpropagates `d`, the derivative of the loss with respect to the last output, and
    /// **accumulates** the result onto the gradient buffer.
    ///
    /// # Arguments
    /// * `d` - The derivative of the loss with respect to the output of the last forward pass.
    fn backward(&mut self, d: Array2<f32>) -> Result<()>;

    /// Zeros out the accumulated gradient.
    fn zero_grad(&mut self);

    /// Returns the model's parameters.
    fn params(&self) -> &[f32];

    /// Returns the model's parameters, mutably, alongside the accumulated gradient.
    fn params_and_grad(&mut self) -> (&mut [f32], &[f32]);
}
