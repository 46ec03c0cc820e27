use crate::Result;

/// Defines the strategy for updating model parameters based on calculated gradients.
pub trait Optimizer {
    /// Updates the parameters according to the algorithm's learning rule.
    ///
    /// # Arguments
    /// * `params` - The parameters that are going to be modified.
    /// * `grad` - The gradient used for taking the step.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `params`, `grad` and the optimizer state.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()>;

    /// Returns the learning rate the next update will use.
    fn learning_rate(&self) -> f32;

    /// Overrides the learning rate, used by the rate schedulers.
    fn set_learning_rate(&mut self, learning_rate: f32);
}
