use super::Metrics;
use crate::Result;

/// Runs training one epoch at a time.
pub trait Trainer {
    /// Performs a full pass over the training data, updating the model once per batch.
    ///
    /// # Returns
    /// The metrics of the epoch or the first error raised by any of the training components.
    fn train_epoch(&mut self) -> Result<Metrics>;
}
