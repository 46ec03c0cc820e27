use ndarray::{Array2, ArrayView2};

use crate::Result;

/// The hardware a batch is moved onto before being fed to a model.
///
/// Devices are passed explicitly to whoever needs them, there's no ambient default device.
pub trait Device {
    /// Returns a human readable name for the device.
    fn name(&self) -> &str;

    /// Copies `data` onto the device.
    ///
    /// # Returns
    /// The placed data or an error if the device can't hold it.
    fn place(&self, data: ArrayView2<f32>) -> Result<Array2<f32>>;
}

/// The host processor. Placing data on it yields an owned, contiguous, row-major copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cpu;

impl Device for Cpu {
    fn name(&self) -> &str {
        "cpu"
    }

    fn place(&self, data: ArrayView2<f32>) -> Result<Array2<f32>> {
        Ok(data.as_standard_layout().into_owned())
    }
}
