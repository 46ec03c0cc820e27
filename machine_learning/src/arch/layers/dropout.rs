use ndarray::{Array2, ArrayView2};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Bernoulli, Distribution};

use crate::{MlErr, Result};

/// Randomly zeroes activations while training and rescales the survivors by `1 / (1 - p)`.
///
/// The layer owns its random number generator so that runs are reproducible from the seed alone.
#[derive(Debug, Clone)]
pub struct Dropout {
    p: f32,
    keep: Bernoulli,
    rng: StdRng,
    mask: Option<Array2<f32>>,
}

impl Dropout {
    /// Creates a new `Dropout` layer.
    ///
    /// # Arguments
    /// * `p` - The probability of dropping an activation, in `[0, 1)`.
    /// * `seed` - The seed for the layer's random number generator.
    ///
    /// # Returns
    /// A new `Dropout` instance or an error if `p` is out of range.
    pub fn new(p: f32, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(MlErr::InvalidConfig {
                what: "dropout probability",
                reason: format!("expected a value in [0, 1), got {p}"),
            });
        }

        Ok(Self {
            p,
            keep: Bernoulli::new(1. - p as f64)?,
            rng: StdRng::seed_from_u64(seed),
            mask: None,
        })
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, training: bool) -> Array2<f32> {
        if !training || self.p == 0. {
            self.mask = None;
            return x.to_owned();
        }

        let scale = 1. / (1. - self.p);
        let Self { keep, rng, .. } = self;
        let mask = Array2::from_shape_fn(x.raw_dim(), |_| {
            if keep.sample(&mut *rng) { scale } else { 0. }
        });

        let a = &x * &mask;
        self.mask = Some(mask);
        a
    }

    pub fn backward(&mut self, d: Array2<f32>) -> Result<Array2<f32>> {
        let Some(mask) = self.mask.take() else {
            return Ok(d);
        };

        if mask.dim() != d.dim() {
            return Err(MlErr::SizeMismatch {
                what: "dropout delta",
                got: d.len(),
                expected: mask.len(),
            });
        }

        Ok(d * mask)
    }
}
