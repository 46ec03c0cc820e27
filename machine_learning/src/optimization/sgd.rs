use rayon::prelude::*;

use super::Optimizer;
use crate::{MlErr, Result};

/// Stochastic gradient descent with momentum, Nesterov lookahead and L2 weight decay.
///
/// For every parameter `p` with gradient `g`:
///
/// ```text
/// g <- g + weight_decay * p
/// v <- momentum * v + g
/// g <- g + momentum * v    (nesterov)
/// g <- v                   (otherwise)
/// p <- p - learning_rate * g
/// ```
///
/// The velocity buffer starts zeroed and lives as long as the optimizer, so it carries over
/// between epochs.
#[derive(Debug)]
pub struct Sgd {
    learning_rate: f32,
    momentum: f32,
    weight_decay: f32,
    nesterov: bool,
    velocity: Box<[f32]>,
}

impl Sgd {
    /// Creates a new `Sgd` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - How much of the previous velocity is kept on each update.
    /// * `weight_decay` - The L2 penalty coefficient.
    /// * `nesterov` - Whether to apply the Nesterov lookahead correction.
    ///
    /// # Returns
    /// A new `Sgd` instance or an error if a hyperparameter is invalid.
    pub fn new(
        len: usize,
        learning_rate: f32,
        momentum: f32,
        weight_decay: f32,
        nesterov: bool,
    ) -> Result<Self> {
        if !(learning_rate > 0. && learning_rate.is_finite()) {
            return Err(MlErr::InvalidConfig {
                what: "learning rate",
                reason: format!("expected a finite positive value, got {learning_rate}"),
            });
        }

        if !(momentum >= 0. && momentum.is_finite()) {
            return Err(MlErr::InvalidConfig {
                what: "momentum",
                reason: format!("expected a finite non negative value, got {momentum}"),
            });
        }

        if !(weight_decay >= 0. && weight_decay.is_finite()) {
            return Err(MlErr::InvalidConfig {
                what: "weight decay",
                reason: format!("expected a finite non negative value, got {weight_decay}"),
            });
        }

        if nesterov && momentum == 0. {
            return Err(MlErr::InvalidConfig {
                what: "momentum",
                reason: "nesterov momentum requires a non zero momentum".to_string(),
            });
        }

        Ok(Self {
            learning_rate,
            momentum,
            weight_decay,
            nesterov,
            velocity: vec![0.; len].into_boxed_slice(),
        })
    }

    /// Returns the velocity buffer.
    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }
}

impl Optimizer for Sgd {
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()> {
        if grad.len() != params.len() {
            return Err(MlErr::SizeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: params.len(),
            });
        }

        if self.velocity.len() != params.len() {
            return Err(MlErr::SizeMismatch {
                what: "optimizer state",
                got: params.len(),
                expected: self.velocity.len(),
            });
        }

        let Self {
            learning_rate: lr,
            momentum: mu,
            weight_decay: wd,
            nesterov,
            ..
        } = *self;

        params
            .par_iter_mut()
            .zip(grad.par_iter())
            .zip(self.velocity.par_iter_mut())
            .for_each(|((p, &g), v)| {
                let mut g = g + wd * *p;

                if mu != 0. {
                    *v = mu * *v + g;
                    g = if nesterov { g + mu * *v } else { *v };
                }

                *p -= lr * g;
            });

        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(got: f32, expected: f32) {
        assert!((got - expected).abs() < 1e-5, "got {got}, expected {expected}");
    }

    #[test]
    fn plain_step_follows_the_gradient() {
        let mut sgd = Sgd::new(1, 0.1, 0., 0., false).unwrap();
        let mut params = [1.0];

        sgd.update_params(&mut params, &[0.5]).unwrap();
        assert_close(params[0], 0.95);
    }

    #[test]
    fn momentum_accumulates_velocity() {
        let mut sgd = Sgd::new(1, 0.1, 0.9, 0., false).unwrap();
        let mut params = [1.0];

        sgd.update_params(&mut params, &[0.5]).unwrap();
        assert_close(params[0], 0.95);

        sgd.update_params(&mut params, &[0.5]).unwrap();
        assert_close(sgd.velocity()[0], 0.95);
        assert_close(params[0], 0.855);
    }

    #[test]
    fn nesterov_with_weight_decay() {
        let mut sgd = Sgd::new(1, 0.1, 0.9, 0.01, true).unwrap();
        let mut params = [1.0];

        sgd.update_params(&mut params, &[0.5]).unwrap();
        assert_close(params[0], 0.9031);

        sgd.update_params(&mut params, &[0.5]).unwrap();
        assert_close(sgd.velocity()[0], 0.968031);
        assert_close(params[0], 0.765_074_1);
    }

    #[test]
    fn invalid_hyperparameters_are_rejected() {
        assert!(Sgd::new(1, 0., 0.9, 0., false).is_err());
        assert!(Sgd::new(1, -0.1, 0.9, 0., false).is_err());
        assert!(Sgd::new(1, f32::NAN, 0.9, 0., false).is_err());
        assert!(Sgd::new(1, 0.1, -0.5, 0., false).is_err());
        assert!(Sgd::new(1, 0.1, 0.9, -1., false).is_err());
        assert!(Sgd::new(1, 0.1, 0., 0., true).is_err());
    }

    #[test]
    fn size_mismatches_are_rejected() {
        let mut sgd = Sgd::new(2, 0.1, 0.9, 0., true).unwrap();

        assert!(sgd.update_params(&mut [1.0, 2.0], &[1.0]).is_err());
        assert!(sgd.update_params(&mut [1.0, 2.0, 3.0], &[1.0; 3]).is_err());
    }
}
