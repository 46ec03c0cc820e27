use std::{f32::consts::PI, fmt};

use super::Optimizer;

/// Cosine annealing from `lr_max` at `step = 0` down to `lr_min` at `step = total_steps`.
///
/// ```text
/// lr_min + (lr_max - lr_min) * 0.5 * (1 + cos(step / total_steps * π))
/// ```
///
/// The step is not clamped: past `total_steps` the curve keeps following the cosine and rises
/// again. `total_steps` must be positive.
pub fn cosine_annealing(step: usize, total_steps: usize, lr_max: f32, lr_min: f32) -> f32 {
    let progress = step as f32 / total_steps as f32;
    lr_min + (lr_max - lr_min) * 0.5 * (1. + (progress * PI).cos())
}

/// Scales an optimizer's initial learning rate by a factor of the global step.
///
/// The base rate is read from the optimizer on construction and the factor for step `0` is
/// applied right away. Every call to `step` advances the counter by one and writes
/// `base_lr * lr_lambda(step)` back into the optimizer. The counter never goes back.
pub struct LambdaLr {
    base_lr: f32,
    lr_lambda: Box<dyn Fn(usize) -> f32 + Send + Sync>,
    last_step: usize,
}

impl LambdaLr {
    /// Creates a new `LambdaLr` and applies the factor of step `0` to `optimizer`.
    ///
    /// # Arguments
    /// * `optimizer` - The optimizer whose learning rate is scheduled.
    /// * `lr_lambda` - Maps a step to a multiplicative factor of the base learning rate.
    ///
    /// # Returns
    /// A new `LambdaLr` instance.
    pub fn new<O, F>(optimizer: &mut O, lr_lambda: F) -> Self
    where
        O: Optimizer,
        F: Fn(usize) -> f32 + Send + Sync + 'static,
    {
        let scheduler = Self {
            base_lr: optimizer.learning_rate(),
            lr_lambda: Box::new(lr_lambda),
            last_step: 0,
        };

        optimizer.set_learning_rate(scheduler.learning_rate());
        scheduler
    }

    /// Creates a `LambdaLr` that anneals the optimizer's rate down to `min_lr` over
    /// `total_steps` steps following `cosine_annealing`.
    pub fn cosine<O: Optimizer>(optimizer: &mut O, total_steps: usize, min_lr: f32) -> Self {
        let floor = min_lr / optimizer.learning_rate();
        Self::new(optimizer, move |step| {
            cosine_annealing(step, total_steps, 1., floor)
        })
    }

    /// Advances the schedule by one step and updates the optimizer's learning rate.
    pub fn step<O: Optimizer>(&mut self, optimizer: &mut O) {
        self.last_step += 1;
        optimizer.set_learning_rate(self.learning_rate());
    }

    /// Returns the amount of steps taken so far.
    pub fn last_step(&self) -> usize {
        self.last_step
    }

    /// Returns the factor for the current step.
    pub fn factor(&self) -> f32 {
        (self.lr_lambda)(self.last_step)
    }

    /// Returns the learning rate for the current step.
    pub fn learning_rate(&self) -> f32 {
        self.base_lr * self.factor()
    }

    pub fn base_lr(&self) -> f32 {
        self.base_lr
    }
}

impl fmt::Debug for LambdaLr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaLr")
            .field("base_lr", &self.base_lr)
            .field("last_step", &self.last_step)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::Sgd;

    #[test]
    fn cosine_starts_at_max_and_ends_at_min() {
        assert!((cosine_annealing(0, 10, 0.3, 0.01) - 0.3).abs() < 1e-7);
        assert!((cosine_annealing(10, 10, 0.3, 0.01) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn cosine_halfway_is_the_midpoint() {
        assert!((cosine_annealing(50, 100, 1.0, 0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cosine_is_bounded_and_non_increasing() {
        const TOTAL: usize = 1000;
        let (hi, lo) = (1.0, 1e-5);
        let mut prev = cosine_annealing(0, TOTAL, hi, lo);

        for step in 1..=TOTAL {
            let lr = cosine_annealing(step, TOTAL, hi, lo);
            assert!(lr <= prev + 1e-7, "step {step}: {lr} > {prev}");
            assert!((lo - 1e-6..=hi + 1e-6).contains(&lr), "step {step}: {lr} out of range");
            prev = lr;
        }
    }

    #[test]
    fn cosine_rises_again_past_the_total() {
        let at_end = cosine_annealing(100, 100, 1.0, 0.0);
        let past_end = cosine_annealing(150, 100, 1.0, 0.0);
        assert!(past_end > at_end);
        assert!((past_end - 0.5).abs() < 1e-6);
    }

    #[test]
    fn lambda_applies_the_initial_factor_on_construction() {
        let mut sgd = Sgd::new(1, 0.1, 0.9, 0., true).unwrap();
        let scheduler = LambdaLr::new(&mut sgd, |_| 0.5);

        assert_eq!(scheduler.last_step(), 0);
        assert_eq!(scheduler.base_lr(), 0.1);
        assert!((sgd.learning_rate() - 0.05).abs() < 1e-7);
    }

    #[test]
    fn lambda_steps_are_monotonic() {
        let mut sgd = Sgd::new(1, 1.0, 0.9, 0., true).unwrap();
        let mut scheduler = LambdaLr::new(&mut sgd, |step| 1. / (step + 1) as f32);

        for expected in 1..=5 {
            scheduler.step(&mut sgd);
            assert_eq!(scheduler.last_step(), expected);
            assert!((sgd.learning_rate() - 1. / (expected + 1) as f32).abs() < 1e-7);
        }
    }

    #[test]
    fn cosine_schedule_anneals_to_the_floor() {
        const TOTAL: usize = 20;
        let mut sgd = Sgd::new(1, 0.1, 0.9, 5e-4, true).unwrap();
        let mut scheduler = LambdaLr::cosine(&mut sgd, TOTAL, 1e-6);

        assert!((sgd.learning_rate() - 0.1).abs() < 1e-7);

        let mut prev = sgd.learning_rate();
        for _ in 0..TOTAL {
            scheduler.step(&mut sgd);
            assert!(sgd.learning_rate() <= prev);
            prev = sgd.learning_rate();
        }

        assert!((sgd.learning_rate() - 1e-6).abs() < 1e-7);
    }
}
