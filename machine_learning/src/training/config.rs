use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// The hyperparameters of a training run.
///
/// Missing fields take their default value when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// The base learning rate, annealed down to `min_learning_rate` over the whole run.
    pub learning_rate: f32,
    pub momentum: f32,
    pub weight_decay: f32,
    /// The amount of epochs the learning rate schedule spans.
    pub epochs: NonZeroUsize,
    /// The learning rate reached at the end of the last epoch.
    pub min_learning_rate: f32,
}

impl TrainerConfig {
    pub const DEFAULT_LEARNING_RATE: f32 = 0.1;
    pub const DEFAULT_MOMENTUM: f32 = 0.9;
    pub const DEFAULT_WEIGHT_DECAY: f32 = 0.0005;
    pub const DEFAULT_EPOCHS: NonZeroUsize = NonZeroUsize::new(100).unwrap();
    pub const DEFAULT_MIN_LEARNING_RATE: f32 = 1e-6;

    /// Checks the values the optimizer doesn't check by itself.
    ///
    /// # Returns
    /// An error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0. && self.learning_rate.is_finite()) {
            return Err(MlErr::InvalidConfig {
                what: "learning rate",
                reason: format!("expected a finite positive value, got {}", self.learning_rate),
            });
        }

        if !(self.min_learning_rate >= 0. && self.min_learning_rate.is_finite()) {
            return Err(MlErr::InvalidConfig {
                what: "minimum learning rate",
                reason: format!(
                    "expected a finite non negative value, got {}",
                    self.min_learning_rate
                ),
            });
        }

        Ok(())
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: Self::DEFAULT_LEARNING_RATE,
            momentum: Self::DEFAULT_MOMENTUM,
            weight_decay: Self::DEFAULT_WEIGHT_DECAY,
            epochs: Self::DEFAULT_EPOCHS,
            min_learning_rate: Self::DEFAULT_MIN_LEARNING_RATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_the_defaults() {
        let config: TrainerConfig = serde_json::from_str(r#"{"epochs": 3}"#).unwrap();

        assert_eq!(config.epochs.get(), 3);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.momentum, 0.9);
        assert_eq!(config.weight_decay, 0.0005);
        assert_eq!(config.min_learning_rate, 1e-6);
    }

    #[test]
    fn zero_epochs_fail_to_parse() {
        assert!(serde_json::from_str::<TrainerConfig>(r#"{"epochs": 0}"#).is_err());
    }

    #[test]
    fn non_positive_learning_rates_are_invalid() {
        for learning_rate in [0., -0.1, f32::INFINITY, f32::NAN] {
            let config = TrainerConfig {
                learning_rate,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{learning_rate} was accepted");
        }

        assert!(TrainerConfig::default().validate().is_ok());
    }
}
