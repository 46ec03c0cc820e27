use std::collections::BTreeMap;

use serde::Serialize;

/// The name of the smoothed training loss metric.
pub const TRAIN_LOSS: &str = "train_loss";

/// The scalar metrics of a single epoch, by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, f32>);

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f32) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.0.get(name).copied()
    }

    /// Returns the smoothed training loss, if recorded.
    pub fn train_loss(&self) -> Option<f32> {
        self.get(TRAIN_LOSS)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(name, &value)| (name.as_str(), value))
    }
}

/// An exponential moving average that starts at zero.
///
/// Each update keeps `decay` of the previous average and adds `1 - decay` of the new value.
#[derive(Debug, Clone, Copy)]
pub struct ExpMovingAvg {
    value: f32,
    decay: f32,
}

impl ExpMovingAvg {
    pub fn new(decay: f32) -> Self {
        Self { value: 0., decay }
    }

    /// Folds `x` into the average and returns the new value.
    pub fn update(&mut self, x: f32) -> f32 {
        self.value = self.value * self.decay + x * (1. - self.decay);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_starts_at_zero() {
        assert_eq!(ExpMovingAvg::new(0.8).value(), 0.0);
    }

    #[test]
    fn constant_input_converges_to_the_input() {
        let mut avg = ExpMovingAvg::new(0.8);
        for _ in 0..200 {
            avg.update(3.5);
        }

        assert!((avg.value() - 3.5).abs() < 1e-5);
    }

    #[test]
    fn metrics_serialize_as_a_flat_map() {
        let mut metrics = Metrics::new();
        metrics.insert(TRAIN_LOSS, 0.5);

        let json = serde_json::to_string(&metrics).unwrap();
        assert_eq!(json, r#"{"train_loss":0.5}"#);
        assert_eq!(metrics.train_loss(), Some(0.5));
        assert_eq!(metrics.get("missing"), None);
    }
}
