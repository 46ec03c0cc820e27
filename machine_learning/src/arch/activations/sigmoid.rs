/// A logistic curve scaled by `amp`.
#[derive(Clone, Debug, Default)]
pub struct Sigmoid {
    amp: f32,
}

impl Sigmoid {
    pub fn new(amp: f32) -> Self {
        Self { amp }
    }

    pub fn f(&self, z: f32) -> f32 {
        self.amp / (1. + (-z).exp())
    }

    pub fn df(&self, z: f32) -> f32 {
        let s = 1. / (1. + (-z).exp());
        self.amp * s * (1. - s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_centered_at_half_amp() {
        let sigmoid = Sigmoid::new(2.0);
        assert!((sigmoid.f(0.0) - 1.0).abs() < 1e-6);
        assert!((sigmoid.df(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn derivative_does_not_overflow_on_large_inputs() {
        let sigmoid = Sigmoid::new(1.0);
        assert!(sigmoid.df(-100.0).is_finite());
        assert!(sigmoid.df(100.0).is_finite());
    }
}
