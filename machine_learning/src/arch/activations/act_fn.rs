use super::{Relu, Sigmoid};

/// An element-wise activation function applied after a layer's affine transform.
#[derive(Debug, Clone)]
pub enum ActFn {
    Sigmoid(Sigmoid),
    Relu(Relu),
}

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid(Sigmoid::new(amp))
    }

    pub fn relu() -> Self {
        Self::Relu(Relu)
    }

    /// Evaluates the activation at `z`.
    pub fn f(&self, z: f32) -> f32 {
        match self {
            Self::Sigmoid(a) => a.f(z),
            Self::Relu(a) => a.f(z),
        }
    }

    /// Evaluates the activation's derivative at `z`.
    pub fn df(&self, z: f32) -> f32 {
        match self {
            Self::Sigmoid(a) => a.df(z),
            Self::Relu(a) => a.df(z),
        }
    }
}
