use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{
    arch::loss::{FocalLoss, Reduction},
    training::TrainerConfig,
};

/// The specification for the `ActFn` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnSpec {
    Sigmoid { amp: f32 },
    Relu,
}

/// The specification for the `Layer` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        dim: (usize, usize),
        act_fn: Option<ActFnSpec>,
    },
    Dropout {
        p: f32,
    },
}

/// The specification for the `Model` trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSpec {
    Sequential { layers: Vec<LayerSpec> },
}

/// The specification for the `Loss` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFnSpec {
    Focal {
        #[serde(default = "default_alpha")]
        alpha: f32,
        #[serde(default = "default_gamma")]
        gamma: f32,
        #[serde(default)]
        reduction: Reduction,
    },
    BceWithLogits {
        #[serde(default)]
        reduction: Reduction,
    },
    Mse,
}

impl Default for LossFnSpec {
    fn default() -> Self {
        Self::Focal {
            alpha: default_alpha(),
            gamma: default_gamma(),
            reduction: Reduction::default(),
        }
    }
}

fn default_alpha() -> f32 {
    FocalLoss::DEFAULT_ALPHA
}

fn default_gamma() -> f32 {
    FocalLoss::DEFAULT_GAMMA
}

/// The specification for the `Dataset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub data: Vec<f32>,
    pub x_size: usize,
    pub y_size: usize,
}

/// The specification for a whole training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerSpec {
    pub model: ModelSpec,
    #[serde(default)]
    pub loss: LossFnSpec,
    pub dataset: DatasetSpec,
    #[serde(default)]
    pub training: TrainerConfig,
    pub batch_size: NonZeroUsize,
    #[serde(default)]
    pub shuffle: bool,
    pub seed: Option<u64>,
}
