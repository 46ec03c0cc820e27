use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::TrainerConfig;
use crate::{
    Result,
    arch::{
        Model, Sequential,
        activations::ActFn,
        layers::Layer,
        loss::{BceWithLogits, FocalLoss, Loss, Mse},
    },
    dataset::Dataset,
    specs::{ActFnSpec, LayerSpec, LossFnSpec, ModelSpec, TrainerSpec},
};

/// Everything a `ModelTrainer` needs, resolved from a `TrainerSpec`.
#[derive(Debug)]
pub struct TrainingSetup {
    pub model: Sequential,
    pub dataset: Dataset,
    pub loss: Loss,
    pub config: TrainerConfig,
}

/// Builds the training components given a specification.
#[derive(Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds every training component following a spec.
    ///
    /// All the randomness (parameter initialization, dropout masks and shuffling) is derived from
    /// `spec.seed`, so the same spec always yields the same run.
    ///
    /// # Arguments
    /// * `spec` - The specification for the training run.
    ///
    /// # Returns
    /// The resolved components or the first invalid part of the spec.
    pub fn build(&self, spec: &TrainerSpec) -> Result<TrainingSetup> {
        spec.training.validate()?;

        let mut rng = self.generate_rng(spec.seed);
        let model = self.resolve_model(&spec.model, &mut rng)?;
        let loss = self.resolve_loss(spec.loss)?;

        let dataset = &spec.dataset;
        let mut dataset = Dataset::new(
            dataset.data.clone(),
            dataset.x_size,
            dataset.y_size,
            spec.batch_size,
        )?;

        if spec.shuffle {
            dataset = dataset.with_shuffle(rng.random());
        }

        debug!(
            params = model.size(),
            rows = dataset.rows(),
            shuffle = spec.shuffle;
            "built training setup"
        );

        Ok(TrainingSetup {
            model,
            dataset,
            loss,
            config: spec.training,
        })
    }

    /// Resolves a model spec into an initialized model.
    pub fn resolve_model<R: Rng>(&self, spec: &ModelSpec, rng: &mut R) -> Result<Sequential> {
        match spec {
            ModelSpec::Sequential {
                layers: layer_specs,
            } => {
                let layers = layer_specs
                    .iter()
                    .map(|ls| self.resolve_layer(*ls, &mut *rng))
                    .collect::<Result<Vec<_>>>()?;

                let mut model = Sequential::new(layers);
                model.init_params(rng)?;
                Ok(model)
            }
        }
    }

    fn resolve_layer<R: Rng>(&self, spec: LayerSpec, rng: &mut R) -> Result<Layer> {
        match spec {
            LayerSpec::Dense { dim, act_fn } => Ok(Layer::dense(dim, self.resolve_act_fn(act_fn))),
            LayerSpec::Dropout { p } => Layer::dropout(p, rng.random()),
        }
    }

    fn resolve_act_fn(&self, spec: Option<ActFnSpec>) -> Option<ActFn> {
        spec.map(|act_fn| match act_fn {
            ActFnSpec::Sigmoid { amp } => ActFn::sigmoid(amp),
            ActFnSpec::Relu => ActFn::relu(),
        })
    }

    /// Resolves a loss spec, checking its hyperparameters.
    pub fn resolve_loss(&self, spec: LossFnSpec) -> Result<Loss> {
        let loss = match spec {
            LossFnSpec::Focal {
                alpha,
                gamma,
                reduction,
            } => Loss::Focal(FocalLoss::new(alpha, gamma, reduction)?),
            LossFnSpec::BceWithLogits { reduction } => {
                Loss::BceWithLogits(BceWithLogits::new(reduction))
            }
            LossFnSpec::Mse => Loss::Mse(Mse::new()),
        };

        Ok(loss)
    }

    /// Generates a new random number generator given a seed.
    ///
    /// # Arguments
    /// * `seed` - An optional seed, the generator is seeded from the os when missing.
    ///
    /// # Returns
    /// A new random number generator.
    pub fn generate_rng(&self, seed: Option<u64>) -> StdRng {
        match seed {
            Some(n) => StdRng::seed_from_u64(n),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::{
        MlErr,
        arch::loss::Reduction,
        dataset::DataSource,
        specs::DatasetSpec,
    };

    fn spec(seed: Option<u64>) -> TrainerSpec {
        TrainerSpec {
            model: ModelSpec::Sequential {
                layers: vec![
                    LayerSpec::Dense {
                        dim: (2, 3),
                        act_fn: Some(ActFnSpec::Relu),
                    },
                    LayerSpec::Dropout { p: 0.2 },
                    LayerSpec::Dense {
                        dim: (3, 1),
                        act_fn: None,
                    },
                ],
            },
            loss: LossFnSpec::default(),
            dataset: DatasetSpec {
                data: vec![0., 0., 0., 0., 1., 1., 1., 0., 1., 1., 1., 0.],
                x_size: 2,
                y_size: 1,
            },
            training: TrainerConfig::default(),
            batch_size: NonZeroUsize::new(3).unwrap(),
            shuffle: true,
            seed,
        }
    }

    #[test]
    fn builds_every_component() {
        let setup = TrainerBuilder::new().build(&spec(Some(7))).unwrap();

        assert_eq!(setup.model.size(), 3 * 3 + 4);
        assert_eq!(setup.model.layers().len(), 3);
        assert_eq!(setup.dataset.rows(), 4);
        assert_eq!(setup.dataset.len(), 2);
        assert!(matches!(setup.loss, Loss::Focal(_)));
        assert_eq!(setup.config, TrainerConfig::default());
    }

    #[test]
    fn same_seed_same_parameters() {
        let builder = TrainerBuilder::new();
        let a = builder.build(&spec(Some(42))).unwrap();
        let b = builder.build(&spec(Some(42))).unwrap();

        assert_eq!(a.model.params(), b.model.params());
        assert!(a.model.params().iter().any(|&p| p != 0.));
    }

    #[test]
    fn invalid_parts_are_reported() {
        let builder = TrainerBuilder::new();

        let mut bad_loss = spec(None);
        bad_loss.loss = LossFnSpec::Focal {
            alpha: 2.,
            gamma: 2.,
            reduction: Reduction::Sum,
        };
        assert!(matches!(
            builder.build(&bad_loss),
            Err(MlErr::InvalidConfig { .. })
        ));

        let mut bad_dropout = spec(None);
        bad_dropout.model = ModelSpec::Sequential {
            layers: vec![LayerSpec::Dropout { p: 1. }],
        };
        assert!(builder.build(&bad_dropout).is_err());

        let mut bad_data = spec(None);
        bad_data.dataset.data.pop();
        assert!(matches!(
            builder.build(&bad_data),
            Err(MlErr::InvalidDataset(_))
        ));
    }
}
