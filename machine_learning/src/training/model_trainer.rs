use log::{debug, trace};

use super::{ExpMovingAvg, Metrics, TRAIN_LOSS, Trainer, TrainerConfig};
use crate::{
    MlErr, Result,
    arch::{Model, loss::LossFn},
    dataset::DataSource,
    device::Device,
    optimization::{LambdaLr, Optimizer, Sgd},
};

/// How much of the running loss average is kept on every step.
const LOSS_DECAY: f32 = 0.8;

/// A model `Trainer`. Borrows the model and the data source for as long as it lives, and owns the
/// optimizer and the learning rate schedule it builds for them.
///
/// The learning rate follows a cosine curve from the configured rate down to the configured
/// minimum over `epochs * data.len()` steps, one step per batch.
pub struct ModelTrainer<'a, M, D, L, V>
where
    M: Model,
    D: DataSource,
    L: LossFn,
    V: Device,
{
    model: &'a mut M,
    data: &'a mut D,
    loss_fn: L,
    device: V,

    optimizer: Sgd,
    scheduler: LambdaLr,
    epochs_run: usize,
}

impl<'a, M, D, L, V> ModelTrainer<'a, M, D, L, V>
where
    M: Model,
    D: DataSource,
    L: LossFn,
    V: Device,
{
    /// Creates a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `data` - The source of training batches, must yield at least one batch per pass.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `device` - Where every batch is placed before the forward pass.
    /// * `config` - The optimizer and schedule hyperparameters.
    ///
    /// # Returns
    /// A new `ModelTrainer` or an error if the configuration is invalid or the data source is empty.
    pub fn new(
        model: &'a mut M,
        data: &'a mut D,
        loss_fn: L,
        device: V,
        config: &TrainerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let batches = data.len();
        if batches == 0 {
            return Err(MlErr::EmptyDataSource);
        }

        let mut optimizer = Sgd::new(
            model.size(),
            config.learning_rate,
            config.momentum,
            config.weight_decay,
            true,
        )?;

        let total_steps = config.epochs.get() * batches;
        let scheduler = LambdaLr::cosine(&mut optimizer, total_steps, config.min_learning_rate);

        debug!(
            params = model.size(),
            batches = batches,
            total_steps = total_steps,
            device = device.name();
            "created model trainer"
        );

        Ok(Self {
            model,
            data,
            loss_fn,
            device,
            optimizer,
            scheduler,
            epochs_run: 0,
        })
    }

    /// Performs one epoch of training: a single pass over the data source, taking an optimizer
    /// and a schedule step per batch.
    ///
    /// # Returns
    /// The epoch metrics, holding the exponentially smoothed loss under `TRAIN_LOSS`.
    pub fn train_epoch(&mut self) -> Result<Metrics> {
        self.model.train();

        let expected = self.data.len();
        let mut loss_avg = ExpMovingAvg::new(LOSS_DECAY);
        let mut batches = self.data.batches();

        for seen in 0..expected {
            let (x, y) = batches.next().ok_or(MlErr::DataSourceExhausted {
                got: seen,
                expected,
            })?;

            let x = self.device.place(x)?;
            let y = self.device.place(y)?;

            let y_pred = self.model.forward(x.view())?;
            let loss = self.loss_fn.loss(y_pred.view(), y.view())?;
            let d = self.loss_fn.loss_prime(y_pred.view(), y.view())?;

            self.model.zero_grad();
            self.model.backward(d)?;

            let (params, grad) = self.model.params_and_grad();
            self.optimizer.update_params(params, grad)?;
            self.scheduler.step(&mut self.optimizer);

            let avg = loss_avg.update(loss);
            trace!(
                step = self.scheduler.last_step(),
                loss = loss,
                avg = avg,
                lr = self.optimizer.learning_rate();
                "train step"
            );
        }

        self.epochs_run += 1;

        let mut metrics = Metrics::new();
        metrics.insert(TRAIN_LOSS, loss_avg.value());

        debug!(
            epoch = self.epochs_run,
            train_loss = loss_avg.value(),
            lr = self.optimizer.learning_rate();
            "finished epoch"
        );

        Ok(metrics)
    }

    /// Returns the amount of optimizer steps taken since the trainer was created.
    pub fn global_step(&self) -> usize {
        self.scheduler.last_step()
    }

    /// Returns the learning rate the next step will use.
    pub fn learning_rate(&self) -> f32 {
        self.optimizer.learning_rate()
    }

    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    pub fn model(&self) -> &M {
        self.model
    }
}

impl<M, D, L, V> Trainer for ModelTrainer<'_, M, D, L, V>
where
    M: Model,
    D: DataSource,
    L: LossFn,
    V: Device,
{
    fn train_epoch(&mut self) -> Result<Metrics> {
        self.train_epoch()
    }
}
