use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow};
use log::info;
use machine_learning::{
    device::Cpu,
    specs::TrainerSpec,
    training::{Metrics, ModelTrainer, TrainerBuilder},
};
use serde::Serialize;

/// The metrics of one finished epoch, numbered from `1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochReport {
    pub epoch: usize,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// The environment variable holding the spec path when no argument is given.
pub const SPEC_VAR: &str = "TRAINER_SPEC";

/// Picks the training spec path: the first argument wins over the `SPEC_VAR` variable.
///
/// # Returns
/// The path or a usage error if neither is set.
pub fn spec_path(arg: Option<OsString>, var: Option<OsString>) -> anyhow::Result<PathBuf> {
    arg.or(var)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: epoch-trainer <spec.json>, or set {SPEC_VAR}"))
}

/// Parses a JSON training spec.
pub fn parse_spec(json: &str) -> anyhow::Result<TrainerSpec> {
    serde_json::from_str(json).context("malformed training spec")
}

/// Reads and parses the JSON training spec at `path`.
pub fn load_spec(path: &Path) -> anyhow::Result<TrainerSpec> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read training spec {}", path.display()))?;
    parse_spec(&json).with_context(|| format!("in {}", path.display()))
}

/// Trains on the cpu for every epoch the spec configures.
///
/// # Arguments
/// * `spec` - The training run to perform.
/// * `on_epoch` - Called with the report of each epoch as soon as it finishes.
///
/// # Returns
/// The first error raised while building the components, training, or reporting.
pub fn run<F>(spec: &TrainerSpec, mut on_epoch: F) -> anyhow::Result<()>
where
    F: FnMut(&EpochReport) -> anyhow::Result<()>,
{
    let mut setup = TrainerBuilder::new()
        .build(spec)
        .context("invalid training spec")?;

    let epochs = setup.config.epochs.get();
    let mut trainer = ModelTrainer::new(
        &mut setup.model,
        &mut setup.dataset,
        setup.loss,
        Cpu,
        &setup.config,
    )?;

    info!("training for {epochs} epochs");

    for epoch in 1..=epochs {
        let metrics = trainer
            .train_epoch()
            .with_context(|| format!("epoch {epoch} failed"))?;

        on_epoch(&EpochReport { epoch, metrics })?;
    }

    info!(
        "finished training after {} steps, learning rate {}",
        trainer.global_step(),
        trainer.learning_rate()
    );

    Ok(())
}
