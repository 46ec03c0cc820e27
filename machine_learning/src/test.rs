#![cfg(test)]

use std::num::NonZeroUsize;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    arch::{
        Model, Sequential,
        activations::ActFn,
        layers::Layer,
        loss::{BceWithLogits, FocalLoss, Reduction},
    },
    dataset::Dataset,
    device::Cpu,
    training::{ModelTrainer, Trainer, TrainerConfig},
};

fn config(learning_rate: f32, epochs: usize) -> TrainerConfig {
    TrainerConfig {
        learning_rate,
        epochs: NonZeroUsize::new(epochs).unwrap(),
        ..Default::default()
    }
}

#[test]
fn test_ml_and2_gate_convergence() {
    let and2 = vec![
        0.0, 0.0, 0.0, // 1
        0.0, 1.0, 0.0, // 3
        1.0, 0.0, 0.0, // 5
        1.0, 1.0, 1.0, // 8
    ];

    let mut dataset = Dataset::new(and2, 2, 1, NonZeroUsize::new(4).unwrap()).unwrap();
    let mut model = Sequential::new([Layer::dense((2, 1), None)]);
    let epochs = 500;

    let mut trainer = ModelTrainer::new(
        &mut model,
        &mut dataset,
        BceWithLogits::new(Reduction::Mean),
        Cpu,
        &config(0.5, epochs),
    )
    .unwrap();

    for _ in 0..epochs {
        trainer.train_epoch().unwrap();
    }

    model.eval();
    let (x, y) = dataset.view();
    let logits = model.forward(x).unwrap();

    for (z, y) in logits.iter().zip(y.iter()) {
        assert_eq!(*z > 0., *y == 1., "logits: {logits:?}");
    }
}

#[test]
fn test_ml_and3_gate_loss_decreases() {
    let and3 = vec![
        0.0, 0.0, 0.0, 0.0, // 1
        0.0, 0.0, 1.0, 0.0, // 1
        0.0, 1.0, 0.0, 0.0, // 1
        0.0, 1.0, 1.0, 0.0, // 1
        1.0, 0.0, 0.0, 0.0, // 1
        1.0, 0.0, 1.0, 0.0, // 1
        1.0, 1.0, 0.0, 0.0, // 1
        1.0, 1.0, 1.0, 1.0, // 1
    ];

    let mut dataset = Dataset::new(and3, 3, 1, NonZeroUsize::new(4).unwrap())
        .unwrap()
        .with_shuffle(5);
    let mut model = Sequential::new([
        Layer::dense((3, 4), Some(ActFn::sigmoid(1.0))),
        Layer::dense((4, 1), None),
    ]);
    model.init_params(&mut StdRng::seed_from_u64(5)).unwrap();

    let epochs = 150;
    let mut trainer = ModelTrainer::new(
        &mut model,
        &mut dataset,
        FocalLoss::default(),
        Cpu,
        &config(0.05, epochs),
    )
    .unwrap();

    let trainer: &mut dyn Trainer = &mut trainer;
    let mut losses = Vec::with_capacity(epochs);
    for _ in 0..epochs {
        let metrics = trainer.train_epoch().unwrap();
        losses.push(metrics.train_loss().unwrap());
    }

    let first = losses[..10].iter().sum::<f32>();
    let last = losses[epochs - 10..].iter().sum::<f32>();
    assert!(last < first, "loss went from {first} to {last}");
}
