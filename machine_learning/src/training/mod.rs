mod builder;
mod config;
mod metrics;
mod model_trainer;
mod trainer;

pub use builder::{TrainerBuilder, TrainingSetup};
pub use config::TrainerConfig;
pub use metrics::{ExpMovingAvg, Metrics, TRAIN_LOSS};
pub use model_trainer::ModelTrainer;
pub use trainer::Trainer;
