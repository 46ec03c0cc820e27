mod optimizer;
mod scheduler;
mod sgd;

pub use optimizer::Optimizer;
pub use scheduler::{LambdaLr, cosine_annealing};
pub use sgd::Sgd;
