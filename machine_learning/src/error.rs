use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidConfig {
        what: &'static str,
        reason: String,
    },
    InvalidDataset(String),
    EmptyDataSource,
    DataSourceExhausted {
        got: usize,
        expected: usize,
    },
    MissingForward,
    Device {
        device: String,
        reason: String,
    },
    InvalidDistribution(String),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            MlErr::InvalidConfig { what, reason } => {
                write!(f, "Invalid value for {what}: {reason}")
            }
            MlErr::InvalidDataset(reason) => write!(f, "Invalid dataset: {reason}"),
            MlErr::EmptyDataSource => {
                write!(f, "The data source must yield at least one batch per epoch")
            }
            MlErr::DataSourceExhausted { got, expected } => write!(
                f,
                "The data source ran out of batches, yielded {got} of the expected {expected}"
            ),
            MlErr::MissingForward => write!(
                f,
                "Tried to run a backward pass without a previous forward pass"
            ),
            MlErr::Device { device, reason } => {
                write!(f, "Failed to place data on device {device}: {reason}")
            }
            MlErr::InvalidDistribution(reason) => {
                write!(f, "Invalid sampling distribution: {reason}")
            }
        }
    }
}

impl Error for MlErr {}

impl From<rand_distr::uniform::Error> for MlErr {
    fn from(value: rand_distr::uniform::Error) -> Self {
        Self::InvalidDistribution(value.to_string())
    }
}

impl From<rand_distr::BernoulliError> for MlErr {
    fn from(value: rand_distr::BernoulliError) -> Self {
        Self::InvalidDistribution(value.to_string())
    }
}
