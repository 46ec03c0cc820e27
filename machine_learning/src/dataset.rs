use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2, Axis};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{MlErr, Result};

/// An `(input, target)` batch, one sample per row.
pub type Batch<'a> = (ArrayView2<'a, f32>, ArrayView2<'a, f32>);

/// A producer of labeled batches.
///
/// Every pass over the source yields exactly `len()` batches.
pub trait DataSource {
    /// Returns the amount of batches yielded per pass.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a new pass over the source.
    fn batches(&mut self) -> impl Iterator<Item = Batch<'_>>;
}

/// An in-memory dataset split into fixed size batches.
///
/// Each row of `data` holds the `x_size` inputs followed by the `y_size` targets of a sample.
/// The last batch is smaller when the amount of rows is not a multiple of the batch size.
#[derive(Debug, Clone)]
pub struct Dataset {
    data: Array2<f32>,
    x_size: usize,
    batch_size: NonZeroUsize,
    rng: Option<StdRng>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `data` - The row-major samples.
    /// * `x_size` - The amount of input columns.
    /// * `y_size` - The amount of target columns.
    /// * `batch_size` - The amount of rows per batch.
    ///
    /// # Returns
    /// A new `Dataset` or an error if `data` can't be split into rows of `x_size + y_size`.
    pub fn new(
        data: Vec<f32>,
        x_size: usize,
        y_size: usize,
        batch_size: NonZeroUsize,
    ) -> Result<Self> {
        if x_size == 0 || y_size == 0 {
            return Err(MlErr::InvalidDataset(format!(
                "both input and target widths must be positive, got {x_size} and {y_size}"
            )));
        }

        let width = x_size + y_size;
        if data.is_empty() || data.len() % width != 0 {
            return Err(MlErr::InvalidDataset(format!(
                "{} values can't be split into rows of {width}",
                data.len()
            )));
        }

        let rows = data.len() / width;
        let data = Array2::from_shape_vec((rows, width), data)
            .map_err(|e| MlErr::InvalidDataset(e.to_string()))?;

        Ok(Self {
            data,
            x_size,
            batch_size,
            rng: None,
        })
    }

    /// Shuffles the rows at the start of every pass, using a generator seeded with `seed`.
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    /// Returns the amount of samples in the dataset.
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Returns every sample split into inputs and targets.
    pub fn view(&self) -> Batch<'_> {
        self.data.view().split_at(Axis(1), self.x_size)
    }
}

impl DataSource for Dataset {
    fn len(&self) -> usize {
        self.rows().div_ceil(self.batch_size.get())
    }

    fn batches(&mut self) -> impl Iterator<Item = Batch<'_>> {
        if let Some(rng) = &mut self.rng {
            let mut order: Vec<usize> = (0..self.data.nrows()).collect();
            order.shuffle(rng);
            self.data = self.data.select(Axis(0), &order);
        }

        let x_size = self.x_size;
        self.data
            .axis_chunks_iter(Axis(0), self.batch_size.get())
            .map(move |chunk| chunk.split_at(Axis(1), x_size))
    }
}
