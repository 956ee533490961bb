//! Seeded train/test partitioning of observation rows.
//!
//! The indicator table goes into a `linfa` dataset whose targets are the row
//! numbers, so the shuffled partitions still know which observations they
//! hold. The held-out partition is the first `ceil(test_fraction * n)` rows of
//! the shuffle.

use linfa::Dataset;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Ix1};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SplitError {
    #[error(
        "Cannot split {rows} rows with test fraction {test_fraction}: both the training and the test partition must be non-empty."
    )]
    TooFewRows { rows: usize, test_fraction: f64 },
    #[error("The test fraction must lie strictly between 0 and 1, got {0}.")]
    InvalidTestFraction(f64),
    #[error("The table has {rows} rows but {labels} labels were given.")]
    LengthMismatch { rows: usize, labels: usize },
}

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// The rows of one partition, their labels, and where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub rows: Vec<usize>,
    pub records: Array2<f64>,
    pub labels: Array1<u8>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Partition,
    pub test: Partition,
}

impl TrainTestSplit {
    pub fn indices(&self) -> SplitIndices {
        SplitIndices {
            train: self.train.rows.clone(),
            test: self.test.rows.clone(),
        }
    }
}

/// Size of the held-out partition, rounded the way `split_with_ratio` rounds.
fn held_out_rows(n_rows: usize, test_fraction: f64) -> usize {
    (n_rows as f32 * test_fraction as f32).ceil() as usize
}

fn partition(dataset: &Dataset<f64, usize, Ix1>, y: ArrayView1<u8>) -> Partition {
    let rows = dataset.targets().to_vec();
    Partition {
        labels: y.select(Axis(0), &rows),
        records: dataset.records().clone(),
        rows,
    }
}

/// Shuffles the rows of `x` with a `StdRng` seeded from `seed` and holds out
/// `ceil(test_fraction * n)` of them. The shuffle depends only on the row count
/// and the seed, never on the values.
pub fn train_test_split(
    x: ArrayView2<f64>,
    y: ArrayView1<u8>,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit, SplitError> {
    let n_rows = x.nrows();
    if y.len() != n_rows {
        return Err(SplitError::LengthMismatch {
            rows: n_rows,
            labels: y.len(),
        });
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SplitError::InvalidTestFraction(test_fraction));
    }
    let n_test = held_out_rows(n_rows, test_fraction);
    if n_test == 0 || n_test >= n_rows {
        return Err(SplitError::TooFewRows {
            rows: n_rows,
            test_fraction,
        });
    }

    let dataset = Dataset::new(x.to_owned(), Array1::from_iter(0..n_rows));
    let mut rng = StdRng::seed_from_u64(seed);
    let (test, train) = dataset
        .shuffle(&mut rng)
        .split_with_ratio(test_fraction as f32);

    let split = TrainTestSplit {
        train: partition(&train, y),
        test: partition(&test, y),
    };
    log::info!(
        "Split {n_rows} rows into {} training and {} test rows (seed {seed}).",
        split.train.len(),
        split.test.len()
    );
    Ok(split)
}
