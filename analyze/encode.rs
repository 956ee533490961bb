//! One-hot encoding and standardization of the indicator matrix.
//!
//! The encoded column order is the contract the weight extractor relies on:
//! indicators in canonical order, and within an indicator its category levels
//! in ascending value order. Every indicator must have exactly `K` levels when
//! the encoder is fitted; anything else fails immediately instead of producing
//! a coefficient vector whose slices straddle two features.

use crate::indicators::Indicator;
use crate::pipeline::{PipelineError, Transform};
use linfa::DatasetBase;
use linfa::traits::{Fit, Transformer};
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum EncodeError {
    #[error(
        "Feature '{feature}' has {found} distinct category levels {levels:?}, but every feature must have exactly {expected}."
    )]
    CategoryCount {
        feature: String,
        expected: usize,
        found: usize,
        levels: Vec<f64>,
    },
    #[error("Feature '{feature}' has a non-finite value at row {row}.")]
    NonFiniteValue { feature: String, row: usize },
    #[error(
        "Feature '{feature}' has value {value} at row {row}, which was not seen when the encoder was fitted."
    )]
    UnknownCategory {
        feature: String,
        row: usize,
        value: f64,
    },
    #[error("Expected {expected} input columns, found {found}.")]
    WrongColumnCount { expected: usize, found: usize },
    #[error("Cannot fit on an empty matrix.")]
    EmptyInput,
    #[error("Standard scaling failed: {0}")]
    Scaling(String),
    #[error("The transform was used before it was fitted.")]
    NotFitted,
}

/// The fitted category levels of every feature.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingLayout {
    pub features: Vec<Indicator>,
    /// Sorted, distinct levels per feature.
    pub levels: Vec<Vec<f64>>,
}

impl EncodingLayout {
    pub fn n_columns(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Name of each encoded column, e.g. `mood_2`.
    pub fn column_names(&self) -> Vec<String> {
        self.features
            .iter()
            .zip(&self.levels)
            .flat_map(|(feature, levels)| {
                levels.iter().map(move |level| format!("{}_{}", feature.name(), level))
            })
            .collect()
    }
}

/// One indicator column expands into one 0/1 column per category level.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    features: Vec<Indicator>,
    categories_per_feature: usize,
    layout: Option<EncodingLayout>,
}

impl OneHotEncoder {
    pub fn new(features: Vec<Indicator>, categories_per_feature: usize) -> Self {
        Self {
            features,
            categories_per_feature,
            layout: None,
        }
    }

    pub fn layout(&self) -> Option<&EncodingLayout> {
        self.layout.as_ref()
    }

    fn check_columns(&self, x: &ArrayView2<f64>) -> Result<(), EncodeError> {
        if x.ncols() != self.features.len() {
            return Err(EncodeError::WrongColumnCount {
                expected: self.features.len(),
                found: x.ncols(),
            });
        }
        Ok(())
    }

    fn fit_layout(&mut self, x: ArrayView2<f64>) -> Result<(), EncodeError> {
        self.check_columns(&x)?;
        if x.nrows() == 0 {
            return Err(EncodeError::EmptyInput);
        }

        let mut levels = Vec::with_capacity(self.features.len());
        for (feature, column) in self.features.iter().zip(x.axis_iter(Axis(1))) {
            if let Some(row) = column.iter().position(|v| !v.is_finite()) {
                return Err(EncodeError::NonFiniteValue {
                    feature: feature.name().to_string(),
                    row,
                });
            }
            let mut distinct: Vec<f64> = column.to_vec();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();

            if distinct.len() != self.categories_per_feature {
                return Err(EncodeError::CategoryCount {
                    feature: feature.name().to_string(),
                    expected: self.categories_per_feature,
                    found: distinct.len(),
                    levels: distinct,
                });
            }
            levels.push(distinct);
        }

        let layout = EncodingLayout {
            features: self.features.clone(),
            levels,
        };
        log::debug!("One-hot layout: {:?}", layout.column_names());
        self.layout = Some(layout);
        Ok(())
    }

    fn encode(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, EncodeError> {
        let layout = self.layout.as_ref().ok_or(EncodeError::NotFitted)?;
        self.check_columns(&x)?;

        let mut encoded = Array2::<f64>::zeros((x.nrows(), layout.n_columns()));
        let mut offset = 0;
        for ((feature, levels), column) in layout
            .features
            .iter()
            .zip(&layout.levels)
            .zip(x.axis_iter(Axis(1)))
        {
            for (row, &value) in column.iter().enumerate() {
                if !value.is_finite() {
                    return Err(EncodeError::NonFiniteValue {
                        feature: feature.name().to_string(),
                        row,
                    });
                }
                let level = levels
                    .binary_search_by(|known| known.total_cmp(&value))
                    .map_err(|_| EncodeError::UnknownCategory {
                        feature: feature.name().to_string(),
                        row,
                        value,
                    })?;
                encoded[[row, offset + level]] = 1.0;
            }
            offset += levels.len();
        }
        Ok(encoded)
    }
}

impl Transform for OneHotEncoder {
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<(), PipelineError> {
        Ok(self.fit_layout(x)?)
    }

    fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PipelineError> {
        Ok(self.encode(x)?)
    }
}

/// Centres every column to zero mean and scales it to unit variance with
/// `linfa-preprocessing`'s standard linear scaler. Constant columns are
/// centred but left unscaled.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    fitted: Option<LinearScaler<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-column means removed by the scaler.
    pub fn means(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(LinearScaler::offsets)
    }
}

impl Transform for StandardScaler {
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<(), PipelineError> {
        if x.nrows() == 0 {
            return Err(EncodeError::EmptyInput.into());
        }
        let dataset = DatasetBase::from(x.to_owned());
        let fitted = LinearScaler::standard()
            .fit(&dataset)
            .map_err(|e| EncodeError::Scaling(e.to_string()))?;
        self.fitted = Some(fitted);
        Ok(())
    }

    fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PipelineError> {
        let fitted = self.fitted.as_ref().ok_or(EncodeError::NotFitted)?;
        let expected = fitted.offsets().len();
        if x.ncols() != expected {
            return Err(EncodeError::WrongColumnCount {
                expected,
                found: x.ncols(),
            }
            .into());
        }
        let scaled: Array2<f64> = fitted.transform(x.to_owned());
        Ok(scaled)
    }
}
