//! # Survey Data Loading
//!
//! This module is the only entry point for the survey table. It reads a
//! comma-separated file with a header row, checks that the twelve indicator
//! columns are present, and converts them into the dense `ndarray` matrix the
//! rest of the crate works on.
//!
//! - Strict Schema: the twelve indicator column names are not configurable.
//!   Any other column (for example a leading row index) is ignored.
//! - Missing values are not imputed. An empty cell becomes `NaN` so that the
//!   label computation fails loudly on the affected row instead of silently
//!   defaulting it. Text in a numeric column is rejected here.

use crate::indicators::Indicator;
use ndarray::Array2;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Fewest rows accepted for an analysis run.
pub const MINIMUM_ROWS: usize = 10;

/// The indicator matrix of one survey table.
#[derive(Debug, Clone)]
pub struct SurveyData {
    /// Shape: [n_observations, 12]. Column `j` holds `Indicator::ALL[j]`.
    pub indicators: Array2<f64>,
}

impl SurveyData {
    pub fn n_observations(&self) -> usize {
        self.indicators.nrows()
    }

    /// Number of cells that were empty or `NaN` in the input.
    pub fn missing_cells(&self) -> usize {
        self.indicators.iter().filter(|v| v.is_nan()).count()
    }
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(
        "The required column '{0}' was not found in the input file. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error(
        "The required column '{column_name}' could not be converted to the expected type '{expected_type}'. It contains non-numeric data. (Found type: {found_type})"
    )]
    ColumnWrongType {
        column_name: String,
        expected_type: &'static str,
        found_type: String,
    },
    #[error("Input file contains only {found} data rows, but at least {required} are required.")]
    InsufficientRows { found: usize, required: usize },
}

/// Loads the survey table at `path`.
pub fn load_survey_data(path: &Path) -> Result<SurveyData, DataError> {
    log::info!("Loading survey data from '{}'", path.display());

    let df = CsvReader::new(File::open(path)?)
        .with_options(
            CsvReadOptions::default()
                .with_has_header(true)
                .with_parse_options(CsvParseOptions::default().with_separator(b',')),
        )
        .finish()?;

    survey_from_frame(&df)
}

/// Validates an already-parsed frame and extracts the indicator matrix.
pub fn survey_from_frame(df: &DataFrame) -> Result<SurveyData, DataError> {
    if df.height() < MINIMUM_ROWS {
        return Err(DataError::InsufficientRows {
            found: df.height(),
            required: MINIMUM_ROWS,
        });
    }

    let columns_set: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    for indicator in Indicator::ALL {
        if !columns_set.contains(indicator.name()) {
            return Err(DataError::ColumnNotFound(indicator.name().to_string()));
        }
    }
    log::debug!(
        "All indicator columns found; ignoring {} extra column(s).",
        columns_set.len() - Indicator::ALL.len()
    );

    let n = df.height();
    let mut matrix = Array2::<f64>::zeros((n, Indicator::ALL.len()));
    for indicator in Indicator::ALL {
        let values = extract_numeric_column(df, indicator.name())?;
        matrix
            .column_mut(indicator.index())
            .iter_mut()
            .zip(values)
            .for_each(|(cell, value)| *cell = value);
    }

    let data = SurveyData {
        indicators: matrix,
    };
    let missing = data.missing_cells();
    if missing > 0 {
        log::warn!(
            "{missing} indicator cell(s) are missing; the label computation will reject the affected rows."
        );
    }
    log::info!("Loaded {} observations.", data.n_observations());
    Ok(data)
}

/// Casts a column to `f64`. Nulls become `NaN`; values that fail to parse are
/// an error.
fn extract_numeric_column(df: &DataFrame, column_name: &str) -> Result<Vec<f64>, DataError> {
    let series = df.column(column_name)?;
    let nulls_before = series.null_count();

    let wrong_type = || DataError::ColumnWrongType {
        column_name: column_name.to_string(),
        expected_type: "f64 (numeric)",
        found_type: format!("{:?}", series.dtype()),
    };

    let casted = series.cast(&DataType::Float64).map_err(|_| wrong_type())?;
    if casted.null_count() > nulls_before {
        return Err(wrong_type());
    }

    let values = casted
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect();
    Ok(values)
}
