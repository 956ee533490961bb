//! # Risk Label Construction
//!
//! Derives the binary depression-risk target from the indicator matrix:
//!
//! 1. Each domain sub-score is the row-wise mean of the domain's three indicators.
//! 2. The composite score is the weighted sum of the four sub-scores.
//! 3. The population mean of the composite score is taken over the whole table.
//! 4. A row is labelled 1 iff its composite score is strictly above that mean.
//!
//! The label is relative to the dataset, not to an absolute scale, so the
//! computation is two-pass: every composite score is materialized before any
//! row is thresholded. Missing values are carried through as `NaN` and then
//! rejected, never imputed.

use crate::config::DomainWeights;
use crate::indicators::{Domain, Indicator};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LabelError {
    #[error("Cannot derive risk labels from an empty dataset.")]
    EmptyDataset,
    #[error("The indicator matrix has {found} columns, but {expected} indicators are required.")]
    WrongColumnCount { found: usize, expected: usize },
    #[error(
        "The composite risk score of row {row} is undefined because one of its indicator values is missing or non-finite. Missing values are not imputed; fix the input data."
    )]
    UndefinedScore { row: usize },
}

/// The result of the two-pass label computation.
#[derive(Debug, Clone)]
pub struct RiskLabels {
    /// Per-row composite risk score.
    pub composite: Array1<f64>,
    /// Mean composite score over the whole dataset, the labelling threshold.
    pub population_mean: f64,
    /// 1 when the row's composite score exceeds the population mean, else 0.
    pub labels: Array1<u8>,
}

impl RiskLabels {
    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label == 1).count()
    }
}

/// Row-wise domain sub-scores. Shape: [n_observations, 4], columns in
/// [`Domain::ALL`] order. `NaN` inputs yield `NaN` sub-scores.
pub fn domain_scores(indicators: ArrayView2<f64>) -> Result<Array2<f64>, LabelError> {
    if indicators.ncols() != Indicator::ALL.len() {
        return Err(LabelError::WrongColumnCount {
            found: indicators.ncols(),
            expected: Indicator::ALL.len(),
        });
    }

    let mut scores = Array2::<f64>::zeros((indicators.nrows(), Domain::ALL.len()));
    for (row, mut out) in indicators
        .axis_iter(Axis(0))
        .zip(scores.axis_iter_mut(Axis(0)))
    {
        for (cell, domain) in out.iter_mut().zip(Domain::ALL) {
            let members = domain.indicators();
            let sum: f64 = members.iter().map(|m| row[m.index()]).sum();
            *cell = sum / members.len() as f64;
        }
    }
    Ok(scores)
}

/// Weighted combination of the domain sub-scores for every row.
pub fn composite_scores(
    indicators: ArrayView2<f64>,
    weights: &DomainWeights,
) -> Result<Array1<f64>, LabelError> {
    let sub_scores = domain_scores(indicators)?;
    let domain_weights =
        Array1::from_iter(Domain::ALL.iter().map(|&domain| weights.weight(domain)));
    Ok(sub_scores.dot(&domain_weights))
}

/// Computes composite scores, their population mean, and the binary labels.
pub fn risk_labels(
    indicators: ArrayView2<f64>,
    weights: &DomainWeights,
) -> Result<RiskLabels, LabelError> {
    if indicators.nrows() == 0 {
        return Err(LabelError::EmptyDataset);
    }

    // First pass: every composite score must exist before the threshold does.
    let composite = composite_scores(indicators, weights)?;
    if let Some(row) = composite.iter().position(|score| !score.is_finite()) {
        return Err(LabelError::UndefinedScore { row });
    }

    let population_mean = composite.sum() / composite.len() as f64;

    // Second pass: threshold against the dataset-wide mean.
    let labels = composite.mapv(|score| u8::from(score > population_mean));

    let result = RiskLabels {
        composite,
        population_mean,
        labels,
    };
    log::info!(
        "Derived risk labels: {} of {} observations above the population mean composite score {:.4}.",
        result.positive_count(),
        result.labels.len(),
        result.population_mean
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn row_with_domains(socio: [f64; 3], behav: [f64; 3], psych: [f64; 3], social: [f64; 3]) -> Vec<f64> {
        socio
            .into_iter()
            .chain(behav)
            .chain(psych)
            .chain(social)
            .collect()
    }

    /// Dyadic weights keep composite scores exact in floating point.
    fn dyadic_weights() -> DomainWeights {
        DomainWeights {
            psychological: 0.5,
            behavioral: 0.25,
            social: 0.125,
            socioeconomic: 0.125,
        }
    }

    fn matrix(rows: Vec<Vec<f64>>) -> Array2<f64> {
        let n = rows.len();
        Array2::from_shape_vec((n, 12), rows.into_iter().flatten().collect()).unwrap()
    }

    #[test]
    fn test_domain_scores_are_row_means() {
        let x = matrix(vec![row_with_domains(
            [0.0, 1.0, 2.0],
            [3.0, 3.0, 3.0],
            [1.0, 2.0, 3.0],
            [0.0, 0.0, 3.0],
        )]);
        let scores = domain_scores(x.view()).unwrap();
        for (score, expected) in scores.iter().zip([1.0, 3.0, 2.0, 1.0]) {
            assert_abs_diff_eq!(*score, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_composite_uses_fixed_domain_weights() {
        let x = matrix(vec![row_with_domains(
            [0.0, 1.0, 2.0],
            [3.0, 3.0, 3.0],
            [1.0, 2.0, 3.0],
            [0.0, 0.0, 3.0],
        )]);
        let composite = composite_scores(x.view(), &DomainWeights::default()).unwrap();
        // 0.1 * 1 + 0.3 * 3 + 0.4 * 2 + 0.2 * 1
        assert_abs_diff_eq!(composite[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_population_mean_matches_direct_recomputation() {
        let rows: Vec<Vec<f64>> = (0..25)
            .map(|i| (0..12).map(|j| ((i * 7 + j * 3) % 4) as f64).collect())
            .collect();
        let x = matrix(rows.clone());
        let result = risk_labels(x.view(), &DomainWeights::default()).unwrap();

        let direct: Vec<f64> = rows
            .iter()
            .map(|row| {
                let mean = |indicators: [Indicator; 3]| {
                    indicators.iter().map(|i| row[i.index()]).sum::<f64>() / 3.0
                };
                0.4 * mean(Domain::Psychological.indicators())
                    + 0.3 * mean(Domain::Behavioral.indicators())
                    + 0.2 * mean(Domain::Social.indicators())
                    + 0.1 * mean(Domain::Socioeconomic.indicators())
            })
            .collect();
        let direct_mean = direct.iter().sum::<f64>() / direct.len() as f64;

        assert_abs_diff_eq!(result.population_mean, direct_mean, epsilon = 1e-12);
        for (score, expected) in result.composite.iter().zip(&direct) {
            assert_abs_diff_eq!(*score, *expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_label_is_strictly_above_mean() {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| (0..12).map(|j| ((i + j) % 4) as f64).collect())
            .collect();
        let x = matrix(rows);
        let result = risk_labels(x.view(), &DomainWeights::default()).unwrap();
        for (score, label) in result.composite.iter().zip(result.labels.iter()) {
            assert_eq!(*label == 1, *score > result.population_mean);
        }
    }

    #[test]
    fn test_score_equal_to_mean_is_labelled_zero() {
        // Three rows with composites 1, 2, 3: the middle row sits exactly on the mean.
        let x = matrix(vec![vec![1.0; 12], vec![2.0; 12], vec![3.0; 12]]);
        let result = risk_labels(x.view(), &dyadic_weights()).unwrap();
        assert_eq!(result.composite[1], result.population_mean);
        assert_eq!(result.labels, array![0u8, 0, 1]);
    }

    #[test]
    fn test_constant_dataset_labels_everything_zero() {
        let x = matrix(vec![vec![2.0; 12]; 8]);
        let result = risk_labels(x.view(), &dyadic_weights()).unwrap();
        assert_eq!(result.positive_count(), 0);
    }

    #[test]
    fn test_missing_value_fails_visibly() {
        let mut rows = vec![vec![1.0; 12]; 5];
        rows[3][Indicator::Anxiety.index()] = f64::NAN;
        let x = matrix(rows);

        // The NaN propagates into the sub-score rather than being defaulted.
        let scores = domain_scores(x.view()).unwrap();
        assert!(scores[[3, 2]].is_nan());
        assert!(scores[[3, 0]].is_finite());

        let err = risk_labels(x.view(), &DomainWeights::default()).unwrap_err();
        assert_eq!(err, LabelError::UndefinedScore { row: 3 });
    }

    #[test]
    fn test_rejects_empty_and_misshapen_input() {
        let empty = Array2::<f64>::zeros((0, 12));
        assert_eq!(
            risk_labels(empty.view(), &DomainWeights::default()).unwrap_err(),
            LabelError::EmptyDataset
        );

        let narrow = Array2::<f64>::zeros((3, 11));
        assert_eq!(
            risk_labels(narrow.view(), &DomainWeights::default()).unwrap_err(),
            LabelError::WrongColumnCount {
                found: 11,
                expected: 12
            }
        );
    }
}
