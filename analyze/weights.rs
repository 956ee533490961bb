//! # Weight Profile Extraction
//!
//! Turns the fitted classifier's flat coefficient vector into one weight
//! profile per indicator. Indicator `j` owns the `K` consecutive coefficients
//! `[j * K, (j + 1) * K)`, one per one-hot category level. Each slice is
//! processed independently:
//!
//! 1. `min`, `max` and `range = max - min` of the raw coefficients.
//! 2. A zero range (a non-discriminating feature) gives an all-zero profile.
//! 3. Otherwise every coefficient is mapped affinely onto the configured
//!    display range, `lo + (c - min) / range * (hi - lo)`.
//! 4. The profile's own mean is subtracted so it always sums to zero.
//!
//! There is no cross-indicator normalization. Only the shape of a profile is
//! meaningful; centring shifts the `[lo, hi]` bounds by a per-feature amount,
//! so the bounds are a display heuristic rather than a global scale.

use crate::indicators::Indicator;
use itertools::Itertools;
use ndarray::ArrayView1;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum WeightError {
    #[error(
        "Coefficient vector has {actual} entries, but {features} features x {categories} categories requires exactly {expected}. The encoding layout does not match the fitted model."
    )]
    LayoutMismatch {
        expected: usize,
        actual: usize,
        features: usize,
        categories: usize,
    },
    #[error("Coefficient slice for '{feature}' has {actual} entries, expected {expected}.")]
    SliceLength {
        feature: String,
        expected: usize,
        actual: usize,
    },
    #[error("At least one category per feature is required to partition the coefficients.")]
    NoCategories,
    #[error("Coefficient {index} for '{feature}' is not finite ({value}).")]
    NonFiniteCoefficient {
        feature: String,
        index: usize,
        value: f64,
    },
}

/// The normalized, zero-centred weights of one indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWeights {
    pub feature: Indicator,
    /// One weight per category level, in encoding order.
    pub weights: Vec<f64>,
}

impl FeatureWeights {
    /// Largest absolute weight; the ranking key for feature importance.
    pub fn importance(&self) -> f64 {
        self.weights.iter().fold(0.0_f64, |acc, w| acc.max(w.abs()))
    }
}

/// Weight profiles of every indicator, in indicator-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightProfiles {
    profiles: Vec<FeatureWeights>,
}

impl WeightProfiles {
    pub fn new(profiles: Vec<FeatureWeights>) -> Self {
        Self { profiles }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureWeights> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, feature: Indicator) -> Option<&FeatureWeights> {
        self.profiles.iter().find(|p| p.feature == feature)
    }

    /// `(feature, importance)` pairs sorted by descending importance. Ties
    /// keep indicator-list order.
    pub fn ranked_importance(&self) -> Vec<(Indicator, f64)> {
        self.profiles
            .iter()
            .map(|p| (p.feature, p.importance()))
            .sorted_by(|a, b| b.1.total_cmp(&a.1))
            .collect()
    }
}

impl<'a> IntoIterator for &'a WeightProfiles {
    type Item = &'a FeatureWeights;
    type IntoIter = std::slice::Iter<'a, FeatureWeights>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

/// Normalizes one feature's coefficient slice into a zero-centred profile.
pub fn normalize_slice(slice: &[f64], affine_range: (f64, f64)) -> Vec<f64> {
    let (lo, hi) = affine_range;
    let min = slice.iter().copied().fold(f64::INFINITY, f64::min);
    let max = slice.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let mut profile: Vec<f64> = if range == 0.0 {
        vec![0.0; slice.len()]
    } else {
        slice
            .iter()
            .map(|&c| lo + ((c - min) / range) * (hi - lo))
            .collect()
    };

    if !profile.is_empty() {
        let mean = profile.iter().sum::<f64>() / profile.len() as f64;
        profile.iter_mut().for_each(|w| *w -= mean);
    }
    profile
}

/// Splits `coefficients` into per-feature slices of `categories` entries and
/// normalizes each. The input is only read; profiles are freshly allocated.
pub fn extract_weight_profiles(
    coefficients: ArrayView1<f64>,
    features: &[Indicator],
    categories: usize,
    affine_range: (f64, f64),
) -> Result<WeightProfiles, WeightError> {
    if categories == 0 {
        return Err(WeightError::NoCategories);
    }
    let expected = features.len() * categories;
    if coefficients.len() != expected {
        return Err(WeightError::LayoutMismatch {
            expected,
            actual: coefficients.len(),
            features: features.len(),
            categories,
        });
    }

    let flat: Vec<f64> = coefficients.iter().copied().collect();
    let mut profiles = Vec::with_capacity(features.len());
    for (&feature, slice) in features.iter().zip(flat.chunks(categories)) {
        if slice.len() != categories {
            return Err(WeightError::SliceLength {
                feature: feature.name().to_string(),
                expected: categories,
                actual: slice.len(),
            });
        }
        if let Some((index, &value)) = slice.iter().find_position(|c| !c.is_finite()) {
            return Err(WeightError::NonFiniteCoefficient {
                feature: feature.name().to_string(),
                index,
                value,
            });
        }

        let weights = normalize_slice(slice, affine_range);
        log::debug!("{:>13} raw {:?} -> {:?}", feature.name(), slice, weights);
        profiles.push(FeatureWeights { feature, weights });
    }

    Ok(WeightProfiles::new(profiles))
}
