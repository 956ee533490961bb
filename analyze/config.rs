//! Analysis parameters.
//!
//! Every numeric policy of the analysis lives here as a named constant, and
//! [`AnalysisConfig`] bundles them so a run can be reproduced from a single
//! TOML file. The domain weights and the affine display range have no
//! documented derivation; they are policy choices that need sign-off from a
//! domain expert before being changed or relied upon clinically.

use crate::indicators::Domain;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Weight of the psychological domain in the composite risk score.
pub const PSYCHOLOGICAL_WEIGHT: f64 = 0.4;
/// Weight of the behavioral domain in the composite risk score.
pub const BEHAVIORAL_WEIGHT: f64 = 0.3;
/// Weight of the social domain in the composite risk score.
pub const SOCIAL_WEIGHT: f64 = 0.2;
/// Weight of the socioeconomic domain in the composite risk score.
pub const SOCIOECONOMIC_WEIGHT: f64 = 0.1;

/// Fraction of rows held out for evaluation.
pub const TEST_FRACTION: f64 = 0.2;
/// Seed of the train/test shuffle.
pub const RANDOM_SEED: u64 = 42;
/// Number of one-hot category levels every indicator must have.
pub const CATEGORIES_PER_FEATURE: usize = 4;
/// Target interval of the per-feature affine rescaling, before centring.
pub const AFFINE_RANGE: (f64, f64) = (-0.4, 0.5);

/// Default SVM regularization parameter.
pub const DEFAULT_SVM_C: f64 = 1.0;
/// Default stopping tolerance of the SMO solver.
pub const DEFAULT_SVM_EPS: f64 = 1e-3;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Domain weights must sum to 1.0, but they sum to {0}.")]
    WeightsDoNotSumToOne(f64),
    #[error("The weight for the {domain} domain is {value}; domain weights must be non-negative.")]
    NegativeWeight { domain: Domain, value: f64 },
    #[error("The test fraction must lie strictly between 0 and 1, got {0}.")]
    InvalidTestFraction(f64),
    #[error("At least 2 categories per feature are required, got {0}.")]
    TooFewCategories(usize),
    #[error("The affine range [{lo}, {hi}] is empty or inverted.")]
    InvalidAffineRange { lo: f64, hi: f64 },
    #[error("Invalid SVM setting: {0}")]
    InvalidSvm(String),
}

/// Per-domain weights of the composite risk score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainWeights {
    pub psychological: f64,
    pub behavioral: f64,
    pub social: f64,
    pub socioeconomic: f64,
}

impl Default for DomainWeights {
    fn default() -> Self {
        Self {
            psychological: PSYCHOLOGICAL_WEIGHT,
            behavioral: BEHAVIORAL_WEIGHT,
            social: SOCIAL_WEIGHT,
            socioeconomic: SOCIOECONOMIC_WEIGHT,
        }
    }
}

impl DomainWeights {
    pub fn weight(&self, domain: Domain) -> f64 {
        match domain {
            Domain::Psychological => self.psychological,
            Domain::Behavioral => self.behavioral,
            Domain::Social => self.social,
            Domain::Socioeconomic => self.socioeconomic,
        }
    }

    pub fn total(&self) -> f64 {
        Domain::ALL.iter().map(|&domain| self.weight(domain)).sum()
    }
}

/// Hyperparameters of the linear SVM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Inverse regularization strength, as in the usual soft-margin formulation.
    pub c: f64,
    /// Stopping tolerance of the solver.
    pub eps: f64,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: DEFAULT_SVM_C,
            eps: DEFAULT_SVM_EPS,
        }
    }
}

/// The complete set of parameters for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub domain_weights: DomainWeights,
    pub test_fraction: f64,
    pub random_seed: u64,
    pub categories_per_feature: usize,
    pub affine_range: (f64, f64),
    pub svm: SvmConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            domain_weights: DomainWeights::default(),
            test_fraction: TEST_FRACTION,
            random_seed: RANDOM_SEED,
            categories_per_feature: CATEGORIES_PER_FEATURE,
            affine_range: AFFINE_RANGE,
            svm: SvmConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Loads a configuration from a TOML file. Missing keys take their defaults.
    /// The result is validated before it is returned.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path)?;
        let config: AnalysisConfig = toml::from_str(&toml_string)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for domain in Domain::ALL {
            let value = self.domain_weights.weight(domain);
            if !(value >= 0.0) {
                return Err(ConfigError::NegativeWeight { domain, value });
            }
        }
        let total = self.domain_weights.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne(total));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::InvalidTestFraction(self.test_fraction));
        }
        if self.categories_per_feature < 2 {
            return Err(ConfigError::TooFewCategories(self.categories_per_feature));
        }
        let (lo, hi) = self.affine_range;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(ConfigError::InvalidAffineRange { lo, hi });
        }
        if !(self.svm.c.is_finite() && self.svm.c > 0.0) {
            return Err(ConfigError::InvalidSvm(format!(
                "C must be positive and finite, got {}",
                self.svm.c
            )));
        }
        if !(self.svm.eps.is_finite() && self.svm.eps > 0.0) {
            return Err(ConfigError::InvalidSvm(format!(
                "the solver tolerance must be positive and finite, got {}",
                self.svm.eps
            )));
        }
        Ok(())
    }
}
