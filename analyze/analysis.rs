//! End-to-end analysis: labels, category layout, split, fitted pipeline,
//! held-out evaluation and weight profiles.

use crate::config::{AnalysisConfig, ConfigError};
use crate::data::{DataError, SurveyData};
use crate::encode::OneHotEncoder;
use crate::indicators::Indicator;
use crate::label::{LabelError, RiskLabels, risk_labels};
use crate::metrics::{Evaluation, MetricsError, evaluate};
use crate::pipeline::{Classifier, PipelineError, RiskPipeline, Transform};
use crate::split::{SplitError, SplitIndices, train_test_split};
use crate::svm::LinearSvm;
use crate::weights::{WeightError, WeightProfiles, extract_weight_profiles};
use ndarray::Array1;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Data loading failed: {0}")]
    Data(#[from] DataError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Label construction failed: {0}")]
    Label(#[from] LabelError),
    #[error("Train/test split failed: {0}")]
    Split(#[from] SplitError),
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
    #[error("Evaluation failed: {0}")]
    Metrics(#[from] MetricsError),
    #[error("Weight extraction failed: {0}")]
    Weights(#[from] WeightError),
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub labels: RiskLabels,
    pub split: SplitIndices,
    pub evaluation: Evaluation,
    /// Raw classifier coefficients in encoding column order.
    pub coefficients: Array1<f64>,
    pub profiles: WeightProfiles,
}

/// Runs the analysis with the linear SVM configured in `config`.
pub fn run_analysis(
    data: &SurveyData,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome, AnalysisError> {
    run_analysis_with(data, config, LinearSvm::new(config.svm))
}

/// Runs the analysis with any classifier.
///
/// The category layout (and its `K` check) comes from the full indicator
/// table; the scaler and the classifier see the training rows only.
pub fn run_analysis_with<C: Classifier>(
    data: &SurveyData,
    config: &AnalysisConfig,
    classifier: C,
) -> Result<AnalysisOutcome, AnalysisError> {
    config.validate()?;
    let x = data.indicators.view();

    let labels = risk_labels(x, &config.domain_weights)?;

    let mut encoder = OneHotEncoder::new(Indicator::ALL.to_vec(), config.categories_per_feature);
    encoder.fit(x)?;

    let split = train_test_split(
        x,
        labels.labels.view(),
        config.test_fraction,
        config.random_seed,
    )?;

    let mut pipeline = RiskPipeline::new(encoder, classifier)?;
    pipeline.fit(split.train.records.view(), split.train.labels.view())?;

    let predicted = pipeline.predict(split.test.records.view())?;
    let evaluation = evaluate(split.test.labels.view(), predicted.view())?;
    log::info!(
        "Held-out accuracy {:.4} on {} rows.",
        evaluation.report.accuracy,
        split.test.len()
    );

    let coefficients = pipeline.coefficients()?;
    let profiles = extract_weight_profiles(
        coefficients.view(),
        &Indicator::ALL,
        config.categories_per_feature,
        config.affine_range,
    )?;

    Ok(AnalysisOutcome {
        labels,
        split: split.indices(),
        evaluation,
        coefficients,
        profiles,
    })
}
