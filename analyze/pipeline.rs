//! The preprocessing + classifier pipeline.
//!
//! The weight extractor only needs two capabilities from the modelling side:
//! `transform(features) -> encoded matrix` and
//! `fit(features, labels) -> coefficient vector`. They are expressed as the
//! [`Transform`] and [`Classifier`] traits so the core can be exercised with
//! synthetic stand-ins, independent of the SVM implementation.

use crate::encode::{EncodeError, EncodingLayout, OneHotEncoder, StandardScaler};
use crate::svm::ClassifierError;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Feature encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("Classifier failed: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Feature matrix has {rows} rows but the label vector has {labels} entries.")]
    LengthMismatch { rows: usize, labels: usize },
}

/// A fitted-then-applied column transformation.
pub trait Transform {
    fn fit(&mut self, x: ArrayView2<f64>) -> Result<(), PipelineError>;
    fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PipelineError>;

    fn fit_transform(&mut self, x: ArrayView2<f64>) -> Result<Array2<f64>, PipelineError> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// A linear two-class classifier over an already-encoded design matrix.
pub trait Classifier {
    /// Fits on `x` with labels in {0, 1}.
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<(), ClassifierError>;

    /// Signed distance to the decision boundary; positive means class 1.
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ClassifierError>;

    /// Coefficients of the positive class, one per input column.
    fn coefficients(&self) -> Result<ArrayView1<'_, f64>, ClassifierError>;

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<u8>, ClassifierError> {
        Ok(self.decision_function(x)?.mapv(|d| u8::from(d > 0.0)))
    }
}

/// One-hot encoder, standard scaler and classifier, applied in that order.
///
/// The encoder arrives already fitted, on the full indicator table, so the
/// category layout does not depend on which rows land in the training
/// partition. [`RiskPipeline::fit`] fits only the scaler and the classifier.
#[derive(Debug, Clone)]
pub struct RiskPipeline<C: Classifier> {
    encoder: OneHotEncoder,
    scaler: StandardScaler,
    classifier: C,
}

impl<C: Classifier> RiskPipeline<C> {
    pub fn new(encoder: OneHotEncoder, classifier: C) -> Result<Self, PipelineError> {
        if encoder.layout().is_none() {
            return Err(EncodeError::NotFitted.into());
        }
        Ok(Self {
            encoder,
            scaler: StandardScaler::new(),
            classifier,
        })
    }

    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<(), PipelineError> {
        if x.nrows() != y.len() {
            return Err(PipelineError::LengthMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        let encoded = self.encoder.transform(x)?;
        let scaled = self.scaler.fit_transform(encoded.view())?;
        log::info!(
            "Fitting classifier on {} rows x {} encoded columns.",
            scaled.nrows(),
            scaled.ncols()
        );
        self.classifier.fit(scaled.view(), y)?;
        Ok(())
    }

    pub fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, PipelineError> {
        let encoded = self.encoder.transform(x)?;
        let scaled = self.scaler.transform(encoded.view())?;
        Ok(self.classifier.decision_function(scaled.view())?)
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<u8>, PipelineError> {
        let encoded = self.encoder.transform(x)?;
        let scaled = self.scaler.transform(encoded.view())?;
        Ok(self.classifier.predict(scaled.view())?)
    }

    pub fn layout(&self) -> Option<&EncodingLayout> {
        self.encoder.layout()
    }

    /// An owned copy of the classifier's coefficients, in encoding column order.
    pub fn coefficients(&self) -> Result<Array1<f64>, PipelineError> {
        Ok(self.classifier.coefficients()?.to_owned())
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}
