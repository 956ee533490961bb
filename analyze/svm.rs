//! # Linear Support Vector Machine
//!
//! A two-class C-SVM with a linear kernel, solved by `linfa-svm`'s SMO solver.
//! Class 1 is mapped to the `true` target, so a positive decision value means
//! class 1. For a linear kernel the decision function is `w . x - rho`, and
//! the coefficient vector `w` is read back as the model's response to each
//! unit vector. The solver is deterministic: the same data always gives the
//! same coefficients.

use crate::config::SvmConfig;
use crate::pipeline::Classifier;
use linfa::Dataset;
use linfa::traits::Fit;
use linfa_svm::Svm;
use ndarray::{Array1, ArrayView1, ArrayView2};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ClassifierError {
    #[error("The classifier has not been fitted yet.")]
    NotFitted,
    #[error("Training labels contain only class {0}; a two-class classifier needs both 0 and 1.")]
    SingleClass(u8),
    #[error("Training labels must be 0 or 1, found {0}.")]
    InvalidLabel(u8),
    #[error("Cannot fit on an empty training set.")]
    EmptyTrainingSet,
    #[error("Design matrix has {rows} rows but {labels} labels were given.")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("Model was fitted on {expected} features, but {found} were given.")]
    FeatureCountMismatch { expected: usize, found: usize },
    #[error("SVM solver failed: {0}")]
    Solver(String),
    #[error("Training produced non-finite coefficients; check the inputs for extreme values.")]
    Diverged,
}

#[derive(Debug, Clone)]
struct FittedSvm {
    coefficients: Array1<f64>,
    intercept: f64,
}

/// Linear two-class SVM. Class 1 is the positive class.
#[derive(Debug, Clone)]
pub struct LinearSvm {
    config: SvmConfig,
    fitted: Option<FittedSvm>,
}

impl LinearSvm {
    pub fn new(config: SvmConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn intercept(&self) -> Result<f64, ClassifierError> {
        self.fitted
            .as_ref()
            .map(|f| f.intercept)
            .ok_or(ClassifierError::NotFitted)
    }

    fn validate_labels(y: ArrayView1<u8>) -> Result<(), ClassifierError> {
        if let Some(&bad) = y.iter().find(|&&label| label > 1) {
            return Err(ClassifierError::InvalidLabel(bad));
        }
        let positives = y.iter().filter(|&&label| label == 1).count();
        if positives == 0 {
            return Err(ClassifierError::SingleClass(0));
        }
        if positives == y.len() {
            return Err(ClassifierError::SingleClass(1));
        }
        Ok(())
    }
}

impl Classifier for LinearSvm {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<(), ClassifierError> {
        let (n, d) = x.dim();
        if n == 0 {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        if y.len() != n {
            return Err(ClassifierError::LengthMismatch {
                rows: n,
                labels: y.len(),
            });
        }
        Self::validate_labels(y)?;

        let dataset = Dataset::new(x.to_owned(), y.mapv(|label| label == 1));
        let model = Svm::<f64, bool>::params()
            .pos_neg_weights(self.config.c, self.config.c)
            .eps(self.config.eps)
            .linear_kernel()
            .fit(&dataset)
            .map_err(|e| ClassifierError::Solver(e.to_string()))?;

        let mut unit = Array1::<f64>::zeros(d);
        let mut coefficients = Array1::<f64>::zeros(d);
        for (j, w) in coefficients.iter_mut().enumerate() {
            unit[j] = 1.0;
            *w = model.weighted_sum(&unit);
            unit[j] = 0.0;
        }
        let intercept = -model.rho;
        if coefficients.iter().any(|v| !v.is_finite()) || !intercept.is_finite() {
            return Err(ClassifierError::Diverged);
        }

        log::info!("Linear SVM fitted: {d} coefficients, intercept {intercept:.6}.");
        self.fitted = Some(FittedSvm {
            coefficients,
            intercept,
        });
        Ok(())
    }

    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ClassifierError> {
        let fitted = self.fitted.as_ref().ok_or(ClassifierError::NotFitted)?;
        if x.ncols() != fitted.coefficients.len() {
            return Err(ClassifierError::FeatureCountMismatch {
                expected: fitted.coefficients.len(),
                found: x.ncols(),
            });
        }
        Ok(x.dot(&fitted.coefficients) + fitted.intercept)
    }

    fn coefficients(&self) -> Result<ArrayView1<'_, f64>, ClassifierError> {
        self.fitted
            .as_ref()
            .map(|f| f.coefficients.view())
            .ok_or(ClassifierError::NotFitted)
    }
}
