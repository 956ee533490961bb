//! Held-out evaluation of the binary risk classifier: `linfa`'s confusion
//! matrix and a per-class precision / recall / F1 report derived from it. A
//! ratio whose denominator is zero is reported as 0.

use linfa::metrics::{ConfusionMatrix, ToConfusionMatrix};
use ndarray::ArrayView1;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("{truth} true labels but {predicted} predictions.")]
    LengthMismatch { truth: usize, predicted: usize },
    #[error("Labels must be 0 or 1, found {0}.")]
    InvalidLabel(u8),
    #[error("Cannot evaluate an empty set of predictions.")]
    Empty,
    #[error("The held-out labels contain only class {0}; per-class metrics need both classes.")]
    SingleClass(u8),
    #[error("Confusion matrix could not be built: {0}")]
    Confusion(#[from] linfa::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// linfa yields NaN for 0/0.
fn zero_if_undefined(value: f32) -> f64 {
    if value.is_finite() { f64::from(value) } else { 0.0 }
}

fn class_metrics(one_vs_rest: &ConfusionMatrix<bool>, support: usize) -> ClassMetrics {
    ClassMetrics {
        precision: zero_if_undefined(one_vs_rest.precision()),
        recall: zero_if_undefined(one_vs_rest.recall()),
        f1: zero_if_undefined(one_vs_rest.f1_score()),
        support,
    }
}

fn weighted_average(classes: &[ClassMetrics; 2], weights: [f64; 2], support: usize) -> ClassMetrics {
    let norm: f64 = weights.iter().sum();
    let combine = |value: fn(&ClassMetrics) -> f64| {
        if norm == 0.0 {
            return 0.0;
        }
        classes
            .iter()
            .zip(weights)
            .map(|(c, w)| w * value(c))
            .sum::<f64>()
            / norm
    };
    ClassMetrics {
        precision: combine(|c| c.precision),
        recall: combine(|c| c.recall),
        f1: combine(|c| c.f1),
        support,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Metrics of class 0 and class 1.
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    fn from_confusion(confusion: &ConfusionMatrix<usize>, supports: [usize; 2]) -> Self {
        // Members are sorted, so the one-vs-rest matrices come as class 0, class 1.
        let one_vs_rest = confusion.split_one_vs_all();
        let classes =
            [0usize, 1].map(|class| class_metrics(&one_vs_rest[class], supports[class]));
        let total = supports.iter().sum();
        let weights = supports.map(|s| s as f64);
        Self {
            classes,
            accuracy: zero_if_undefined(confusion.accuracy()),
            macro_avg: weighted_average(&classes, [1.0, 1.0], total),
            weighted_avg: weighted_average(&classes, weights, total),
        }
    }
}

/// The confusion matrix of a held-out evaluation and the report derived from it.
#[derive(Debug)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix<usize>,
    pub report: ClassificationReport,
}

/// Compares held-out labels with predictions. Both classes must occur among
/// the true labels.
pub fn evaluate(
    truth: ArrayView1<u8>,
    predicted: ArrayView1<u8>,
) -> Result<Evaluation, MetricsError> {
    if truth.len() != predicted.len() {
        return Err(MetricsError::LengthMismatch {
            truth: truth.len(),
            predicted: predicted.len(),
        });
    }
    if truth.is_empty() {
        return Err(MetricsError::Empty);
    }
    if let Some(&bad) = truth.iter().chain(predicted.iter()).find(|&&label| label > 1) {
        return Err(MetricsError::InvalidLabel(bad));
    }
    let supports = [0u8, 1].map(|class| truth.iter().filter(|&&label| label == class).count());
    if let Some(only) = [0u8, 1]
        .into_iter()
        .find(|&class| supports[usize::from(class)] == truth.len())
    {
        return Err(MetricsError::SingleClass(only));
    }

    let truth = truth.mapv(usize::from);
    let predicted = predicted.mapv(usize::from);
    let confusion = predicted.confusion_matrix(truth.view())?;
    let report = ClassificationReport::from_confusion(&confusion, supports);
    Ok(Evaluation { confusion, report })
}

fn write_metrics_line(f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, m.precision, m.recall, m.f1, m.support
    )
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (class, metrics) in self.classes.iter().enumerate() {
            write_metrics_line(f, &class.to_string(), metrics)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_metrics_line(f, "macro avg", &self.macro_avg)?;
        write_metrics_line(f, "weighted avg", &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    fn report(truth: &[u8], predicted: &[u8]) -> ClassificationReport {
        evaluate(
            Array1::from(truth.to_vec()).view(),
            Array1::from(predicted.to_vec()).view(),
        )
        .unwrap()
        .report
    }

    #[test]
    fn test_report_values() {
        // tn=3 fp=1 fn=2 tp=4
        let report = report(&[0, 0, 0, 0, 1, 1, 1, 1, 1, 1], &[0, 0, 0, 1, 0, 0, 1, 1, 1, 1]);

        let negative = report.classes[0];
        assert_abs_diff_eq!(negative.precision, 3.0 / 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(negative.recall, 3.0 / 4.0, epsilon = 1e-6);
        assert_eq!(negative.support, 4);

        let positive = report.classes[1];
        assert_abs_diff_eq!(positive.precision, 4.0 / 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(positive.recall, 4.0 / 6.0, epsilon = 1e-6);
        let f1 = 2.0 * 0.8 * (4.0 / 6.0) / (0.8 + 4.0 / 6.0);
        assert_abs_diff_eq!(positive.f1, f1, epsilon = 1e-6);
        assert_eq!(positive.support, 6);

        assert_abs_diff_eq!(report.accuracy, 0.7, epsilon = 1e-6);
        assert_abs_diff_eq!(
            report.macro_avg.recall,
            (0.75 + 4.0 / 6.0) / 2.0,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            report.weighted_avg.precision,
            (4.0 * 0.6 + 6.0 * 0.8) / 10.0,
            epsilon = 1e-6
        );
        assert_eq!(report.weighted_avg.support, 10);
    }

    #[test]
    fn test_class_never_predicted_reports_zero() {
        let report = report(&[0, 0, 1, 1], &[0, 0, 0, 0]);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].recall, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
        assert_abs_diff_eq!(report.classes[0].precision, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(report.classes[0].recall, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(report.accuracy, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            evaluate(array![0u8, 1].view(), array![0u8].view()),
            Err(MetricsError::LengthMismatch {
                truth: 2,
                predicted: 1
            })
        ));
        assert!(matches!(
            evaluate(Array1::<u8>::zeros(0).view(), Array1::<u8>::zeros(0).view()),
            Err(MetricsError::Empty)
        ));
        assert!(matches!(
            evaluate(array![0u8, 3].view(), array![0u8, 1].view()),
            Err(MetricsError::InvalidLabel(3))
        ));
        assert!(matches!(
            evaluate(array![1u8, 1, 1].view(), array![1u8, 0, 1].view()),
            Err(MetricsError::SingleClass(1))
        ));
    }

    #[test]
    fn test_display_contains_every_row() {
        let text = report(&[0, 1, 1, 0], &[0, 1, 0, 0]).to_string();
        for needle in ["precision", "accuracy", "macro avg", "weighted avg"] {
            assert!(text.contains(needle), "missing {needle} in\n{text}");
        }
    }
}
