//! # Questionnaire Risk Scoring
//!
//! Applies fitted weight profiles to a single respondent. Each answer selects
//! one category level of one indicator; the selected weights are summed with a
//! bias and squashed through the logistic function into a risk probability.

use crate::indicators::Indicator;
use crate::weights::WeightProfiles;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Offset added to every questionnaire's weight sum.
pub const DEFAULT_BIAS: f64 = -0.2;
/// Probabilities at or below this are low risk.
pub const LOW_RISK_CEILING: f64 = 0.3;
/// Probabilities at or below this (and above the low ceiling) are moderate risk.
pub const MODERATE_RISK_CEILING: f64 = 0.7;

const BASELINE_RECOMMENDATIONS: [&str; 4] = [
    "Keep a structured daily routine",
    "Exercise regularly",
    "Maintain a balanced diet",
    "Keep regular sleep hours",
];

const MODERATE_RECOMMENDATIONS: [&str; 4] = [
    "Consider joining a support group",
    "Practice stress-management techniques",
    "Keep a mood journal",
    "Set small, achievable goals",
];

const HIGH_RISK_RECOMMENDATIONS: [&str; 4] = [
    "Seek professional help promptly",
    "Contact a therapist or psychologist",
    "Let close family or friends know about your situation",
    "Consider a psychiatric evaluation",
];

#[derive(Error, Debug, PartialEq)]
pub enum ScoreError {
    #[error("No weight profile exists for feature '{0}'.")]
    UnknownFeature(String),
    #[error(
        "Answer {index} for feature '{feature}' is out of range; the profile has {categories} categories."
    )]
    CategoryOutOfRange {
        feature: String,
        index: usize,
        categories: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        if probability <= LOW_RISK_CEILING {
            RiskLevel::Low
        } else if probability <= MODERATE_RISK_CEILING {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }

    /// Advice for this level. Higher levels include the advice of every lower one.
    pub fn recommendations(self) -> Vec<&'static str> {
        let mut advice = BASELINE_RECOMMENDATIONS.to_vec();
        if self >= RiskLevel::Moderate {
            advice.extend(MODERATE_RECOMMENDATIONS);
        }
        if self == RiskLevel::High {
            advice.extend(HIGH_RISK_RECOMMENDATIONS);
        }
        advice
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub probability: f64,
    pub level: RiskLevel,
}

#[derive(Debug, Clone)]
pub struct RiskScorer {
    profiles: WeightProfiles,
    bias: f64,
}

impl RiskScorer {
    pub fn new(profiles: WeightProfiles) -> Self {
        Self::with_bias(profiles, DEFAULT_BIAS)
    }

    pub fn with_bias(profiles: WeightProfiles, bias: f64) -> Self {
        Self { profiles, bias }
    }

    /// Logistic probability of the answers. A feature answered more than once
    /// counts only with its last answer; unanswered features contribute nothing.
    pub fn score(&self, answers: &[(Indicator, usize)]) -> Result<f64, ScoreError> {
        let latest: BTreeMap<Indicator, usize> = answers.iter().copied().collect();

        let mut sum = self.bias;
        for (feature, index) in latest {
            let profile = self
                .profiles
                .get(feature)
                .ok_or_else(|| ScoreError::UnknownFeature(feature.name().to_string()))?;
            let weight =
                profile
                    .weights
                    .get(index)
                    .ok_or_else(|| ScoreError::CategoryOutOfRange {
                        feature: feature.name().to_string(),
                        index,
                        categories: profile.weights.len(),
                    })?;
            sum += weight;
        }

        let probability = 1.0 / (1.0 + (-sum).exp());
        Ok(probability.clamp(0.0, 1.0))
    }

    pub fn assess(&self, answers: &[(Indicator, usize)]) -> Result<RiskAssessment, ScoreError> {
        let probability = self.score(answers)?;
        Ok(RiskAssessment {
            probability,
            level: RiskLevel::from_probability(probability),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::FeatureWeights;
    use approx::assert_abs_diff_eq;

    fn scorer() -> RiskScorer {
        RiskScorer::new(WeightProfiles::new(vec![
            FeatureWeights {
                feature: Indicator::Mood,
                weights: vec![-0.4, -0.1, 0.2, 0.5],
            },
            FeatureWeights {
                feature: Indicator::Anxiety,
                weights: vec![-0.4, 0.0, 0.3, 0.5],
            },
        ]))
    }

    fn logistic(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    #[test]
    fn test_empty_questionnaire_scores_the_bias() {
        let p = scorer().score(&[]).unwrap();
        assert_abs_diff_eq!(p, logistic(-0.2), epsilon = 1e-12);
    }

    #[test]
    fn test_score_sums_selected_weights() {
        let p = scorer()
            .score(&[(Indicator::Mood, 3), (Indicator::Anxiety, 2)])
            .unwrap();
        assert_abs_diff_eq!(p, logistic(-0.2 + 0.5 + 0.3), epsilon = 1e-12);
    }

    #[test]
    fn test_repeated_answer_keeps_the_last() {
        let p = scorer()
            .score(&[(Indicator::Mood, 0), (Indicator::Mood, 3)])
            .unwrap();
        assert_abs_diff_eq!(p, logistic(-0.2 + 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_feature_and_bad_index_are_errors() {
        assert_eq!(
            scorer().score(&[(Indicator::Income, 0)]).unwrap_err(),
            ScoreError::UnknownFeature("income".to_string())
        );
        assert_eq!(
            scorer().score(&[(Indicator::Mood, 4)]).unwrap_err(),
            ScoreError::CategoryOutOfRange {
                feature: "mood".to_string(),
                index: 4,
                categories: 4
            }
        );
    }

    #[test]
    fn test_risk_level_boundaries_are_inclusive() {
        assert_eq!(RiskLevel::from_probability(0.3), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.31), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.7), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.71), RiskLevel::High);
    }

    #[test]
    fn test_recommendations_are_cumulative() {
        let low = RiskLevel::Low.recommendations();
        let moderate = RiskLevel::Moderate.recommendations();
        let high = RiskLevel::High.recommendations();
        assert_eq!(low.len(), 4);
        assert_eq!(moderate.len(), 8);
        assert_eq!(high.len(), 12);
        assert_eq!(&moderate[..4], &low[..]);
        assert_eq!(&high[..8], &moderate[..]);
    }

    #[test]
    fn test_assess_attaches_level() {
        let scorer = RiskScorer::with_bias(scorer().profiles, 3.0);
        let assessment = scorer.assess(&[(Indicator::Mood, 3)]).unwrap();
        assert_eq!(assessment.level, RiskLevel::High);
    }
}
