//! Persisting and printing weight profiles.
//!
//! The weights table is a two-column CSV: `Feature` holds the indicator name,
//! `Weights` the profile as a bracketed list, e.g. `[-0.1, 0.4, -0.5, 0.2]`.
//! Values are written with full round-trip precision.

use crate::indicators::{Indicator, UnknownIndicator};
use crate::weights::{FeatureWeights, WeightProfiles};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to access weights table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row} of the weights table names an unknown feature: {source}")]
    UnknownFeature {
        row: usize,
        #[source]
        source: UnknownIndicator,
    },
    #[error("Row {row} of the weights table has a malformed weight list '{value}'.")]
    MalformedWeights { row: usize, value: String },
    #[error("Feature '{feature}' has {found} weights, but {expected} were expected.")]
    WrongWeightCount {
        feature: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct WeightRecord {
    #[serde(rename = "Feature")]
    feature: String,
    #[serde(rename = "Weights")]
    weights: String,
}

fn format_weight_list(weights: &[f64]) -> String {
    format!("[{}]", weights.iter().join(", "))
}

fn parse_weight_list(value: &str) -> Option<Vec<f64>> {
    let inner = value.trim().strip_prefix('[')?.strip_suffix(']')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    inner.split(',').map(|v| v.trim().parse::<f64>().ok()).collect()
}

/// Writes one row per feature, in profile order.
pub fn write_weight_table(path: &Path, profiles: &WeightProfiles) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for profile in profiles {
        writer.serialize(WeightRecord {
            feature: profile.feature.name().to_string(),
            weights: format_weight_list(&profile.weights),
        })?;
    }
    writer.flush().map_err(csv::Error::from)?;
    log::info!(
        "Wrote {} weight profiles to {}",
        profiles.len(),
        path.display()
    );
    Ok(())
}

/// Reads a table written by [`write_weight_table`]. Every profile must have
/// `categories` weights.
pub fn read_weight_table(path: &Path, categories: usize) -> Result<WeightProfiles, ReportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut profiles = Vec::new();
    for (row, record) in reader.deserialize::<WeightRecord>().enumerate() {
        let record = record?;
        let feature: Indicator = record
            .feature
            .parse()
            .map_err(|source| ReportError::UnknownFeature { row, source })?;
        let weights =
            parse_weight_list(&record.weights).ok_or_else(|| ReportError::MalformedWeights {
                row,
                value: record.weights.clone(),
            })?;
        if weights.len() != categories {
            return Err(ReportError::WrongWeightCount {
                feature: feature.name().to_string(),
                expected: categories,
                found: weights.len(),
            });
        }
        profiles.push(FeatureWeights { feature, weights });
    }
    Ok(WeightProfiles::new(profiles))
}

/// One line per feature: the name padded to 12 characters, then the weights
/// rounded to two decimals.
pub fn format_weight_matrix(profiles: &WeightProfiles) -> String {
    profiles
        .into_iter()
        .map(|profile| {
            let rounded = profile.weights.iter().map(|w| format!("{w:.2}")).join(", ");
            format!("{:12} | [{}]\n", profile.feature.name(), rounded)
        })
        .join("")
}

/// Features by descending importance, one per line.
pub fn format_importance_ranking(profiles: &WeightProfiles) -> String {
    profiles
        .ranked_importance()
        .into_iter()
        .map(|(feature, importance)| format!("{:12} | {:.2}\n", feature.name(), importance))
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn profiles() -> WeightProfiles {
        WeightProfiles::new(vec![
            FeatureWeights {
                feature: Indicator::Income,
                weights: vec![-0.09642857142857139, 0.4178571428571428, -0.4821428571428572, 0.16071428571428573],
            },
            FeatureWeights {
                feature: Indicator::Sleep,
                weights: vec![0.0, 0.0, 0.0, 0.0],
            },
        ])
    }

    #[test]
    fn test_weight_table_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("svm_weights_results.csv");
        write_weight_table(&path, &profiles()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Feature,Weights\n"));
        assert!(text.contains("income,"));

        let read_back = read_weight_table(&path, 4).unwrap();
        assert_eq!(read_back, profiles());
    }

    #[test]
    fn test_read_rejects_unknown_feature_and_bad_lists() {
        let dir = tempdir().unwrap();

        let path = dir.path().join("unknown.csv");
        fs::write(&path, "Feature,Weights\nhappiness,\"[0, 0, 0, 0]\"\n").unwrap();
        assert!(matches!(
            read_weight_table(&path, 4),
            Err(ReportError::UnknownFeature { row: 0, .. })
        ));

        let path = dir.path().join("malformed.csv");
        fs::write(&path, "Feature,Weights\nmood,\"0, x\"\n").unwrap();
        assert!(matches!(
            read_weight_table(&path, 4),
            Err(ReportError::MalformedWeights { row: 0, .. })
        ));

        let path = dir.path().join("short.csv");
        fs::write(&path, "Feature,Weights\nmood,\"[0.1, -0.1]\"\n").unwrap();
        assert!(matches!(
            read_weight_table(&path, 4),
            Err(ReportError::WrongWeightCount { found: 2, .. })
        ));
    }

    #[test]
    fn test_weight_matrix_formatting() {
        let text = format_weight_matrix(&profiles());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "income       | [-0.10, 0.42, -0.48, 0.16]");
        assert_eq!(lines[1], "sleep        | [0.00, 0.00, 0.00, 0.00]");
    }

    #[test]
    fn test_importance_ranking_formatting() {
        let text = format_importance_ranking(&profiles());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["income       | 0.48", "sleep        | 0.00"]);
    }
}
