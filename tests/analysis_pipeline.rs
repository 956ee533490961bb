use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use deprisk::analysis::{AnalysisError, run_analysis};
use deprisk::config::AnalysisConfig;
use deprisk::data::{DataError, load_survey_data};
use deprisk::indicators::{Domain, Indicator};
use deprisk::label::LabelError;
use deprisk::report::{read_weight_table, write_weight_table};
use deprisk::risk::{RiskLevel, RiskScorer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

/// Writes a survey CSV with a leading id column and `rows` random answers.
fn write_survey(path: &Path, rows: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut csv = String::from("id");
    for indicator in Indicator::ALL {
        csv.push(',');
        csv.push_str(indicator.name());
    }
    csv.push('\n');
    for row in 0..rows {
        write!(csv, "{row}").expect("write id");
        for column in 0..Indicator::ALL.len() {
            // The first four rows cover every category level of every column.
            let value = if row < 4 {
                (row + column) % 4
            } else {
                rng.gen_range(0..4)
            };
            write!(csv, ",{value}").expect("write value");
        }
        csv.push('\n');
    }
    fs::write(path, csv).expect("write survey");
}

#[test]
fn analysis_from_csv_writes_readable_weight_table() {
    let tmp = tempdir().expect("temporary directory");
    let survey_path = tmp.path().join("survey.csv");
    write_survey(&survey_path, 250, 17);

    let data = load_survey_data(&survey_path).expect("load survey");
    assert_eq!(data.n_observations(), 250);
    assert_eq!(data.missing_cells(), 0);

    let outcome = run_analysis(&data, &AnalysisConfig::default()).expect("analysis");
    assert_eq!(outcome.split.test.len(), 50);
    assert_eq!(outcome.split.train.len(), 200);
    assert_eq!(outcome.profiles.len(), Indicator::ALL.len());
    for profile in &outcome.profiles {
        let sum: f64 = profile.weights.iter().sum();
        assert!(sum.abs() < 1e-9, "{} sums to {sum}", profile.feature);
    }

    let table = tmp.path().join("svm_weights_results.csv");
    write_weight_table(&table, &outcome.profiles).expect("write weights");
    let read_back = read_weight_table(&table, 4).expect("read weights");
    assert_eq!(read_back, outcome.profiles);

    let scorer = RiskScorer::new(read_back);
    let answers: Vec<(Indicator, usize)> =
        Indicator::ALL.iter().map(|&feature| (feature, 0)).collect();
    let assessment = scorer.assess(&answers).expect("assess");
    assert!((0.0..=1.0).contains(&assessment.probability));
    assert_eq!(
        assessment.level,
        RiskLevel::from_probability(assessment.probability)
    );
}

#[test]
fn psychological_profiles_rise_with_severity() {
    let tmp = tempdir().expect("temporary directory");
    let survey_path = tmp.path().join("survey.csv");
    write_survey(&survey_path, 400, 5);

    let data = load_survey_data(&survey_path).expect("load survey");
    let outcome = run_analysis(&data, &AnalysisConfig::default()).expect("analysis");

    // Higher answers raise the composite score, and the psychological domain
    // weighs most, so its top level must outweigh its bottom level.
    for feature in Domain::Psychological.indicators() {
        let profile = outcome.profiles.get(feature).expect("profile");
        assert!(
            profile.weights[3] > profile.weights[0],
            "{feature}: {:?}",
            profile.weights
        );
    }
}

#[test]
fn missing_value_is_reported_not_imputed() {
    let tmp = tempdir().expect("temporary directory");
    let survey_path = tmp.path().join("survey.csv");
    write_survey(&survey_path, 30, 9);

    // Blank out the mood answer of the row with id 7.
    let text = fs::read_to_string(&survey_path).expect("read survey");
    let mood_column = 1 + Indicator::Mood.index();
    let patched: Vec<String> = text
        .lines()
        .map(|line| {
            if line.starts_with("7,") {
                let mut cells: Vec<&str> = line.split(',').collect();
                cells[mood_column] = "";
                cells.join(",")
            } else {
                line.to_string()
            }
        })
        .collect();
    fs::write(&survey_path, patched.join("\n") + "\n").expect("write survey");

    let data = load_survey_data(&survey_path).expect("load survey");
    assert_eq!(data.missing_cells(), 1);
    match run_analysis(&data, &AnalysisConfig::default()) {
        Err(AnalysisError::Label(LabelError::UndefinedScore { row })) => assert_eq!(row, 7),
        other => panic!("expected an undefined score, got {other:?}"),
    }
}

#[test]
fn missing_indicator_column_is_rejected() {
    let tmp = tempdir().expect("temporary directory");
    let survey_path = tmp.path().join("survey.csv");
    write_survey(&survey_path, 20, 1);

    let text = fs::read_to_string(&survey_path).expect("read survey");
    fs::write(&survey_path, text.replacen("isolation", "lonely", 1)).expect("write survey");

    match load_survey_data(&survey_path) {
        Err(DataError::ColumnNotFound(column)) => assert_eq!(column, "isolation"),
        other => panic!("expected a missing column, got {other:?}"),
    }
}
