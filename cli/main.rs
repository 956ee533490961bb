#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use deprisk::analysis::run_analysis;
use deprisk::config::{AnalysisConfig, CATEGORIES_PER_FEATURE};
use deprisk::data::load_survey_data;
use deprisk::indicators::Indicator;
use deprisk::report::{
    format_importance_ranking, format_weight_matrix, read_weight_table, write_weight_table,
};
use deprisk::risk::{DEFAULT_BIAS, RiskScorer};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the survey CSV with one column per indicator
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Where to write the per-feature weight table
    #[arg(long, default_value = "svm_weights_results.csv")]
    pub output: PathBuf,

    /// Optional TOML file overriding the analysis parameters
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ScoreArgs {
    /// Weight table written by `deprisk analyze`
    #[arg(long, value_name = "PATH")]
    pub weights: PathBuf,

    /// One answer as FEATURE=INDEX, e.g. mood=2; repeat for every question
    #[arg(long = "answer", value_name = "FEATURE=INDEX", value_parser = parse_answer)]
    pub answers: Vec<(Indicator, usize)>,

    /// Offset added to the summed weights before the logistic function
    #[arg(long, default_value_t = DEFAULT_BIAS, allow_hyphen_values = true)]
    pub bias: f64,
}

fn parse_answer(raw: &str) -> Result<(Indicator, usize), String> {
    let (feature, index) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FEATURE=INDEX, got '{raw}'"))?;
    let feature: Indicator = feature.trim().parse().map_err(|e| format!("{e}"))?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|e| format!("invalid category index '{index}': {e}"))?;
    Ok((feature, index))
}

pub fn analyze(args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => {
            println!("Loading configuration from: {}", path.display());
            AnalysisConfig::load(path)?
        }
        None => AnalysisConfig::default(),
    };

    let data = load_survey_data(&args.data)?;
    println!("Loaded {} observations", data.n_observations());

    let outcome = run_analysis(&data, &config)?;
    println!(
        "Risk labels: {} of {} above population mean {:.4}",
        outcome.labels.positive_count(),
        outcome.labels.labels.len(),
        outcome.labels.population_mean
    );

    println!("\nClassification report:\n{}", outcome.evaluation.report);
    println!("Confusion matrix:{:?}", outcome.evaluation.confusion);
    println!("Weight matrix per feature:");
    print!("{}", format_weight_matrix(&outcome.profiles));
    println!("\nFeature importance (max |weight|):");
    print!("{}", format_importance_ranking(&outcome.profiles));

    write_weight_table(&args.output, &outcome.profiles)?;
    println!("\nWeights saved to {}", args.output.display());
    Ok(())
}

pub fn score(args: ScoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let profiles = read_weight_table(&args.weights, CATEGORIES_PER_FEATURE)?;
    let scorer = RiskScorer::with_bias(profiles, args.bias);
    let assessment = scorer.assess(&args.answers)?;

    println!("Risk probability: {:.3}", assessment.probability);
    println!("Risk level: {}", assessment.level);
    println!("Recommendations:");
    for advice in assessment.level.recommendations() {
        println!("  - {advice}");
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "deprisk",
    about = "Depression-risk labelling, linear SVM fitting and weight-profile extraction",
    long_about = "Derives binary depression-risk labels from twelve categorical survey \
                 indicators, fits a linear SVM on their one-hot encoding, and reports a \
                 normalized weight profile per indicator."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis on a survey table
    #[command(about = "Label, fit and extract weights (outputs: svm_weights_results.csv)")]
    Analyze(AnalyzeArgs),

    /// Score one questionnaire against a weight table
    #[command(about = "Score a questionnaire with a weight table")]
    Score(ScoreArgs),

    /// Display version and build information
    #[command(about = "Display version and build information")]
    Version,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let Cli { command } = cli;

    let result = match command {
        Some(Commands::Analyze(args)) => analyze(args),
        Some(Commands::Score(args)) => score(args),
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => Cli::command()
            .print_help()
            .map(|()| println!())
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Format seconds into a human-readable duration like "2.4 hours ago"
fn format_duration_ago(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    if seconds < MINUTE {
        format!("{seconds} seconds ago")
    } else if seconds < HOUR {
        format!("{:.1} minutes ago", seconds as f64 / MINUTE as f64)
    } else if seconds < DAY {
        format!("{:.1} hours ago", seconds as f64 / HOUR as f64)
    } else {
        format!("{:.1} days ago", seconds as f64 / DAY as f64)
    }
}

fn print_version_info() {
    let version = env!("CARGO_PKG_VERSION");
    let build_timestamp: u64 = env!("DEPRISK_BUILD_TIMESTAMP").parse().unwrap_or(0);

    println!("deprisk {version}");

    if build_timestamp > 0 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if now > build_timestamp {
            println!("Built: {}", format_duration_ago(now - build_timestamp));
        } else {
            println!("Built: just now");
        }
    }
}
