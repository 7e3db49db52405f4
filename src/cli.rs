//! Command-line arguments and the train/classify driver.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::arff;
use crate::bayes::NaiveBayesClassifier;
use crate::classifier::{check_delta, Classifier, DEFAULT_DELTA};
use crate::tan::TanClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Naive Bayes
    #[value(name = "n", alias = "naive-bayes")]
    NaiveBayes,
    /// Tree-Augmented Naive Bayes
    #[value(name = "t", alias = "tan")]
    Tan,
}

#[derive(Debug, Parser)]
#[command(name = "bayes")]
#[command(version)]
#[command(about = "Naive Bayes and TAN classification of categorical ARFF data")]
pub struct Args {
    /// Training ARFF file
    pub train: PathBuf,

    /// Test ARFF file
    pub test: PathBuf,

    /// Classifier to use
    #[arg(value_enum)]
    pub mode: Mode,

    /// Lidstone smoothing constant
    #[arg(long, env = "BAYES_DELTA", default_value_t = DEFAULT_DELTA, value_parser = parse_delta)]
    pub delta: f64,

    /// Print a summary of both datasets before training
    #[arg(long)]
    pub describe: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

fn parse_delta(text: &str) -> std::result::Result<f64, String> {
    let delta: f64 = text.parse().map_err(|e| format!("{e}"))?;
    check_delta(delta).map_err(|e| e.to_string())
}

/// Loads both datasets, checks they agree, trains the selected engine and
/// writes the report to `out`.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    let train = arff::read_path(&args.train)
        .with_context(|| format!("failed to load training data from {}", args.train.display()))?;
    let test = arff::read_path(&args.test)
        .with_context(|| format!("failed to load test data from {}", args.test.display()))?;

    if args.describe {
        writeln!(out, "{train}\n")?;
        writeln!(out, "{test}\n")?;
    }

    train
        .ensure_compatible(&test)
        .context("training and test data do not share the same metadata")?;

    let evaluation = match args.mode {
        Mode::NaiveBayes => {
            let mut classifier = NaiveBayesClassifier::new().with_delta(args.delta)?;
            classifier.train(&train)?;
            classifier.classify(&test)?
        }
        Mode::Tan => {
            let mut classifier = TanClassifier::new().with_delta(args.delta)?;
            classifier.train(&train)?;
            writeln!(out, "{}", classifier.learned_tree()?)?;
            classifier.classify(&test)?
        }
    };

    writeln!(out, "{evaluation}")?;
    info!(
        correct = evaluation.correct(),
        total = evaluation.total(),
        accuracy = evaluation.accuracy(),
        "classification finished"
    );
    Ok(())
}
