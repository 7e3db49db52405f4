//! Interface shared by the Naive Bayes and TAN engines, plus the smoothing
//! and decision helpers both of them use.

use std::fmt;

use crate::dataset::{Dataset, Instance, Schema};
use crate::error::{BayesError, Result};

/// Lidstone constant used when none is configured.
pub const DEFAULT_DELTA: f64 = 1.0;

/// Accepts a Lidstone constant only when it keeps every denominator positive.
pub fn check_delta(delta: f64) -> Result<f64> {
    if delta > 0.0 && delta.is_finite() {
        Ok(delta)
    } else {
        Err(BayesError::InvalidSmoothing(delta))
    }
}

/// Additive smoothing: `(count + delta) / (total + cardinality * delta)`.
pub fn lidstone(count: f64, total: f64, cardinality: usize, delta: f64) -> f64 {
    (count + delta) / (total + cardinality as f64 * delta)
}

/// Smoothed `P(Y = l)` for every label from raw per-label counts.
pub(crate) fn label_priors(label_counts: &[f64], delta: f64) -> Vec<f64> {
    let total: f64 = label_counts.iter().sum();
    label_counts
        .iter()
        .map(|&count| lidstone(count, total, label_counts.len(), delta))
        .collect()
}

/// Index and value of the largest entry, scanning with a strict `>` from a
/// 0.0 seed. Exact ties keep the earliest label and an all-zero (or NaN)
/// vector falls back to label 0 with probability 0.0.
pub(crate) fn argmax(posteriors: &[f64]) -> (usize, f64) {
    let mut best = (0, 0.0);
    for (l, &p) in posteriors.iter().enumerate() {
        if p > best.1 {
            best = (l, p);
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub predicted: String,
    pub actual: String,
    /// Posterior of the predicted label.
    pub posterior: f64,
    /// Posterior of every label, in label order.
    pub posteriors: Vec<f64>,
}

impl Prediction {
    /// Normalizes per-label joint probabilities and picks the winner.
    pub(crate) fn from_joint(labels: &[String], actual: &str, joint: Vec<f64>) -> Self {
        let total: f64 = joint.iter().sum();
        let posteriors: Vec<f64> = joint.iter().map(|&p| p / total).collect();
        let (winner, posterior) = argmax(&posteriors);
        Prediction {
            predicted: labels[winner].clone(),
            actual: actual.to_string(),
            posterior,
            posteriors,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.predicted == self.actual
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.predicted, self.actual, self.posterior)
    }
}

/// Per-instance predictions over a test set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    pub predictions: Vec<Prediction>,
}

impl Evaluation {
    pub fn correct(&self) -> usize {
        self.predictions.iter().filter(|p| p.is_correct()).count()
    }

    pub fn total(&self) -> usize {
        self.predictions.len()
    }

    pub fn accuracy(&self) -> f64 {
        if self.predictions.is_empty() {
            return 0.0;
        }
        self.correct() as f64 / self.total() as f64
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for prediction in &self.predictions {
            writeln!(f, "{prediction}")?;
        }
        writeln!(f)?;
        write!(f, "Accuracy= {}/{}", self.correct(), self.total())
    }
}

pub trait Classifier {
    /// Learns model state from `dataset`, replacing any previous state.
    fn train(&mut self, dataset: &Dataset) -> Result<()>;

    /// Schema of the training data, `None` before training.
    fn schema(&self) -> Option<&Schema>;

    fn predict(&self, instance: &Instance) -> Result<Prediction>;

    /// Predicts every instance of `testset` after checking that it shares
    /// the training schema.
    fn classify(&self, testset: &Dataset) -> Result<Evaluation> {
        let schema = self.schema().ok_or(BayesError::NotTrained)?;
        if let Some(diff) = schema.difference(testset.schema()) {
            return Err(BayesError::mismatch(diff));
        }
        let predictions = testset
            .instances()
            .iter()
            .map(|instance| self.predict(instance))
            .collect::<Result<Vec<_>>>()?;
        Ok(Evaluation { predictions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["yes".to_string(), "no".to_string(), "maybe".to_string()]
    }

    #[test]
    fn priors_follow_lidstone() {
        let priors = label_priors(&[1.0, 1.0], 1.0);
        assert_eq!(priors, vec![0.5, 0.5]);

        let priors = label_priors(&[3.0, 0.0, 1.0], 1.0);
        assert!((priors[0] - 4.0 / 7.0).abs() < 1e-12);
        assert!((priors[1] - 1.0 / 7.0).abs() < 1e-12);
        assert!((priors.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn delta_must_be_positive_and_finite() {
        assert_eq!(check_delta(0.5).unwrap(), 0.5);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(check_delta(bad), Err(BayesError::InvalidSmoothing(_))));
        }
    }

    #[test]
    fn argmax_prefers_earliest_on_ties() {
        assert_eq!(argmax(&[0.25, 0.375, 0.375]), (1, 0.375));
        assert_eq!(argmax(&[0.5, 0.5]), (0, 0.5));
    }

    #[test]
    fn argmax_never_selects_zero() {
        assert_eq!(argmax(&[0.0, 0.0]), (0, 0.0));
        assert_eq!(argmax(&[f64::NAN, f64::NAN]), (0, 0.0));
    }

    #[test]
    fn prediction_normalizes_joint() {
        let p = Prediction::from_joint(&labels(), "no", vec![0.1, 0.3, 0.1]);
        assert_eq!(p.predicted, "no");
        assert!((p.posterior - 0.6).abs() < 1e-12);
        assert!(p.is_correct());
    }

    #[test]
    fn evaluation_report_format() {
        let eval = Evaluation {
            predictions: vec![
                Prediction::from_joint(&labels(), "yes", vec![0.5, 0.25, 0.25]),
                Prediction::from_joint(&labels(), "yes", vec![0.25, 0.5, 0.25]),
            ],
        };
        assert_eq!(eval.correct(), 1);
        assert_eq!(eval.accuracy(), 0.5);
        assert_eq!(
            eval.to_string(),
            "yes yes 0.5\nno yes 0.5\n\nAccuracy= 1/2"
        );
    }
}
