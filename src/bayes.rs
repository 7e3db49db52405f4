use tracing::{debug, info};

use crate::classifier::{
    check_delta, label_priors, lidstone, Classifier, Prediction, DEFAULT_DELTA,
};
use crate::dataset::{Codebook, Dataset, Instance, Schema};
use crate::error::{BayesError, Result};

/// Categorical Naive Bayes with Lidstone smoothing.
///
/// Training only stores raw counts; conditional probabilities are computed
/// on demand from the count and the cached per-(label, attribute) total.
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    delta: f64,
    model: Option<NaiveBayesModel>,
}

#[derive(Debug, Clone, PartialEq)]
struct NaiveBayesModel {
    schema: Schema,
    codebook: Codebook,
    priors: Vec<f64>,
    /// counts[label][attribute][value]
    counts: Vec<Vec<Vec<f64>>>,
    /// totals[label][attribute], the sum over the attribute's domain
    totals: Vec<Vec<f64>>,
}

impl NaiveBayesModel {
    fn likelihood(&self, label: usize, attribute: usize, value: usize, delta: f64) -> f64 {
        let counts = &self.counts[label][attribute];
        lidstone(
            counts[value],
            self.totals[label][attribute],
            counts.len(),
            delta,
        )
    }
}

impl Default for NaiveBayesClassifier {
    fn default() -> Self {
        Self {
            delta: DEFAULT_DELTA,
            model: None,
        }
    }
}

impl NaiveBayesClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Lidstone constant; it must be positive and finite.
    pub fn with_delta(mut self, delta: f64) -> Result<Self> {
        self.delta = check_delta(delta)?;
        Ok(self)
    }

    /// Smoothed `P(Y = label)`.
    pub fn prior(&self, label: &str) -> Result<f64> {
        let model = self.model.as_ref().ok_or(BayesError::NotTrained)?;
        Ok(model.priors[model.codebook.label(label)?])
    }

    /// Smoothed `P(X_attribute = value | Y = label)`.
    pub fn likelihood(&self, label: &str, attribute: usize, value: &str) -> Result<f64> {
        let model = self.model.as_ref().ok_or(BayesError::NotTrained)?;
        let l = model.codebook.label(label)?;
        let v = model.codebook.resolve(attribute, value)?;
        Ok(model.likelihood(l, attribute, v, self.delta))
    }
}

impl Classifier for NaiveBayesClassifier {
    fn train(&mut self, dataset: &Dataset) -> Result<()> {
        let codebook = dataset.codebook().clone();
        let cardinalities = codebook.cardinalities();
        let num_labels = dataset.labels().len();

        // Count labels and (label, attribute, value) co-occurrences:
        let mut label_counts = vec![0.0; num_labels];
        let per_label: Vec<Vec<f64>> = cardinalities.iter().map(|&c| vec![0.0; c]).collect();
        let mut counts = vec![per_label; num_labels];
        for instance in dataset.instances() {
            let label = codebook.label(instance.label())?;
            label_counts[label] += 1.0;
            for (attribute, value) in codebook.encode(instance)?.into_iter().enumerate() {
                counts[label][attribute][value] += 1.0;
            }
        }

        // Cache the denominators:
        let totals: Vec<Vec<f64>> = counts
            .iter()
            .map(|attributes| {
                attributes
                    .iter()
                    .map(|values| values.iter().sum::<f64>())
                    .collect()
            })
            .collect();

        let priors = label_priors(&label_counts, self.delta);
        debug!(?label_counts, ?priors, "label priors");

        self.model = Some(NaiveBayesModel {
            schema: dataset.schema().clone(),
            codebook,
            priors,
            counts,
            totals,
        });

        info!(
            instances = dataset.len(),
            labels = num_labels,
            attributes = cardinalities.len(),
            "trained naive Bayes"
        );
        Ok(())
    }

    fn schema(&self) -> Option<&Schema> {
        self.model.as_ref().map(|model| &model.schema)
    }

    fn predict(&self, instance: &Instance) -> Result<Prediction> {
        let model = self.model.as_ref().ok_or(BayesError::NotTrained)?;
        let values = model.codebook.encode(instance)?;

        let joint = model
            .priors
            .iter()
            .enumerate()
            .map(|(label, &prior)| {
                values.iter().enumerate().fold(prior, |acc, (attribute, &value)| {
                    acc * model.likelihood(label, attribute, value, self.delta)
                })
            })
            .collect();

        Ok(Prediction::from_joint(
            model.schema.labels(),
            instance.label(),
            joint,
        ))
    }
}
