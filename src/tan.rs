//! Tree-Augmented Naive Bayes.
//!
//! Training runs strictly in sequence: sufficient statistics are counted,
//! label priors are smoothed, pairwise conditional mutual information is
//! computed, a maximum spanning tree is grown from attribute 0, and finally
//! the conditional probability tables are filled in for that tree.

use std::fmt;

use tracing::{debug, info};

use crate::classifier::{
    check_delta, label_priors, lidstone, Classifier, Prediction, DEFAULT_DELTA,
};
use crate::dataset::{Attribute, Codebook, Dataset, Instance, Schema};
use crate::error::{BayesError, Result};
use crate::tree::{SpanningTree, WeightMatrix, SELF_WEIGHT};

#[derive(Debug, Clone)]
pub struct TanClassifier {
    delta: f64,
    model: Option<TanModel>,
}

#[derive(Debug, Clone, PartialEq)]
struct TanModel {
    schema: Schema,
    codebook: Codebook,
    priors: Vec<f64>,
    weights: WeightMatrix,
    tree: SpanningTree,
    /// One table per attribute, in attribute order.
    tables: Vec<ConditionalTable>,
}

/// Per-label counts of single attribute values and of value pairs.
struct Counts {
    cardinalities: Vec<usize>,
    labels: Vec<f64>,
    /// single[attribute][label * card + value]
    single: Vec<Vec<f64>>,
    /// pairs[i * n + j][(label * card_i + value_i) * card_j + value_j], empty for i == j
    pairs: Vec<Vec<f64>>,
}

impl Counts {
    fn collect(dataset: &Dataset, codebook: &Codebook) -> Result<Self> {
        let cardinalities = codebook.cardinalities();
        let num_labels = dataset.labels().len();
        let n = cardinalities.len();

        let mut labels = vec![0.0; num_labels];
        let mut single: Vec<Vec<f64>> = cardinalities
            .iter()
            .map(|&c| vec![0.0; num_labels * c])
            .collect();
        let mut pairs = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                let len = if i == j {
                    0
                } else {
                    num_labels * cardinalities[i] * cardinalities[j]
                };
                pairs.push(vec![0.0; len]);
            }
        }

        for instance in dataset.instances() {
            let label = codebook.label(instance.label())?;
            let values = codebook.encode(instance)?;
            labels[label] += 1.0;
            for (i, &vi) in values.iter().enumerate() {
                single[i][label * cardinalities[i] + vi] += 1.0;
                for (j, &vj) in values.iter().enumerate() {
                    if i != j {
                        let at = (label * cardinalities[i] + vi) * cardinalities[j] + vj;
                        pairs[i * n + j][at] += 1.0;
                    }
                }
            }
        }

        Ok(Counts {
            cardinalities,
            labels,
            single,
            pairs,
        })
    }

    fn total(&self) -> f64 {
        self.labels.iter().sum()
    }

    fn single(&self, label: usize, attribute: usize, value: usize) -> f64 {
        self.single[attribute][label * self.cardinalities[attribute] + value]
    }

    fn pair(&self, label: usize, i: usize, vi: usize, j: usize, vj: usize) -> f64 {
        let n = self.cardinalities.len();
        let at = (label * self.cardinalities[i] + vi) * self.cardinalities[j] + vj;
        self.pairs[i * n + j][at]
    }
}

/// `I(Xi; Xj | Y)` for every ordered pair, with `SELF_WEIGHT` on the diagonal.
fn mutual_information(counts: &Counts, delta: f64) -> WeightMatrix {
    let num_labels = counts.labels.len();
    let total = counts.total();

    WeightMatrix::from_fn(counts.cardinalities.len(), |i, j| {
        if i == j {
            return SELF_WEIGHT;
        }
        let (ci, cj) = (counts.cardinalities[i], counts.cardinalities[j]);
        let mut info = 0.0;
        for vi in 0..ci {
            for vj in 0..cj {
                for label in 0..num_labels {
                    let in_label = counts.labels[label];
                    let joint = counts.pair(label, i, vi, j, vj);

                    let p_xy = lidstone(joint, total, ci * cj * num_labels, delta);
                    let p_xy_given_l = lidstone(joint, in_label, ci * cj, delta);
                    let p_x_given_l = lidstone(counts.single(label, i, vi), in_label, ci, delta);
                    let p_y_given_l = lidstone(counts.single(label, j, vj), in_label, cj, delta);

                    info += p_xy * (p_xy_given_l / (p_x_given_l * p_y_given_l)).log2();
                }
            }
        }
        info
    })
}

/// Smoothed `P(X = v | X_parent = u, Y = l)`; the root uses a single
/// parent slot `u = 0`.
#[derive(Debug, Clone, PartialEq)]
struct ConditionalTable {
    parent: Option<usize>,
    parent_cardinality: usize,
    cardinality: usize,
    probabilities: Vec<f64>,
}

impl ConditionalTable {
    fn build(attribute: usize, tree: &SpanningTree, counts: &Counts, delta: f64) -> Self {
        let num_labels = counts.labels.len();
        let cardinality = counts.cardinalities[attribute];
        let parent = tree.parent(attribute);
        let parent_cardinality = parent.map_or(1, |p| counts.cardinalities[p]);

        let mut probabilities = Vec::with_capacity(num_labels * parent_cardinality * cardinality);
        for label in 0..num_labels {
            for u in 0..parent_cardinality {
                for v in 0..cardinality {
                    let p = match parent {
                        None => lidstone(
                            counts.single(label, attribute, v),
                            counts.labels[label],
                            cardinality,
                            delta,
                        ),
                        Some(p) => lidstone(
                            counts.pair(label, attribute, v, p, u),
                            counts.single(label, p, u),
                            cardinality,
                            delta,
                        ),
                    };
                    probabilities.push(p);
                }
            }
        }

        ConditionalTable {
            parent,
            parent_cardinality,
            cardinality,
            probabilities,
        }
    }

    fn get(&self, label: usize, parent_value: usize, value: usize) -> f64 {
        self.probabilities[(label * self.parent_cardinality + parent_value) * self.cardinality + value]
    }
}

impl Default for TanClassifier {
    fn default() -> Self {
        Self {
            delta: DEFAULT_DELTA,
            model: None,
        }
    }
}

impl TanClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Lidstone constant; it must be positive and finite.
    pub fn with_delta(mut self, delta: f64) -> Result<Self> {
        self.delta = check_delta(delta)?;
        Ok(self)
    }

    fn model(&self) -> Result<&TanModel> {
        self.model.as_ref().ok_or(BayesError::NotTrained)
    }

    pub fn prior(&self, label: &str) -> Result<f64> {
        let model = self.model()?;
        Ok(model.priors[model.codebook.label(label)?])
    }

    /// Conditional mutual information between every pair of attributes.
    pub fn weights(&self) -> Result<&WeightMatrix> {
        Ok(&self.model()?.weights)
    }

    pub fn tree(&self) -> Result<&SpanningTree> {
        Ok(&self.model()?.tree)
    }

    /// Looks up a CPT entry. `parent_value` is ignored for the root.
    pub fn conditional(
        &self,
        attribute: usize,
        label: &str,
        parent_value: Option<&str>,
        value: &str,
    ) -> Result<f64> {
        let model = self.model()?;
        let table = model
            .tables
            .get(attribute)
            .ok_or(BayesError::NoSuchAttribute(attribute))?;
        let l = model.codebook.label(label)?;
        let v = model.codebook.resolve(attribute, value)?;
        let u = match (table.parent, parent_value) {
            (Some(p), Some(token)) => model.codebook.resolve(p, token)?,
            (Some(p), None) => {
                return Err(BayesError::invalid(format!(
                    "attribute {attribute} has parent {p}, a parent value is required"
                )))
            }
            (None, _) => 0,
        };
        Ok(table.get(l, u, v))
    }

    /// Renders the learned structure for printing ahead of the results.
    pub fn learned_tree(&self) -> Result<LearnedTree<'_>> {
        let model = self.model()?;
        Ok(LearnedTree {
            attributes: model.schema.attributes(),
            tree: &model.tree,
        })
    }
}

impl Classifier for TanClassifier {
    fn train(&mut self, dataset: &Dataset) -> Result<()> {
        let codebook = dataset.codebook().clone();

        let counts = Counts::collect(dataset, &codebook)?;
        let priors = label_priors(&counts.labels, self.delta);
        debug!(label_counts = ?counts.labels, ?priors, "label priors");

        let weights = mutual_information(&counts, self.delta);
        debug!(asymmetry = weights.asymmetry(), "mutual information matrix");

        let tree = SpanningTree::maximum(&weights);
        info!(
            attributes = tree.len(),
            total_weight = tree.total_weight(),
            "learned spanning tree"
        );

        let tables = (0..counts.cardinalities.len())
            .map(|attribute| ConditionalTable::build(attribute, &tree, &counts, self.delta))
            .collect();

        self.model = Some(TanModel {
            schema: dataset.schema().clone(),
            codebook,
            priors,
            weights,
            tree,
            tables,
        });

        info!(
            instances = dataset.len(),
            labels = dataset.labels().len(),
            "trained TAN"
        );
        Ok(())
    }

    fn schema(&self) -> Option<&Schema> {
        self.model.as_ref().map(|model| &model.schema)
    }

    fn predict(&self, instance: &Instance) -> Result<Prediction> {
        let model = self.model()?;
        let values = model.codebook.encode(instance)?;

        let joint = model
            .priors
            .iter()
            .enumerate()
            .map(|(label, &prior)| {
                model
                    .tables
                    .iter()
                    .zip(&values)
                    .fold(prior, |acc, (table, &value)| {
                        let parent_value = table.parent.map_or(0, |p| values[p]);
                        acc * table.get(label, parent_value, value)
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

/// Each attribute followed by its parent (if any) and the class.
pub struct LearnedTree<'a> {
    attributes: &'a [Attribute],
    tree: &'a SpanningTree,
}

impl fmt::Display for LearnedTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (attribute, parent) in self.attributes.iter().zip(self.tree.parents()) {
            match parent {
                Some(p) => writeln!(
                    f,
                    "{} {} class",
                    attribute.name(),
                    self.attributes[*p].name()
                )?,
                None => writeln!(f, "{} class", attribute.name())?,
            }
        }
        Ok(())
    }
}
