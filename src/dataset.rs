//! Canonical categorical dataset shared by both classifiers.
//!
//! A [`Dataset`] is validated once on construction and never mutated
//! afterwards. Label and value tokens are resolved to dense indices through
//! a [`Codebook`], which the engines copy when they are trained so that test
//! instances are always encoded against the training vocabulary.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{BayesError, Result};

/// Declared types that accept any token verbatim instead of a closed set.
const OPEN_DOMAIN_TYPES: [&str; 4] = ["real", "numeric", "integer", "string"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    domain: Vec<String>,
}

impl Attribute {
    pub fn new<S: Into<String>>(name: S, domain: Vec<String>) -> Self {
        Attribute {
            name: name.into(),
            domain,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered declared domain. For open attributes this is the type token.
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// True when the attribute was declared with a type sentinel such as
    /// `numeric` and so accepts arbitrary tokens.
    pub fn is_open(&self) -> bool {
        match self.domain.as_slice() {
            [only] => OPEN_DOMAIN_TYPES
                .iter()
                .any(|sentinel| only.eq_ignore_ascii_case(sentinel)),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    label: String,
    values: Vec<String>,
}

impl Instance {
    pub fn new<S: Into<String>>(label: S, values: Vec<String>) -> Self {
        Instance {
            label: label.into(),
            values,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Label ordering plus attribute names and domains. Two datasets can only be
/// used together when their schemas are structurally equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    labels: Vec<String>,
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Describes the first structural difference, if any.
    pub fn difference(&self, other: &Schema) -> Option<String> {
        if self.labels != other.labels {
            return Some(format!(
                "labels [{}] vs [{}]",
                self.labels.join(","),
                other.labels.join(",")
            ));
        }
        if self.attributes.len() != other.attributes.len() {
            return Some(format!(
                "{} attributes vs {}",
                self.attributes.len(),
                other.attributes.len()
            ));
        }
        for (ours, theirs) in self.attributes.iter().zip(&other.attributes) {
            if ours.name != theirs.name {
                return Some(format!("attribute '{}' vs '{}'", ours.name, theirs.name));
            }
            if ours.domain != theirs.domain {
                return Some(format!(
                    "domain of '{}' is {{{}}} vs {{{}}}",
                    ours.name,
                    ours.domain.join(","),
                    theirs.domain.join(",")
                ));
            }
        }
        None
    }
}

/// Value token to dense index for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueIndex {
    positions: HashMap<String, usize>,
    open: bool,
}

impl ValueIndex {
    fn closed(domain: &[String]) -> Self {
        let positions = domain
            .iter()
            .enumerate()
            .map(|(i, value)| (value.clone(), i))
            .collect();
        ValueIndex {
            positions,
            open: false,
        }
    }

    fn open<'a, I: IntoIterator<Item = &'a str>>(tokens: I) -> Self {
        let mut positions = HashMap::new();
        for token in tokens {
            let next = positions.len();
            positions.entry(token.to_string()).or_insert(next);
        }
        ValueIndex {
            positions,
            open: true,
        }
    }

    /// Open attributes resolve unseen tokens to a trailing shared slot;
    /// closed attributes reject them.
    pub fn resolve(&self, token: &str) -> Option<usize> {
        match self.positions.get(token) {
            Some(&i) => Some(i),
            None if self.open => Some(self.positions.len()),
            None => None,
        }
    }

    /// Domain size used as the smoothing multiplier.
    pub fn cardinality(&self) -> usize {
        if self.open {
            self.positions.len() + 1
        } else {
            self.positions.len()
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Index tables for labels and attribute values.
#[derive(Debug, Clone, PartialEq)]
pub struct Codebook {
    labels: HashMap<String, usize>,
    attribute_names: Vec<String>,
    values: Vec<ValueIndex>,
}

impl Codebook {
    pub fn label(&self, label: &str) -> Result<usize> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| BayesError::UnknownLabel(label.to_string()))
    }

    pub fn value_index(&self, attribute: usize) -> Result<&ValueIndex> {
        self.values
            .get(attribute)
            .ok_or(BayesError::NoSuchAttribute(attribute))
    }

    pub fn cardinalities(&self) -> Vec<usize> {
        self.values.iter().map(ValueIndex::cardinality).collect()
    }

    pub fn resolve(&self, attribute: usize, token: &str) -> Result<usize> {
        self.value_index(attribute)?
            .resolve(token)
            .ok_or_else(|| BayesError::UnknownValue {
                attribute: self.attribute_names[attribute].clone(),
                value: token.to_string(),
            })
    }

    /// Encodes every attribute value of `instance` to its domain index.
    pub fn encode(&self, instance: &Instance) -> Result<Vec<usize>> {
        if instance.values.len() != self.values.len() {
            return Err(BayesError::invalid(format!(
                "instance has {} values, expected {}",
                instance.values.len(),
                self.values.len()
            )));
        }
        instance
            .values
            .iter()
            .enumerate()
            .map(|(a, token)| self.resolve(a, token))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    relation: Option<String>,
    schema: Schema,
    attribute_positions: HashMap<String, usize>,
    instances: Vec<Instance>,
    codebook: Codebook,
}

impl Dataset {
    /// Validates and indexes a dataset.
    ///
    /// Fails when fewer than two labels are declared, when label, attribute
    /// or domain names repeat, or when an instance has the wrong length, an
    /// undeclared label, or a value outside a closed domain.
    pub fn new(
        labels: Vec<String>,
        attributes: Vec<Attribute>,
        instances: Vec<Instance>,
    ) -> Result<Self> {
        if labels.len() < 2 {
            return Err(BayesError::invalid(format!(
                "at least 2 class labels are required, found {}",
                labels.len()
            )));
        }

        let mut label_positions = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if label_positions.insert(label.clone(), i).is_some() {
                return Err(BayesError::invalid(format!("duplicate class label '{label}'")));
            }
        }

        let mut attribute_positions = HashMap::with_capacity(attributes.len());
        for (i, attribute) in attributes.iter().enumerate() {
            if attribute_positions.insert(attribute.name.clone(), i).is_some() {
                return Err(BayesError::invalid(format!(
                    "duplicate attribute '{}'",
                    attribute.name
                )));
            }
            if attribute.domain.is_empty() {
                return Err(BayesError::invalid(format!(
                    "attribute '{}' has an empty domain",
                    attribute.name
                )));
            }
            if !attribute.is_open() {
                let mut seen = HashSet::new();
                if let Some(dup) = attribute.domain.iter().find(|v| !seen.insert(v.as_str())) {
                    return Err(BayesError::invalid(format!(
                        "attribute '{}' declares value '{dup}' twice",
                        attribute.name
                    )));
                }
            }
        }

        let values: Vec<ValueIndex> = attributes
            .iter()
            .enumerate()
            .map(|(a, attribute)| {
                if attribute.is_open() {
                    ValueIndex::open(instances.iter().filter_map(|inst| {
                        inst.values.get(a).map(String::as_str)
                    }))
                } else {
                    ValueIndex::closed(&attribute.domain)
                }
            })
            .collect();

        let codebook = Codebook {
            labels: label_positions,
            attribute_names: attributes.iter().map(|a| a.name.clone()).collect(),
            values,
        };

        for instance in &instances {
            codebook.label(&instance.label)?;
            codebook.encode(instance)?;
        }

        Ok(Dataset {
            relation: None,
            schema: Schema { labels, attributes },
            attribute_positions,
            instances,
            codebook,
        })
    }

    pub fn with_relation<S: Into<String>>(mut self, relation: S) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn relation(&self) -> Option<&str> {
        self.relation.as_deref()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn labels(&self) -> &[String] {
        &self.schema.labels
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.schema.attributes
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    /// Ordered declared domain of the attribute called `name`.
    pub fn domain(&self, name: &str) -> Option<&[String]> {
        self.attribute_positions
            .get(name)
            .map(|&i| self.schema.attributes[i].domain())
    }

    /// Gate run before a train/test pair is used together.
    pub fn ensure_compatible(&self, other: &Dataset) -> Result<()> {
        match self.schema.difference(&other.schema) {
            Some(diff) => Err(BayesError::mismatch(diff)),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Relation: {}", self.relation.as_deref().unwrap_or("-"))?;
        writeln!(f, "Class: {}", self.schema.labels.join(","))?;
        for attribute in &self.schema.attributes {
            writeln!(f, "{}: {}", attribute.name, attribute.domain.join(","))?;
        }
        writeln!(f, "Attributes: {}", self.schema.attributes.len())?;
        write!(f, "Instances: {}", self.instances.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn weather() -> Dataset {
        Dataset::new(
            strings(&["yes", "no"]),
            vec![
                Attribute::new("outlook", strings(&["sunny", "rainy"])),
                Attribute::new("temp", strings(&["numeric"])),
            ],
            vec![
                Instance::new("yes", strings(&["sunny", "71"])),
                Instance::new("no", strings(&["rainy", "65"])),
                Instance::new("yes", strings(&["rainy", "71"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn requires_two_labels() {
        let err = Dataset::new(strings(&["only"]), vec![], vec![]).unwrap_err();
        assert!(matches!(err, BayesError::InvalidDataset(_)));
    }

    #[test]
    fn closed_values_resolve_to_domain_position() {
        let data = weather();
        let book = data.codebook();
        assert_eq!(book.resolve(0, "sunny").unwrap(), 0);
        assert_eq!(book.resolve(0, "rainy").unwrap(), 1);
        assert!(matches!(
            book.resolve(0, "cloudy"),
            Err(BayesError::UnknownValue { .. })
        ));
        assert_eq!(book.label("no").unwrap(), 1);
    }

    #[test]
    fn attribute_index_out_of_range() {
        let data = weather();
        let book = data.codebook();
        assert!(matches!(
            book.resolve(2, "sunny"),
            Err(BayesError::NoSuchAttribute(2))
        ));
        assert!(book.value_index(5).is_err());
    }

    #[test]
    fn open_attribute_collects_tokens_and_reserves_unseen_slot() {
        let data = weather();
        let index = data.codebook().value_index(1).unwrap();
        assert!(index.is_open());
        assert_eq!(index.resolve("71"), Some(0));
        assert_eq!(index.resolve("65"), Some(1));
        assert_eq!(index.resolve("80"), Some(2));
        assert_eq!(index.cardinality(), 3);
    }

    #[test]
    fn rejects_out_of_domain_value() {
        let err = Dataset::new(
            strings(&["yes", "no"]),
            vec![Attribute::new("a", strings(&["x", "y"]))],
            vec![Instance::new("yes", strings(&["z"]))],
        )
        .unwrap_err();
        assert!(matches!(err, BayesError::UnknownValue { .. }));
    }

    #[test]
    fn rejects_wrong_instance_length_and_unknown_label() {
        let attrs = vec![Attribute::new("a", strings(&["x", "y"]))];
        let short = Dataset::new(
            strings(&["yes", "no"]),
            attrs.clone(),
            vec![Instance::new("yes", vec![])],
        );
        assert!(matches!(short, Err(BayesError::InvalidDataset(_))));

        let unknown = Dataset::new(
            strings(&["yes", "no"]),
            attrs,
            vec![Instance::new("maybe", strings(&["x"]))],
        );
        assert!(matches!(unknown, Err(BayesError::UnknownLabel(_))));
    }

    #[test]
    fn domain_lookup_by_name() {
        let data = weather();
        assert_eq!(data.domain("outlook").unwrap(), strings(&["sunny", "rainy"]).as_slice());
        assert!(data.domain("humidity").is_none());
    }

    #[test]
    fn compatibility_is_structural() {
        let train = weather();
        let test = Dataset::new(
            strings(&["yes", "no"]),
            vec![
                Attribute::new("outlook", strings(&["sunny", "rainy"])),
                Attribute::new("temp", strings(&["numeric"])),
            ],
            vec![Instance::new("no", strings(&["sunny", "99"]))],
        )
        .unwrap();
        assert!(train.ensure_compatible(&test).is_ok());

        let reordered = Dataset::new(
            strings(&["no", "yes"]),
            train.attributes().to_vec(),
            vec![],
        )
        .unwrap();
        assert!(matches!(
            train.ensure_compatible(&reordered),
            Err(BayesError::SchemaMismatch(_))
        ));

        let domain_order = Dataset::new(
            strings(&["yes", "no"]),
            vec![
                Attribute::new("outlook", strings(&["rainy", "sunny"])),
                Attribute::new("temp", strings(&["numeric"])),
            ],
            vec![],
        )
        .unwrap();
        assert!(train.ensure_compatible(&domain_order).is_err());
    }
}
