//! Naive Bayes and Tree-Augmented Naive Bayes classifiers for categorical
//! data.
//!
//! ```
//! use bayes_tan::{arff, Classifier, TanClassifier};
//!
//! let train = arff::parse_str(
//!     "@attribute a {x,y}\n@attribute b {x,y}\n@attribute class {p,q}\n@data\nx,x,p\ny,y,q\n",
//! )
//! .unwrap();
//! let mut tan = TanClassifier::new();
//! tan.train(&train).unwrap();
//! let evaluation = tan.classify(&train).unwrap();
//! assert_eq!(evaluation.correct(), 2);
//! ```

pub mod arff;
pub mod bayes;
pub mod classifier;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod tan;
pub mod tree;

pub use bayes::NaiveBayesClassifier;
pub use classifier::{Classifier, Evaluation, Prediction};
pub use dataset::{Attribute, Dataset, Instance, Schema};
pub use error::{BayesError, Result};
pub use tan::TanClassifier;
