//! Error types shared by ingestion, the dataset model and both engines.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BayesError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed ARFF header or data line.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// Train and test datasets disagree on labels, attributes or domains.
    #[error("metadata mismatch: {0}")]
    SchemaMismatch(String),

    #[error("unknown class label '{0}'")]
    UnknownLabel(String),

    #[error("value '{value}' is outside the domain of attribute '{attribute}'")]
    UnknownValue { attribute: String, value: String },

    #[error("no attribute at index {0}")]
    NoSuchAttribute(usize),

    /// Smoothing constant that is not a positive finite number.
    #[error("smoothing constant must be positive and finite, got {0}")]
    InvalidSmoothing(f64),

    #[error("classifier has not been trained")]
    NotTrained,
}

pub type Result<T> = std::result::Result<T, BayesError>;

impl BayesError {
    pub fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        BayesError::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        BayesError::InvalidDataset(message.into())
    }

    pub fn mismatch<S: Into<String>>(message: S) -> Self {
        BayesError::SchemaMismatch(message.into())
    }
}
