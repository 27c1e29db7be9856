use std::fmt;

use thiserror::Error;

/// Main error type for kubegraph
#[derive(Error, Debug)]
pub enum KubegraphError {
    /// A generic object could not be converted into its typed view
    #[error("Conversion error: failed to convert {from} to {to}: {reason}")]
    Conversion {
        from: &'static str,
        to: &'static str,
        reason: String,
    },

    /// A kind-specific extractor failed on one object
    #[error("Extractor error: {api_version} {kind} {namespace}/{name}: {source}")]
    Extractor {
        api_version: String,
        kind: String,
        namespace: String,
        name: String,
        #[source]
        source: Box<KubegraphError>,
    },

    /// Rendering requested with an unknown format key
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input decoding errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient Result type using KubegraphError
pub type Result<T> = std::result::Result<T, KubegraphError>;

/// Every per-object failure collected during one ingestion batch.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<KubegraphError>,
}

impl AggregateError {
    /// Returns `None` when there is nothing to report.
    pub fn from_errors(errors: Vec<KubegraphError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KubegraphError> {
        self.errors.iter()
    }

    pub fn into_inner(self) -> Vec<KubegraphError> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.len() == 1 {
            return write!(f, "{}", self.errors[0]);
        }
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", messages.join(", "))
    }
}

impl std::error::Error for AggregateError {}
