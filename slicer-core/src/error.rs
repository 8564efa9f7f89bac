use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlicerError {
    Config(String),
    Api(String),
    Kubernetes(String),
    Helm(String),
    Template(String),
    Serialization(String),
    Io(#[from] std::io::Error),
    Other(#[from] anyhow::Error),
}

impl Display for SlicerError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            SlicerError::Config(s) => write!(f, "Configuration error: {}", s),
            SlicerError::Api(s) => write!(f, "Slicer API error: {}", s),
            SlicerError::Kubernetes(s) => write!(f, "Kubernetes error: {}", s),
            SlicerError::Helm(s) => write!(f, "Helm error: {}", s),
            SlicerError::Template(s) => write!(f, "Template error: {}", s),
            SlicerError::Serialization(s) => write!(f, "Serialization error: {}", s),
            SlicerError::Io(e) => write!(f, "I/O error: {}", e),
            SlicerError::Other(e) => write!(f, "Other error: {}", e),
        }
    }
}

impl From<serde_yaml_ng::Error> for SlicerError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        SlicerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SlicerError {
    fn from(err: serde_json::Error) -> Self {
        SlicerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SlicerError>;
