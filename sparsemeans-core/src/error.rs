use thiserror::Error;

/// Errors raised while building, parsing or updating vectors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VectorError {
    #[error("wrong format for input data: empty example string")]
    EmptyExample,

    #[error("wrong format for input data: class label must be a real number, got '{0}'")]
    InvalidLabel(String),

    #[error("wrong format for input data: malformed feature pair '{0}'")]
    MalformedFeature(String),

    #[error("wrong format for input data: malformed group id '{0}'")]
    MalformedGroup(String),

    #[error("features not in ascending sorted order: {id} follows {last}")]
    UnsortedFeatures { id: usize, last: usize },

    #[error("label index {index} is out of range for {len} labels")]
    LabelIndex { index: usize, len: usize },

    #[error("feature {feature} exceeds dimensionality of weight vector: {dimensions}")]
    FeatureOutOfRange { feature: usize, dimensions: usize },

    #[error("multi-label weight vector needs at least one label")]
    NoLabels,

    #[error("malformed weight vector value '{0}'")]
    InvalidWeight(String),
}

pub type VectorResult<T> = Result<T, VectorError>;
