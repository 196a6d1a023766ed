use sparsemeans_core::VectorError;
use thiserror::Error;

/// Errors raised by center sets, seeding and optimization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    #[error("k must be in 1..={n}, got {k}")]
    InvalidK { k: usize, n: usize },

    #[error("sample size must be positive")]
    InvalidSampleSize,

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("cluster center set is empty")]
    EmptyCenters,

    #[error("no unique points left for cluster centers")]
    NoUniquePoints,

    #[error("{kind} '{value}' is not supported")]
    Unsupported { kind: &'static str, value: String },

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error("line {line}: {source}")]
    Parse { line: usize, source: VectorError },
}

pub type ClusterResult<T> = Result<T, ClusterError>;
