//! Files produced and consumed around a k-means run.
//!
//! - [`text`]: model files (one center per line), datasets, cluster
//!   assignments and center mappings.
//! - [`metadata`]: a JSON sidecar recording how a model was built.

pub mod metadata;
pub mod text;

use thiserror::Error;

use crate::error::ClusterError;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid: {0}")]
    Invalid(String),

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

pub type StorageResult<T> = Result<T, StorageError>;
