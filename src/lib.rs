//! # sparsemeans
//!
//! k-means over sparse, weighted feature vectors.
//!
//! A run seeds a [`ClusterCenters`] set from a [`Dataset`] with one of the
//! [`InitType`] strategies (uniform, k-means++ in three cost tiers, and two
//! sampling variants), then refines it with batch Lloyd steps, SGD or
//! mini-batch updates ([`OptType`]), optionally keeping every center inside an
//! L1 ball. Centers are dense [`WeightVector`]s with lazy scaling, so an online
//! update costs O(nnz) of the example rather than O(dimensionality).
//!
//! ```ignore
//! use sparsemeans::{KmeansBuilder, InitType, OptType};
//! use sparsemeans::storage::text::{load_dataset, save_model};
//!
//! let data = load_dataset("train.dat", true)?;
//! let output = KmeansBuilder::new()
//!     .with_k(50)
//!     .with_init_type(InitType::OptimizedKmeansPlusPlus)
//!     .with_opt_type(OptType::MiniBatchKmeans)
//!     .with_seed(42)
//!     .fit(&data)?;
//! save_model(&output.centers, "model.txt")?;
//! ```
//!
//! Vector types live in the `sparsemeans-core` crate and are re-exported here.

pub mod builder;
pub mod centers;
pub mod dataset;
pub mod error;
pub mod objective;
pub mod optimize;
pub mod seeding;
pub mod storage;

pub use builder::{ConfigValue, KmeansBuilder, KmeansOutput};
pub use centers::{ClusterCenters, MappingType};
pub use dataset::Dataset;
pub use error::{ClusterError, ClusterResult};
pub use objective::kmeans_objective;
pub use optimize::OptType;
pub use seeding::InitType;
pub use sparsemeans_core::{MultiLabelWeightVector, SparseVector, VectorError, WeightVector};

#[cfg(test)]
mod tests;
