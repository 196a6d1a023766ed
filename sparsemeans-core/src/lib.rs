//! Core vector types for sparsemeans.
//!
//! This crate has no clustering knowledge. It provides the vector
//! representations every clustering routine is written against:
//!
//! - [`SparseVector`]: one example, sorted `(feature, value)` pairs plus one or
//!   more labels, an optional group id and comment, and a cached squared norm.
//! - [`WeightVector`]: a dense accumulator with lazy uniform scaling, used as a
//!   cluster center.
//! - [`MultiLabelWeightVector`]: a fixed set of weight vectors with one of them
//!   selected as the target of every read and update.

pub mod error;
pub mod multi_label;
pub mod sparse_vector;
pub mod weight_vector;

pub use error::{VectorError, VectorResult};
pub use multi_label::MultiLabelWeightVector;
pub use sparse_vector::SparseVector;
pub use weight_vector::WeightVector;


#[cfg(test)]
pub(crate) fn init() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("debug");
        let _ = env_logger::Builder::from_env(env).is_test(true).try_init();
    });
}
