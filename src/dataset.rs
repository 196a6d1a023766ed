//! In-memory collection of examples.

use std::io::BufRead;

use log::{debug, info};
use rand::Rng;
use sparsemeans_core::SparseVector;

use crate::error::ClusterError;
use crate::storage::StorageResult;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    vectors: Vec<SparseVector>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: SparseVector) {
        self.vectors.push(x);
    }

    pub fn num_examples(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Example at `index`. Panics if out of bounds.
    pub fn vector_at(&self, index: usize) -> &SparseVector {
        &self.vectors[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SparseVector> + '_ {
        self.vectors.iter()
    }

    /// Uniformly drawn example. Panics on an empty dataset.
    pub fn random_example<R: Rng + ?Sized>(&self, rng: &mut R) -> &SparseVector {
        &self.vectors[rng.random_range(0..self.vectors.len())]
    }

    pub fn max_feature_id(&self) -> Option<usize> {
        self.vectors.iter().filter_map(|x| x.max_feature_id()).max()
    }

    /// Parse one example per non-blank line. Parse failures carry the
    /// 1-based line number.
    pub fn from_reader<B: BufRead>(reader: B, use_bias: bool) -> StorageResult<Self> {
        let mut data = Self::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let x = SparseVector::parse(&line, use_bias).map_err(|source| ClusterError::Parse {
                line: i + 1,
                source,
            })?;
            data.push(x);
            if data.num_examples() % 100_000 == 0 {
                debug!("Read {} examples", data.num_examples());
            }
        }
        info!(
            "Dataset loaded: {} examples, max feature id {:?}, bias={}",
            data.num_examples(),
            data.max_feature_id(),
            use_bias
        );
        Ok(data)
    }
}

impl FromIterator<SparseVector> for Dataset {
    fn from_iter<I: IntoIterator<Item = SparseVector>>(iter: I) -> Self {
        Self {
            vectors: iter.into_iter().collect(),
        }
    }
}
