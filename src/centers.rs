//! The model: an ordered set of cluster centers.
//!
//! Center ids are positions in the set and stay stable until the set is
//! cleared. Every distance is squared Euclidean and is computed from cached
//! norms plus one inner product over the example's non-zero features:
//! `|x - c|^2 = |x|^2 - 2<c, x> + |c|^2`.

use std::fmt;
use std::str::FromStr;

use log::trace;
use serde::{Deserialize, Serialize};
use sparsemeans_core::{SparseVector, WeightVector};

use crate::error::{ClusterError, ClusterResult};

/// Feature representation produced by [`ClusterCenters::map_vector_to_centers`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingType {
    /// Squared distance to each center.
    SquaredDistance,
    /// `exp(-p * squared distance)` to each center.
    RbfKernel,
}

impl FromStr for MappingType {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "squared_distance" => Ok(MappingType::SquaredDistance),
            "rbf_kernel" => Ok(MappingType::RbfKernel),
            _ => Err(ClusterError::Unsupported {
                kind: "cluster mapping type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingType::SquaredDistance => write!(f, "squared_distance"),
            MappingType::RbfKernel => write!(f, "rbf_kernel"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterCenters {
    centers: Vec<WeightVector>,
    dimensionality: usize,
}

impl ClusterCenters {
    /// Empty set sizing fresh centers at `dimensionality`.
    pub fn new(dimensionality: usize) -> Self {
        Self {
            centers: Vec::new(),
            dimensionality,
        }
    }

    /// Set of `num_centers` zero centers.
    pub fn with_empty_centers(dimensionality: usize, num_centers: usize) -> Self {
        Self {
            centers: vec![WeightVector::new(dimensionality); num_centers],
            dimensionality,
        }
    }

    /// Append `center`, raising the dimensionality bound if needed.
    pub fn add_cluster_center(&mut self, center: WeightVector) {
        self.dimensionality = self.dimensionality.max(center.dimensions());
        self.centers.push(center);
    }

    /// Append a new center located exactly at `x`.
    pub fn add_cluster_center_at(&mut self, x: &SparseVector) -> ClusterResult<()> {
        let mut center = WeightVector::new(self.dimensionality);
        center.add_vector(x, 1.0)?;
        self.add_cluster_center(center);
        Ok(())
    }

    /// Squared distance from `x` to center `center_id`, clamped at zero.
    ///
    /// Panics if `center_id` is out of range.
    pub fn sq_distance_to_center_id(&self, center_id: usize, x: &SparseVector) -> f64 {
        assert!(
            center_id < self.centers.len(),
            "center id {} out of range for {} centers",
            center_id,
            self.centers.len()
        );
        let center = &self.centers[center_id];
        let distance =
            x.squared_norm() - 2.0 * center.inner_product(x, 1.0) + center.squared_norm();
        distance.max(0.0)
    }

    /// `(center id, squared distance)` of the closest center. Ties go to the
    /// lowest id.
    pub fn sq_distance_to_closest_center(&self, x: &SparseVector) -> ClusterResult<(usize, f64)> {
        if self.centers.is_empty() {
            return Err(ClusterError::EmptyCenters);
        }
        let mut best = (0, f64::MAX);
        for i in 0..self.centers.len() {
            let distance = self.sq_distance_to_center_id(i, x);
            if distance < best.1 {
                best = (i, distance);
            }
        }
        trace!("closest center {} at {:.6}", best.0, best.1);
        Ok(best)
    }

    /// Re-express `x` as one feature per center: center `i` becomes feature
    /// `i + 1`. Labels, group id and comment are kept.
    pub fn map_vector_to_centers(
        &self,
        x: &SparseVector,
        mapping: MappingType,
        p: f64,
    ) -> ClusterResult<SparseVector> {
        let mut mapped = x.clone();
        mapped.clear_features();
        for i in 0..self.centers.len() {
            let distance = self.sq_distance_to_center_id(i, x);
            let value = match mapping {
                MappingType::SquaredDistance => distance,
                MappingType::RbfKernel => (-p * distance).exp(),
            };
            mapped.push_pair(i + 1, value)?;
        }
        Ok(mapped)
    }

    /// Center `center_id`. Panics if out of range.
    pub fn center(&self, center_id: usize) -> &WeightVector {
        &self.centers[center_id]
    }

    /// Mutable center `center_id`. Panics if out of range.
    pub fn center_mut(&mut self, center_id: usize) -> &mut WeightVector {
        &mut self.centers[center_id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightVector> + '_ {
        self.centers.iter()
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Remove every center; the dimensionality bound is kept.
    pub fn clear(&mut self) {
        self.centers.clear();
    }

    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    /// Swap in a complete replacement set in one step.
    pub(crate) fn replace_with(&mut self, other: ClusterCenters) {
        self.clear();
        for center in other.centers {
            self.add_cluster_center(center);
        }
    }
}

impl FromStr for ClusterCenters {
    type Err = ClusterError;

    /// One center per non-blank line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut centers = Self::new(0);
        for (i, line) in s.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let center = line
                .parse::<WeightVector>()
                .map_err(|source| ClusterError::Parse { line: i + 1, source })?;
            centers.add_cluster_center(center);
        }
        Ok(centers)
    }
}

impl fmt::Display for ClusterCenters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for center in &self.centers {
            writeln!(f, "{}", center)?;
        }
        Ok(())
    }
}
