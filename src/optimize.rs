//! Optimization: refine an existing center set against the data.
//!
//! The online variants move a center towards each example it wins with a
//! per-center learning rate `eta = 1 / (visits + 1)`, counted after the
//! visit is recorded, so each center's steps shrink as it absorbs examples.
//! Visit counts persist across the iterations of one run.

use std::fmt;
use std::str::FromStr;

use log::{debug, info, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sparsemeans_core::{SparseVector, VectorError};

use crate::centers::ClusterCenters;
use crate::dataset::Dataset;
use crate::error::{ClusterError, ClusterResult};

/// Iterations between L1 projections in [`sgd_kmeans`].
const SGD_PROJECTION_PERIOD: usize = 100;
/// Offset within each period at which [`sgd_kmeans`] projects.
const SGD_PROJECTION_OFFSET: usize = 50;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptType {
    BatchKmeans,
    SgdKmeans,
    MiniBatchKmeans,
}

impl FromStr for OptType {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batch_kmeans" => Ok(OptType::BatchKmeans),
            "sgd_kmeans" => Ok(OptType::SgdKmeans),
            "mini_batch_kmeans" => Ok(OptType::MiniBatchKmeans),
            _ => Err(ClusterError::Unsupported {
                kind: "opt type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptType::BatchKmeans => write!(f, "batch_kmeans"),
            OptType::SgdKmeans => write!(f, "sgd_kmeans"),
            OptType::MiniBatchKmeans => write!(f, "mini_batch_kmeans"),
        }
    }
}

/// Constrain every center's L1 norm to `l1_lambda`. No-op unless
/// `l1_lambda > 0`; exact when `l1_epsilon == 0`, otherwise the norm lands in
/// `[l1_lambda, (1 + l1_epsilon) * l1_lambda]`.
pub fn project_to_l1_ball(l1_lambda: f64, l1_epsilon: f64, centers: &mut ClusterCenters) {
    if l1_lambda <= 0.0 {
        return;
    }
    trace!(
        "Projecting {} centers to L1 radius {} (epsilon {})",
        centers.len(),
        l1_lambda,
        l1_epsilon
    );
    for i in 0..centers.len() {
        let center = centers.center_mut(i);
        if l1_epsilon == 0.0 {
            center.project_to_l1_ball(l1_lambda);
        } else {
            center.project_to_l1_ball_approx(l1_lambda, l1_epsilon);
        }
    }
}

/// One Lloyd step: every center becomes the mean of the examples closest to
/// it. The new set is built aside and swapped in at the end; a center that
/// wins no example becomes the zero vector.
pub fn one_batch_kmeans_optimization(
    data: &Dataset,
    centers: &mut ClusterCenters,
) -> ClusterResult<()> {
    if centers.is_empty() {
        return Err(ClusterError::EmptyCenters);
    }

    let mut new_centers = ClusterCenters::with_empty_centers(centers.dimensionality(), centers.len());
    let mut examples_per_cluster = vec![0usize; centers.len()];

    for x in data.iter() {
        let (closest, _) = centers.sq_distance_to_closest_center(x)?;
        new_centers.center_mut(closest).add_vector(x, 1.0)?;
        examples_per_cluster[closest] += 1;
    }

    for (i, &count) in examples_per_cluster.iter().enumerate() {
        if count > 0 {
            new_centers.center_mut(i).scale_by(1.0 / count as f64);
        }
    }
    debug!("Batch step cluster sizes: {:?}", examples_per_cluster);

    centers.replace_with(new_centers);
    Ok(())
}

/// Move the center closest to `x` towards it.
pub fn one_stochastic_kmeans_step(
    x: &SparseVector,
    centers: &mut ClusterCenters,
    per_center_step_counts: &mut Vec<usize>,
) -> ClusterResult<()> {
    let (closest, _) = centers.sq_distance_to_closest_center(x)?;
    check_fits(x, centers)?;
    if per_center_step_counts.len() < centers.len() {
        per_center_step_counts.resize(centers.len(), 0);
    }
    take_step(x, closest, centers, per_center_step_counts)
}

/// Fails when `x` has a feature beyond the centers' dimensionality. Checked
/// before a step touches any center or count.
fn check_fits(x: &SparseVector, centers: &ClusterCenters) -> ClusterResult<()> {
    let dimensions = centers.iter().map(|c| c.dimensions()).min().unwrap_or(0);
    match x.max_feature_id() {
        Some(feature) if feature >= dimensions => {
            Err(VectorError::FeatureOutOfRange { feature, dimensions }.into())
        }
        _ => Ok(()),
    }
}

fn take_step(
    x: &SparseVector,
    center_id: usize,
    centers: &mut ClusterCenters,
    per_center_step_counts: &mut [usize],
) -> ClusterResult<()> {
    per_center_step_counts[center_id] += 1;
    let eta = 1.0 / (per_center_step_counts[center_id] as f64 + 1.0);
    let center = centers.center_mut(center_id);
    center.scale_by(1.0 - eta);
    center.add_vector(x, eta)?;
    Ok(())
}

/// Draw `mini_batch_size` examples, assign all of them against the current
/// centers, then apply the updates grouped by center.
pub fn one_mini_batch_kmeans_optimization<R: Rng + ?Sized>(
    data: &Dataset,
    centers: &mut ClusterCenters,
    mini_batch_size: usize,
    per_center_step_counts: &mut Vec<usize>,
    rng: &mut R,
) -> ClusterResult<()> {
    if data.is_empty() {
        return Err(ClusterError::EmptyDataset);
    }
    if per_center_step_counts.len() < centers.len() {
        per_center_step_counts.resize(centers.len(), 0);
    }

    let mut mini_batch: Vec<Vec<usize>> = vec![Vec::new(); centers.len()];
    for _ in 0..mini_batch_size {
        let id = rng.random_range(0..data.num_examples());
        let x = data.vector_at(id);
        let (closest, _) = centers.sq_distance_to_closest_center(x)?;
        check_fits(x, centers)?;
        mini_batch[closest].push(id);
    }

    for (center_id, members) in mini_batch.iter().enumerate() {
        for &id in members {
            take_step(data.vector_at(id), center_id, centers, per_center_step_counts)?;
        }
    }
    Ok(())
}

/// `num_iterations` Lloyd steps, projecting after each one.
pub fn batch_kmeans(
    num_iterations: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    l1_lambda: f64,
    l1_epsilon: f64,
) -> ClusterResult<()> {
    info!(
        "Batch k-means: {} iterations over {} examples, {} centers",
        num_iterations,
        data.num_examples(),
        centers.len()
    );
    for i in 0..num_iterations {
        one_batch_kmeans_optimization(data, centers)?;
        project_to_l1_ball(l1_lambda, l1_epsilon, centers);
        trace!("Batch iteration {} done", i);
    }
    Ok(())
}

/// `num_iterations` single-example steps on uniformly drawn examples.
/// Projects at offset 50 of every 100 iterations and once at the end.
pub fn sgd_kmeans<R: Rng + ?Sized>(
    num_iterations: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    l1_lambda: f64,
    l1_epsilon: f64,
    rng: &mut R,
) -> ClusterResult<()> {
    info!(
        "SGD k-means: {} iterations over {} examples, {} centers",
        num_iterations,
        data.num_examples(),
        centers.len()
    );
    if data.is_empty() && num_iterations > 0 {
        return Err(ClusterError::EmptyDataset);
    }

    let mut per_center_step_counts = vec![0usize; centers.len()];
    for i in 0..num_iterations {
        let x = data.random_example(rng);
        one_stochastic_kmeans_step(x, centers, &mut per_center_step_counts)?;
        if i % SGD_PROJECTION_PERIOD == SGD_PROJECTION_OFFSET {
            project_to_l1_ball(l1_lambda, l1_epsilon, centers);
        }
    }
    project_to_l1_ball(l1_lambda, l1_epsilon, centers);
    debug!("SGD visit counts: {:?}", per_center_step_counts);
    Ok(())
}

/// `num_iterations` mini-batch steps, projecting after each one and once
/// more at the end.
pub fn mini_batch_kmeans<R: Rng + ?Sized>(
    num_iterations: usize,
    mini_batch_size: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    l1_lambda: f64,
    l1_epsilon: f64,
    rng: &mut R,
) -> ClusterResult<()> {
    info!(
        "Mini-batch k-means: {} iterations of {} examples, {} centers",
        num_iterations,
        mini_batch_size,
        centers.len()
    );
    let mut per_center_step_counts = vec![0usize; centers.len()];
    for _ in 0..num_iterations {
        one_mini_batch_kmeans_optimization(
            data,
            centers,
            mini_batch_size,
            &mut per_center_step_counts,
            rng,
        )?;
        project_to_l1_ball(l1_lambda, l1_epsilon, centers);
    }
    project_to_l1_ball(l1_lambda, l1_epsilon, centers);
    debug!("Mini-batch visit counts: {:?}", per_center_step_counts);
    Ok(())
}
