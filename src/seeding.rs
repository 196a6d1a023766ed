//! Seeding: populate a center set with `k` centers drawn from the data.
//!
//! Every strategy appends its seeds to `centers` (normally empty) and draws
//! all randomness from the caller's generator, so a fixed seed reproduces the
//! same centers. All of them require `0 < k <= data.num_examples()`.
//!
//! D^2 weighting draws an example with probability proportional to its
//! squared distance to the closest center chosen so far. Examples already at
//! distance zero carry no mass and are never drawn again.

use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::centers::ClusterCenters;
use crate::dataset::Dataset;
use crate::error::{ClusterError, ClusterResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitType {
    /// `k` examples drawn uniformly, with replacement.
    Random,
    /// D^2 weighting, recomputing every distance each round.
    KmeansPlusPlus,
    /// D^2 weighting with cached closest-center distances.
    OptimizedKmeansPlusPlus,
    /// As `OptimizedKmeansPlusPlus`, skipping updates ruled out by the
    /// triangle inequality.
    OptimizedKmeansPlusPlusTi,
    /// Streaming D^2 weighting over a random sample per round.
    SamplingKmeansPlusPlus,
    /// Farthest of a random sample per round.
    SamplingFarthestFirst,
}

impl FromStr for InitType {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(InitType::Random),
            "kmeans_pp" => Ok(InitType::KmeansPlusPlus),
            "optimized_kmeans_pp" => Ok(InitType::OptimizedKmeansPlusPlus),
            "optimized_kmeans_pp_ti" => Ok(InitType::OptimizedKmeansPlusPlusTi),
            "sampling_kmeans_pp" => Ok(InitType::SamplingKmeansPlusPlus),
            "sampling_farthest" => Ok(InitType::SamplingFarthestFirst),
            _ => Err(ClusterError::Unsupported {
                kind: "init type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for InitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitType::Random => "random",
            InitType::KmeansPlusPlus => "kmeans_pp",
            InitType::OptimizedKmeansPlusPlus => "optimized_kmeans_pp",
            InitType::OptimizedKmeansPlusPlusTi => "optimized_kmeans_pp_ti",
            InitType::SamplingKmeansPlusPlus => "sampling_kmeans_pp",
            InitType::SamplingFarthestFirst => "sampling_farthest",
        };
        write!(f, "{}", name)
    }
}

/// Run the seeding strategy named by `init_type`. `sample_size` is only read
/// by the sampling strategies.
pub fn initialize<R: Rng + ?Sized>(
    init_type: InitType,
    k: usize,
    sample_size: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    rng: &mut R,
) -> ClusterResult<()> {
    info!(
        "Seeding {} centers from {} examples with {}",
        k,
        data.num_examples(),
        init_type
    );
    match init_type {
        InitType::Random => initialize_with_k_random_centers(k, data, centers, rng),
        InitType::KmeansPlusPlus => classic_kmeans_plus_plus(k, data, centers, rng),
        InitType::OptimizedKmeansPlusPlus => optimized_kmeans_plus_plus(k, data, centers, rng),
        InitType::OptimizedKmeansPlusPlusTi => {
            optimized_kmeans_plus_plus_ti(k, data, centers, rng)
        }
        InitType::SamplingKmeansPlusPlus => {
            sampling_kmeans_plus_plus(k, sample_size, data, centers, rng)
        }
        InitType::SamplingFarthestFirst => {
            sampling_farthest_first(k, sample_size, data, centers, rng)
        }
    }
}

fn check_k(k: usize, data: &Dataset) -> ClusterResult<()> {
    if k == 0 || k > data.num_examples() {
        return Err(ClusterError::InvalidK {
            k,
            n: data.num_examples(),
        });
    }
    Ok(())
}

fn check_sample_size(sample_size: usize) -> ClusterResult<()> {
    if sample_size == 0 {
        return Err(ClusterError::InvalidSampleSize);
    }
    Ok(())
}

/// Add one uniformly drawn example as a center and return its index.
fn add_random_center<R: Rng + ?Sized>(
    data: &Dataset,
    centers: &mut ClusterCenters,
    rng: &mut R,
) -> ClusterResult<usize> {
    let id = rng.random_range(0..data.num_examples());
    centers.add_cluster_center_at(data.vector_at(id))?;
    Ok(id)
}

/// Cumulative D^2 mass over examples, sorted by construction.
struct DistanceMass {
    cumulative: Vec<(f64, usize)>,
    total: f64,
}

impl DistanceMass {
    fn with_capacity(n: usize) -> Self {
        Self {
            cumulative: Vec::with_capacity(n),
            total: 0.0,
        }
    }

    fn push(&mut self, example: usize, distance: f64) {
        if distance > 0.0 {
            self.total += distance;
            self.cumulative.push((self.total, example));
        }
    }

    /// Example owning the smallest cumulative key `>=` a uniform draw in
    /// `[0, total)`.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ClusterResult<usize> {
        let draw = rng.random::<f64>() * self.total;
        let pos = self.cumulative.partition_point(|&(key, _)| key < draw);
        self.cumulative
            .get(pos)
            .map(|&(_, example)| example)
            .ok_or(ClusterError::NoUniquePoints)
    }
}

/// Draw `k` examples uniformly at random, with replacement.
pub fn initialize_with_k_random_centers<R: Rng + ?Sized>(
    k: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    rng: &mut R,
) -> ClusterResult<()> {
    check_k(k, data)?;
    for _ in 0..k {
        add_random_center(data, centers, rng)?;
    }
    Ok(())
}

/// Each round draws `sample_size` candidates and keeps the one farthest
/// from its closest existing center.
pub fn sampling_farthest_first<R: Rng + ?Sized>(
    k: usize,
    sample_size: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    rng: &mut R,
) -> ClusterResult<()> {
    check_k(k, data)?;
    check_sample_size(sample_size)?;

    add_random_center(data, centers, rng)?;
    for round in 1..k {
        let mut first = None;
        let mut best: Option<(usize, f64)> = None;
        for _ in 0..sample_size {
            let candidate = rng.random_range(0..data.num_examples());
            if first.is_none() {
                first = Some(candidate);
            }
            let (_, distance) = centers.sq_distance_to_closest_center(data.vector_at(candidate))?;
            if distance > best.map_or(0.0, |(_, d)| d) {
                best = Some((candidate, distance));
            }
        }

        let chosen = match (best, first) {
            (Some((id, distance)), _) => {
                debug!("Round {}: example {} at distance {:.6}", round, id, distance);
                id
            }
            (None, Some(id)) => {
                warn!("Round {}: every sampled candidate sits on a center", round);
                id
            }
            (None, None) => return Err(ClusterError::InvalidSampleSize),
        };
        centers.add_cluster_center_at(data.vector_at(chosen))?;
    }
    Ok(())
}

/// k-means++ recomputing the closest-center distance of every example each
/// round. O(n * k^2) distance evaluations in total.
pub fn classic_kmeans_plus_plus<R: Rng + ?Sized>(
    k: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    rng: &mut R,
) -> ClusterResult<()> {
    check_k(k, data)?;

    add_random_center(data, centers, rng)?;
    for round in 1..k {
        let mut mass = DistanceMass::with_capacity(data.num_examples());
        for (j, x) in data.iter().enumerate() {
            let (_, distance) = centers.sq_distance_to_closest_center(x)?;
            mass.push(j, distance);
        }
        let chosen = mass.sample(rng)?;
        debug!(
            "Round {}: example {} drawn from distance mass {:.6}",
            round, chosen, mass.total
        );
        centers.add_cluster_center_at(data.vector_at(chosen))?;
    }
    Ok(())
}

/// k-means++ caching each example's closest-center distance; only the
/// newest center is measured each round.
pub fn optimized_kmeans_plus_plus<R: Rng + ?Sized>(
    k: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    rng: &mut R,
) -> ClusterResult<()> {
    cached_kmeans_plus_plus(k, data, centers, rng, false).map(|_| ())
}

/// Cached k-means++ that also skips measuring the newest center whenever
/// `d(newest, assigned) > 2 * d(x, assigned)` rules it out.
pub fn optimized_kmeans_plus_plus_ti<R: Rng + ?Sized>(
    k: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    rng: &mut R,
) -> ClusterResult<()> {
    cached_kmeans_plus_plus(k, data, centers, rng, true).map(|_| ())
}

/// Shared body of the cached variants. Returns how many distance
/// evaluations the triangle inequality skipped.
pub(crate) fn cached_kmeans_plus_plus<R: Rng + ?Sized>(
    k: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    rng: &mut R,
    prune: bool,
) -> ClusterResult<usize> {
    check_k(k, data)?;

    let base = centers.len();
    add_random_center(data, centers, rng)?;

    // (closest center id, squared distance) per example
    let mut best: Vec<(usize, f64)> = data
        .iter()
        .map(|x| (base, centers.sq_distance_to_center_id(base, x)))
        .collect();

    // inter[a][b], b < a: squared distance between seeds a and b
    let mut inter: Vec<Vec<f64>> = vec![Vec::new()];
    let mut total_pruned = 0usize;

    for round in 1..k {
        let newest = centers.len() - 1;
        let local = newest - base;
        let mut mass = DistanceMass::with_capacity(data.num_examples());
        let mut pruned = 0usize;

        for (j, x) in data.iter().enumerate() {
            let (assigned, cached) = best[j];
            // squared form of d(newest, assigned) > 2 * d(x, assigned)
            let skip = prune && local >= 1 && inter[local][assigned - base] > 4.0 * cached;
            if skip {
                pruned += 1;
            } else {
                let distance = centers.sq_distance_to_center_id(newest, x);
                if distance < cached {
                    best[j] = (newest, distance);
                }
            }
            mass.push(j, best[j].1);
        }

        let chosen = mass.sample(rng)?;
        debug!(
            "Round {}: example {} drawn from distance mass {:.6} ({} pruned)",
            round, chosen, mass.total, pruned
        );
        total_pruned += pruned;

        let x = data.vector_at(chosen);
        if prune {
            let row = (base..centers.len())
                .map(|id| centers.sq_distance_to_center_id(id, x))
                .collect();
            inter.push(row);
        }
        centers.add_cluster_center_at(x)?;
    }
    if prune {
        info!("Triangle inequality skipped {} distance evaluations", total_pruned);
    }
    Ok(total_pruned)
}

/// Approximate D^2 weighting over `sample_size` random candidates per round.
///
/// Candidates stream past a running mass total; each one replaces the
/// tentative choice with probability `distance / running total`.
pub fn sampling_kmeans_plus_plus<R: Rng + ?Sized>(
    k: usize,
    sample_size: usize,
    data: &Dataset,
    centers: &mut ClusterCenters,
    rng: &mut R,
) -> ClusterResult<()> {
    check_k(k, data)?;
    check_sample_size(sample_size)?;

    add_random_center(data, centers, rng)?;
    for round in 1..k {
        let mut first = None;
        let mut selected = None;
        let mut total = 0.0;
        for _ in 0..sample_size {
            let candidate = rng.random_range(0..data.num_examples());
            if first.is_none() {
                first = Some(candidate);
            }
            let (_, distance) = centers.sq_distance_to_closest_center(data.vector_at(candidate))?;
            total += distance;
            let accept = rng.random::<f64>();
            if total > 0.0 && accept < distance / total {
                selected = Some(candidate);
            }
        }

        let chosen = match selected.or(first) {
            Some(id) => id,
            None => return Err(ClusterError::InvalidSampleSize),
        };
        if selected.is_none() {
            warn!("Round {}: no candidate accepted, using the first drawn", round);
        }
        debug!("Round {}: example {} from sampled mass {:.6}", round, chosen, total);
        centers.add_cluster_center_at(data.vector_at(chosen))?;
    }
    Ok(())
}
