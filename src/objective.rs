use log::debug;

use crate::centers::ClusterCenters;
use crate::dataset::Dataset;

/// Sum over `data` of the squared distance to the closest center.
///
/// An empty center set has no defined objective and yields `f64::MAX`.
pub fn kmeans_objective(data: &Dataset, centers: &ClusterCenters) -> f64 {
    if centers.is_empty() {
        return f64::MAX;
    }
    let total: f64 = data
        .iter()
        .filter_map(|x| centers.sq_distance_to_closest_center(x).ok())
        .map(|(_, distance)| distance)
        .sum();
    debug!(
        "Objective over {} examples and {} centers: {}",
        data.num_examples(),
        centers.len(),
        total
    );
    total
}
