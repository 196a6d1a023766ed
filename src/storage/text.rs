use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::centers::{ClusterCenters, MappingType};
use crate::dataset::Dataset;
use crate::storage::StorageResult;

/// Write `centers` as text, one center per line in center order.
pub fn save_model(centers: &ClusterCenters, path: impl AsRef<Path>) -> StorageResult<()> {
    let path = path.as_ref();
    info!("Writing model to: {}", path.display());
    fs::write(path, centers.to_string())?;
    Ok(())
}

/// Read a model written by [`save_model`]. The dimensionality bound is the
/// widest loaded center.
pub fn load_model(path: impl AsRef<Path>) -> StorageResult<ClusterCenters> {
    let path = path.as_ref();
    info!("Reading model from: {}", path.display());
    let centers = fs::read_to_string(path)?.parse::<ClusterCenters>()?;
    info!(
        "Loaded {} centers, dimensionality {}",
        centers.len(),
        centers.dimensionality()
    );
    Ok(centers)
}

pub fn load_dataset(path: impl AsRef<Path>, use_bias: bool) -> StorageResult<Dataset> {
    let path = path.as_ref();
    info!("Reading data from: {}", path.display());
    Dataset::from_reader(BufReader::new(File::open(path)?), use_bias)
}

/// One `<closest center id>\t<label>` line per example.
pub fn write_cluster_assignments(
    path: impl AsRef<Path>,
    data: &Dataset,
    centers: &ClusterCenters,
) -> StorageResult<()> {
    let path = path.as_ref();
    info!("Writing cluster assignments to: {}", path.display());
    let mut out = BufWriter::new(File::create(path)?);
    for x in data.iter() {
        let (closest, _) = centers.sq_distance_to_closest_center(x)?;
        writeln!(out, "{}\t{}", closest, x.y())?;
    }
    out.flush()?;
    Ok(())
}

/// One mapped example per line, in the sparse example text format.
pub fn write_cluster_mappings(
    path: impl AsRef<Path>,
    data: &Dataset,
    centers: &ClusterCenters,
    mapping: MappingType,
    p: f64,
) -> StorageResult<()> {
    let path = path.as_ref();
    info!(
        "Writing cluster mapping ({}, p={}) to: {}",
        mapping,
        p,
        path.display()
    );
    let mut out = BufWriter::new(File::create(path)?);
    for x in data.iter() {
        let mapped = centers.map_vector_to_centers(x, mapping, p)?;
        writeln!(out, "{}", mapped)?;
    }
    out.flush()?;
    Ok(())
}
