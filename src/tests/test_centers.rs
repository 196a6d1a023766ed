use approx::{assert_abs_diff_eq, assert_relative_eq};

use crate::centers::{ClusterCenters, MappingType};
use crate::error::ClusterError;
use crate::tests::init;
use sparsemeans_core::{SparseVector, VectorError, WeightVector};

fn sv(s: &str) -> SparseVector {
    s.parse().unwrap()
}

/// Two centers placed at (1, 2) and (2, 5, -1) in a 10 dimensional space.
fn two_point_centers() -> (ClusterCenters, SparseVector, SparseVector) {
    let x1 = sv("0.0 1:1 2:2");
    let x2 = sv("0.0 1:2 2:5 3:-1");
    let mut centers = ClusterCenters::new(10);
    centers.add_cluster_center_at(&x1).unwrap();
    centers.add_cluster_center_at(&x2).unwrap();
    (centers, x1, x2)
}

#[test]
fn test_distances_between_two_points() {
    init();
    let (centers, x1, x2) = two_point_centers();
    assert_eq!(centers.len(), 2);
    assert_eq!(centers.dimensionality(), 10);

    assert_abs_diff_eq!(centers.sq_distance_to_center_id(0, &x1), 0.0);
    assert_abs_diff_eq!(centers.sq_distance_to_center_id(1, &x2), 0.0);
    assert_relative_eq!(centers.sq_distance_to_center_id(1, &x1), 11.0);
    assert_relative_eq!(centers.sq_distance_to_center_id(0, &x2), 11.0);

    assert_eq!(centers.sq_distance_to_closest_center(&x1).unwrap().0, 0);
    assert_eq!(centers.sq_distance_to_closest_center(&x2).unwrap().0, 1);
}

#[test]
fn test_distance_is_symmetric() {
    let a = sv("1 1:0.5 4:-2 7:3");
    let b = sv("1 2:1 4:1 9:0.25");

    let mut at_a = ClusterCenters::new(10);
    at_a.add_cluster_center_at(&a).unwrap();
    let mut at_b = ClusterCenters::new(10);
    at_b.add_cluster_center_at(&b).unwrap();

    assert_relative_eq!(
        at_a.sq_distance_to_center_id(0, &b),
        at_b.sq_distance_to_center_id(0, &a),
        max_relative = 1e-12
    );
}

#[test]
fn test_add_vector_into_center() {
    let (mut centers, x1, _) = two_point_centers();
    centers.center_mut(0).add_vector(&x1, 1.0).unwrap();
    assert_eq!(centers.center(0).value_of(1), 2.0);
    assert_eq!(centers.center(0).value_of(2), 4.0);
    assert_relative_eq!(centers.sq_distance_to_center_id(0, &x1), 5.0);
}

#[test]
fn test_text_round_trip() {
    init();
    let (mut centers, x1, _) = two_point_centers();
    centers.center_mut(0).add_vector(&x1, 1.0).unwrap();

    let text = centers.to_string();
    assert_eq!(text, "0 2 4 0 0 0 0 0 0 0\n0 2 5 -1 0 0 0 0 0 0\n");

    let restored: ClusterCenters = text.parse().unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(restored.dimensionality(), 10);
    for i in 0..centers.len() {
        for j in 0..10 {
            assert_eq!(restored.center(i).value_of(j), centers.center(i).value_of(j));
        }
        assert_eq!(
            restored.center(i).squared_norm(),
            centers.center(i).squared_norm()
        );
    }
}

#[test]
fn test_parse_reports_line_number() {
    let err = "1 2\n\n3 x\n".parse::<ClusterCenters>().unwrap_err();
    assert!(matches!(err, ClusterError::Parse { line: 3, .. }));
}

#[test]
fn test_squared_distance_mapping_matches_distances() {
    let (centers, x1, x2) = two_point_centers();
    for x in [&x1, &x2] {
        let mapped = centers
            .map_vector_to_centers(x, MappingType::SquaredDistance, 1.0)
            .unwrap();
        assert_eq!(mapped.num_features(), 2);
        assert_eq!(mapped.y(), x.y());
        for i in 0..centers.len() {
            assert_eq!(mapped.feature_at(i), i + 1);
            assert_eq!(mapped.value_at(i), centers.sq_distance_to_center_id(i, x));
        }
    }
}

#[test]
fn test_rbf_mapping_keeps_labels_and_comment() {
    let (centers, _, _) = two_point_centers();
    let x = sv("-1,2 g:q7 1:1 2:2 #held out");
    let mapped = centers
        .map_vector_to_centers(&x, MappingType::RbfKernel, 1.0)
        .unwrap();

    assert_eq!(mapped.labels(), &[-1.0, 2.0]);
    assert_eq!(mapped.group_id(), Some("q7"));
    assert_eq!(mapped.comment(), Some("held out"));
    assert_abs_diff_eq!(mapped.value_at(0), 1.0);
    let far = mapped.value_at(1);
    assert!(far > 1.6e-5 && far < 1.7e-5, "exp(-11) = {}", far);
}

#[test]
fn test_mapping_type_names() {
    for name in ["squared_distance", "rbf_kernel"] {
        let mapping: MappingType = name.parse().unwrap();
        assert_eq!(mapping.to_string(), name);
    }
    assert!(matches!(
        "cosine".parse::<MappingType>(),
        Err(ClusterError::Unsupported { .. })
    ));
}

#[test]
fn test_empty_set_has_no_closest_center() {
    let centers = ClusterCenters::new(5);
    assert!(centers.is_empty());
    assert_eq!(
        centers.sq_distance_to_closest_center(&sv("1 1:1")),
        Err(ClusterError::EmptyCenters)
    );
}

#[test]
#[should_panic(expected = "out of range")]
fn test_center_id_out_of_range_panics() {
    let (centers, x1, _) = two_point_centers();
    centers.sq_distance_to_center_id(2, &x1);
}

#[test]
fn test_ties_go_to_lowest_id() {
    let x = sv("1 1:1");
    let mut centers = ClusterCenters::new(3);
    centers.add_cluster_center_at(&sv("1 1:2")).unwrap();
    centers.add_cluster_center_at(&sv("1 1:0")).unwrap();
    centers.add_cluster_center_at(&sv("1 1:2")).unwrap();
    let (id, distance) = centers.sq_distance_to_closest_center(&x).unwrap();
    assert_eq!(id, 0);
    assert_abs_diff_eq!(distance, 1.0);
}

#[test]
fn test_dimensionality_bound() {
    let mut centers = ClusterCenters::new(3);
    centers.add_cluster_center(WeightVector::new(7));
    assert_eq!(centers.dimensionality(), 7);
    centers.add_cluster_center(WeightVector::new(2));
    assert_eq!(centers.dimensionality(), 7);

    // fresh centers use the raised bound
    centers.add_cluster_center_at(&sv("1 6:1")).unwrap();
    assert_eq!(centers.center(2).dimensions(), 7);

    let err = centers.add_cluster_center_at(&sv("1 7:1")).unwrap_err();
    assert_eq!(
        err,
        ClusterError::Vector(VectorError::FeatureOutOfRange {
            feature: 7,
            dimensions: 7
        })
    );
    assert_eq!(centers.len(), 3);

    centers.clear();
    assert!(centers.is_empty());
    assert_eq!(centers.dimensionality(), 7);
}

#[test]
fn test_with_empty_centers() {
    let centers = ClusterCenters::with_empty_centers(5, 3);
    assert_eq!(centers.len(), 3);
    assert!(centers.iter().all(|c| c.squared_norm() == 0.0 && c.dimensions() == 5));
    let (id, distance) = centers.sq_distance_to_closest_center(&sv("1 1:3 4:4")).unwrap();
    assert_eq!(id, 0);
    assert_relative_eq!(distance, 25.0);
}
