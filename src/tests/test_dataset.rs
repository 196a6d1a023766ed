use std::io::Cursor;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::dataset::Dataset;
use crate::error::ClusterError;
use crate::storage::StorageError;
use crate::tests::init;
use crate::tests::test_data::toy_dataset;

#[test]
fn test_from_reader_skips_blank_lines() {
    init();
    let text = "1 1:1 3:1\n\n-1 2:0.5\n   \n2 4:2 #last\n";
    let data = Dataset::from_reader(Cursor::new(text), false).unwrap();
    assert_eq!(data.num_examples(), 3);
    assert_eq!(data.vector_at(1).y(), -1.0);
    assert_eq!(data.vector_at(2).comment(), Some("last"));
    assert_eq!(data.max_feature_id(), Some(4));
}

#[test]
fn test_from_reader_with_bias() {
    let text = "1 1:1 3:1\n1 0:0 2:1\n";
    let data = Dataset::from_reader(Cursor::new(text), true).unwrap();

    let first = data.vector_at(0);
    assert_eq!(first.feature_at(0), 0);
    assert_eq!(first.value_at(0), 1.0);
    assert_eq!(first.squared_norm(), 3.0);

    // explicit 0:v replaces the bias value
    let second = data.vector_at(1);
    assert_eq!(second.num_features(), 2);
    assert_eq!(second.value_at(0), 0.0);
    assert_eq!(second.squared_norm(), 1.0);
}

#[test]
fn test_from_reader_reports_line() {
    let text = "1 1:1\n\n1 3:1 2:1\n";
    match Dataset::from_reader(Cursor::new(text), false) {
        Err(StorageError::Cluster(ClusterError::Parse { line, .. })) => assert_eq!(line, 3),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_random_example_comes_from_data() {
    let data = toy_dataset();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..50 {
        let x = data.random_example(&mut rng);
        assert!(data.iter().any(|y| y == x));
    }
}

#[test]
fn test_collect_and_push() {
    let mut data: Dataset = toy_dataset().iter().take(2).cloned().collect();
    assert_eq!(data.num_examples(), 2);
    assert!(!data.is_empty());
    data.push("5 9:1".parse().unwrap());
    assert_eq!(data.max_feature_id(), Some(9));
    assert!(Dataset::new().is_empty());
    assert_eq!(Dataset::new().max_feature_id(), None);
}
