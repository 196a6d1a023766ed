use log::info;
use serial_test::serial;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

use crate::builder::{ConfigValue, KmeansBuilder};
use crate::error::ClusterError;
use crate::objective::kmeans_objective;
use crate::optimize::OptType;
use crate::seeding::InitType;
use crate::tests::init;
use crate::tests::test_data::{three_blobs, toy_dataset};
use sparsemeans_core::VectorError;

#[test]
fn test_default_config_string() {
    init();
    let builder = KmeansBuilder::new();
    let config = builder.to_string();
    info!("{}", config);
    assert_eq!(
        config,
        "k=0, init_type=random, opt_type=mini_batch_kmeans, iterations=1000, \
         sample_size=1000, mini_batch_size=100, dimensionality=131072, \
         l1_lambda=-1, l1_epsilon=0, seed=None, use_bias_term=false, \
         objective_after_init=false, objective_after_training=false"
    );
}

#[test]
fn test_config_string_parses_as_pairs() {
    let builder = KmeansBuilder::new()
        .with_k(7)
        .with_init_type(InitType::SamplingKmeansPlusPlus)
        .with_seed(3);
    let text = builder.to_string();
    let pairs: HashMap<&str, &str> = text
        .split(", ")
        .filter_map(|pair| pair.split_once('='))
        .collect();
    assert_eq!(pairs["k"], "7");
    assert_eq!(pairs["init_type"], "sampling_kmeans_pp");
    assert_eq!(pairs["seed"], "3");
    assert_eq!(pairs.len(), 13);
}

#[test]
#[serial]
fn test_fit_batch_kmeans() {
    init();
    let data = three_blobs(30, 4);
    let builder = KmeansBuilder::new()
        .with_k(3)
        .with_init_type(InitType::OptimizedKmeansPlusPlus)
        .with_opt_type(OptType::BatchKmeans)
        .with_iterations(10)
        .with_dimensionality(8)
        .with_seed(42)
        .with_objectives(true, true);

    let output = builder.fit(&data).unwrap();
    assert_eq!(output.seed, 42);
    assert_eq!(output.centers.len(), 3);

    let after_init = output.objective_after_init.unwrap();
    let after_training = output.objective_after_training.unwrap();
    assert!(after_training <= after_init + 1e-9);
    assert_eq!(after_training, kmeans_objective(&data, &output.centers));
}

#[test]
#[serial]
fn test_fit_is_reproducible_with_seed() {
    init();
    let data = three_blobs(20, 6);
    let builder = KmeansBuilder::new()
        .with_k(4)
        .with_init_type(InitType::SamplingKmeansPlusPlus)
        .with_sample_size(30)
        .with_mini_batch_size(15)
        .with_iterations(20)
        .with_dimensionality(8)
        .with_seed(1234);

    let a = builder.fit(&data).unwrap();
    let b = builder.fit(&data).unwrap();
    assert_eq!(a.centers.to_string(), b.centers.to_string());
    assert!(a.objective_after_init.is_none());
    assert!(a.objective_after_training.is_none());
}

#[test]
fn test_fit_without_seed_reports_one() {
    let data = toy_dataset();
    let builder = KmeansBuilder::new()
        .with_k(2)
        .with_iterations(5)
        .with_dimensionality(4);
    let output = builder.fit(&data).unwrap();

    let replay = builder.clone().with_seed(output.seed).fit(&data).unwrap();
    assert_eq!(output.centers, replay.centers);
}

#[test]
fn test_fit_rejects_bad_k() {
    let data = toy_dataset();
    let err = KmeansBuilder::new()
        .with_k(10)
        .with_dimensionality(4)
        .with_seed(1)
        .fit(&data)
        .unwrap_err();
    assert_eq!(err, ClusterError::InvalidK { k: 10, n: 9 });

    let err = KmeansBuilder::new().with_seed(1).fit(&data).unwrap_err();
    assert_eq!(err, ClusterError::InvalidK { k: 0, n: 9 });
}

#[test]
fn test_fit_rejects_features_beyond_dimensionality() {
    let data = toy_dataset();
    let err = KmeansBuilder::new()
        .with_k(2)
        .with_dimensionality(3)
        .with_seed(1)
        .fit(&data)
        .unwrap_err();
    assert!(matches!(
        err,
        ClusterError::Vector(VectorError::FeatureOutOfRange { dimensions: 3, .. })
    ));
}

#[test]
fn test_optimize_seeded_refines_given_centers() {
    let data = toy_dataset();
    let builder = KmeansBuilder::new()
        .with_k(3)
        .with_opt_type(OptType::SgdKmeans)
        .with_iterations(300)
        .with_dimensionality(4)
        .with_seed(8);
    let mut centers = builder.fit(&data).unwrap().centers;
    let before = kmeans_objective(&data, &centers);

    let batch = builder.clone().with_opt_type(OptType::BatchKmeans).with_iterations(3);
    assert_eq!(batch.optimize_seeded(&data, &mut centers).unwrap(), 8);
    assert!(kmeans_objective(&data, &centers) <= before + 1e-9);
}

#[test]
fn test_l1_ball_configuration() {
    let builder = KmeansBuilder::new().with_l1_ball(2.5, -0.1);
    let config = builder.builder_config_typed();
    assert_eq!(config["l1_lambda"].as_f64(), Some(2.5));
    assert_eq!(config["l1_epsilon"].as_f64(), Some(0.0));
}

#[test]
fn test_typed_config_round_trip() {
    init();
    let builder = KmeansBuilder::new()
        .with_k(12)
        .with_init_type(InitType::OptimizedKmeansPlusPlusTi)
        .with_opt_type(OptType::SgdKmeans)
        .with_iterations(77)
        .with_sample_size(250)
        .with_mini_batch_size(33)
        .with_dimensionality(1 << 10)
        .with_l1_ball(4.0, 0.05)
        .with_seed(99)
        .with_bias_term(true)
        .with_objectives(true, false);

    let config = builder.builder_config_typed();
    assert_eq!(config.len(), 13);
    assert_eq!(config["k"].as_usize(), Some(12));
    assert_eq!(
        config["init_type"].as_init_type(),
        Some(InitType::OptimizedKmeansPlusPlusTi)
    );
    assert_eq!(config["seed"].as_u64(), Some(99));
    assert_eq!(config["k"].as_bool(), None);

    let json = serde_json::to_string(&config).unwrap();
    let restored: HashMap<String, ConfigValue> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);
    assert_eq!(KmeansBuilder::from_config_typed(&restored), builder);
}

#[test]
fn test_from_partial_config_keeps_defaults() {
    let mut config = HashMap::new();
    config.insert("k".to_string(), ConfigValue::Usize(5));
    config.insert("iterations".to_string(), ConfigValue::String("many".to_string()));

    let builder = KmeansBuilder::from_config_typed(&config);
    assert_eq!(builder, KmeansBuilder::new().with_k(5));
}

#[test]
fn test_builder_loads_dataset_with_its_bias_setting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("train.dat");
    fs::write(&path, "1 1:2 3:1\n2 2:1\n").unwrap();

    let with_bias = KmeansBuilder::new().with_bias_term(true).load_dataset(&path).unwrap();
    assert_eq!(with_bias.num_examples(), 2);
    assert_eq!(with_bias.vector_at(0).feature_at(0), 0);
    assert_eq!(with_bias.vector_at(0).value_at(0), 1.0);
    assert_eq!(with_bias.vector_at(0).squared_norm(), 6.0);

    let without = KmeansBuilder::new().load_dataset(&path).unwrap();
    assert_eq!(without.vector_at(0).feature_at(0), 1);
    assert_eq!(without.vector_at(0).squared_norm(), 5.0);
}
