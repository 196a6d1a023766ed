//! K-means configuration and driver.
//!
//! `KmeansBuilder` collects the run parameters, then `fit` seeds a center set
//! from a dataset and refines it with the configured optimizer. Every random
//! draw of a run comes from one ChaCha8 generator seeded from the builder, so
//! a fixed seed reproduces the same model.

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Instant;

use crate::centers::ClusterCenters;
use crate::dataset::Dataset;
use crate::error::ClusterResult;
use crate::objective::kmeans_objective;
use crate::optimize::{self, OptType};
use crate::seeding::{self, InitType};
use crate::storage::{self, StorageResult};

/// Default feature-id bound for fresh centers, 2^17.
pub const DEFAULT_DIMENSIONALITY: usize = 1 << 17;

#[derive(Clone, Debug, PartialEq)]
pub struct KmeansBuilder {
    pub(crate) k: usize,
    pub(crate) init_type: InitType,
    pub(crate) opt_type: OptType,
    pub(crate) iterations: usize,
    /// Candidates per round for the sampling seeders.
    pub(crate) sample_size: usize,
    pub(crate) mini_batch_size: usize,
    pub(crate) dimensionality: usize,
    // L1 radius, projection disabled when <= 0
    pub(crate) l1_lambda: f64,
    // 0 selects the exact projection
    pub(crate) l1_epsilon: f64,
    /// `None` draws a fresh seed on every `fit`.
    pub(crate) seed: Option<u64>,
    pub(crate) use_bias_term: bool,
    pub(crate) objective_after_init: bool,
    pub(crate) objective_after_training: bool,
}

impl Default for KmeansBuilder {
    fn default() -> Self {
        debug!("Creating KmeansBuilder with default parameters");
        Self {
            k: 0,
            init_type: InitType::Random,
            opt_type: OptType::MiniBatchKmeans,
            iterations: 1000,
            sample_size: 1000,
            mini_batch_size: 100,
            dimensionality: DEFAULT_DIMENSIONALITY,
            l1_lambda: -1.0,
            l1_epsilon: 0.0,
            seed: None,
            use_bias_term: false,
            objective_after_init: false,
            objective_after_training: false,
        }
    }
}

/// Result of [`KmeansBuilder::fit`].
#[derive(Clone, Debug)]
pub struct KmeansOutput {
    pub centers: ClusterCenters,
    pub objective_after_init: Option<f64>,
    pub objective_after_training: Option<f64>,
    /// Seed the run actually used.
    pub seed: u64,
}

impl KmeansBuilder {
    pub fn new() -> Self {
        info!("Initializing new KmeansBuilder");
        Self::default()
    }

    /// Number of centers to seed. Must be in `1..=num_examples` at fit time.
    pub fn with_k(mut self, k: usize) -> Self {
        info!("Setting k: {}", k);
        self.k = k;
        self
    }

    pub fn with_init_type(mut self, init_type: InitType) -> Self {
        info!("Setting init type: {}", init_type);
        self.init_type = init_type;
        self
    }

    pub fn with_opt_type(mut self, opt_type: OptType) -> Self {
        info!("Setting opt type: {}", opt_type);
        self.opt_type = opt_type;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        info!("Setting iterations: {}", iterations);
        self.iterations = iterations;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        info!("Setting sample size: {}", sample_size);
        self.sample_size = sample_size;
        self
    }

    pub fn with_mini_batch_size(mut self, mini_batch_size: usize) -> Self {
        info!("Setting mini-batch size: {}", mini_batch_size);
        self.mini_batch_size = mini_batch_size;
        self
    }

    /// Feature-id bound for centers created by seeding. Every feature id in
    /// the data must be below it.
    pub fn with_dimensionality(mut self, dimensionality: usize) -> Self {
        info!("Setting dimensionality: {}", dimensionality);
        self.dimensionality = dimensionality;
        self
    }

    /// Keep every center inside an L1 ball of radius `lambda`.
    ///
    /// `epsilon == 0` selects the exact projection; a positive `epsilon`
    /// accepts any L1 norm in `[lambda, (1 + epsilon) * lambda]`.
    /// A non-positive `lambda` disables the constraint.
    pub fn with_l1_ball(mut self, lambda: f64, epsilon: f64) -> Self {
        info!("Setting L1 ball: lambda={}, epsilon={}", lambda, epsilon);
        if epsilon < 0.0 {
            warn!("Negative L1 epsilon {} treated as exact projection", epsilon);
        }
        self.l1_lambda = lambda;
        self.l1_epsilon = epsilon.max(0.0);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        info!("Setting custom seed: {}", seed);
        self.seed = Some(seed);
        self
    }

    /// Whether [`KmeansBuilder::load_dataset`] adds a bias feature `0:1` to
    /// every example.
    pub fn with_bias_term(mut self, use_bias_term: bool) -> Self {
        info!("Setting bias term: {}", use_bias_term);
        self.use_bias_term = use_bias_term;
        self
    }

    pub fn with_objectives(mut self, after_init: bool, after_training: bool) -> Self {
        info!(
            "Setting objective evaluation: after_init={}, after_training={}",
            after_init, after_training
        );
        self.objective_after_init = after_init;
        self.objective_after_training = after_training;
        self
    }

    pub fn use_bias_term(&self) -> bool {
        self.use_bias_term
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Read a dataset file, adding the bias feature when this builder asks
    /// for it.
    pub fn load_dataset(&self, path: impl AsRef<Path>) -> StorageResult<Dataset> {
        storage::text::load_dataset(path, self.use_bias_term)
    }

    fn rng(&self) -> (u64, ChaCha8Rng) {
        let seed = match self.seed {
            Some(seed) => seed,
            None => rand::random(),
        };
        debug!("Seeding generator with {}", seed);
        (seed, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Seed `k` centers from `data` and refine them.
    pub fn fit(&self, data: &Dataset) -> ClusterResult<KmeansOutput> {
        info!(
            "Fitting k-means: N={} examples, k={}, init={}, opt={}",
            data.num_examples(),
            self.k,
            self.init_type,
            self.opt_type
        );
        let (seed, mut rng) = self.rng();
        let mut centers = ClusterCenters::new(self.dimensionality);

        let start = Instant::now();
        seeding::initialize(
            self.init_type,
            self.k,
            self.sample_size,
            data,
            &mut centers,
            &mut rng,
        )?;
        info!(
            "Time to initialize cluster centers: {:.3}s",
            start.elapsed().as_secs_f64()
        );

        let objective_after_init = self.objective_after_init.then(|| {
            let value = kmeans_objective(data, &centers);
            info!("Objective function value for initialization: {}", value);
            value
        });

        self.optimize(data, &mut centers, &mut rng)?;

        let objective_after_training = self.objective_after_training.then(|| {
            let value = kmeans_objective(data, &centers);
            info!("Objective function value for training: {}", value);
            value
        });

        Ok(KmeansOutput {
            centers,
            objective_after_init,
            objective_after_training,
            seed,
        })
    }

    /// Refine `centers` with the configured optimizer and L1 constraint.
    pub fn optimize<R: Rng + ?Sized>(
        &self,
        data: &Dataset,
        centers: &mut ClusterCenters,
        rng: &mut R,
    ) -> ClusterResult<()> {
        let start = Instant::now();
        match self.opt_type {
            OptType::BatchKmeans => optimize::batch_kmeans(
                self.iterations,
                data,
                centers,
                self.l1_lambda,
                self.l1_epsilon,
            )?,
            OptType::SgdKmeans => optimize::sgd_kmeans(
                self.iterations,
                data,
                centers,
                self.l1_lambda,
                self.l1_epsilon,
                rng,
            )?,
            OptType::MiniBatchKmeans => optimize::mini_batch_kmeans(
                self.iterations,
                self.mini_batch_size,
                data,
                centers,
                self.l1_lambda,
                self.l1_epsilon,
                rng,
            )?,
        }
        info!(
            "Time to optimize cluster centers: {:.3}s",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Refine a loaded model using a generator seeded from this builder.
    pub fn optimize_seeded(&self, data: &Dataset, centers: &mut ClusterCenters) -> ClusterResult<u64> {
        let (seed, mut rng) = self.rng();
        self.optimize(data, centers, &mut rng)?;
        Ok(seed)
    }
}

impl fmt::Display for KmeansBuilder {
    /// Comma-separated `key=value` pairs (cookie-style).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "k={}, \
             init_type={}, \
             opt_type={}, \
             iterations={}, \
             sample_size={}, \
             mini_batch_size={}, \
             dimensionality={}, \
             l1_lambda={}, \
             l1_epsilon={}, \
             seed={}, \
             use_bias_term={}, \
             objective_after_init={}, \
             objective_after_training={}",
            self.k,
            self.init_type,
            self.opt_type,
            self.iterations,
            self.sample_size,
            self.mini_batch_size,
            self.dimensionality,
            self.l1_lambda,
            self.l1_epsilon,
            self.seed.map_or("None".to_string(), |v| v.to_string()),
            self.use_bias_term,
            self.objective_after_init,
            self.objective_after_training,
        )
    }
}

/// Configuration value that keeps its type through JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigValue {
    Bool(bool),
    Usize(usize),
    F64(f64),
    U64(u64),
    String(String),
    OptionU64(Option<u64>),
    InitType(InitType),
    OptType(OptType),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ConfigValue::Usize(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ConfigValue::U64(v) => Some(*v),
            ConfigValue::OptionU64(v) => *v,
            _ => None,
        }
    }

    pub fn as_init_type(&self) -> Option<InitType> {
        match self {
            ConfigValue::InitType(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_opt_type(&self) -> Option<OptType> {
        match self {
            ConfigValue::OptType(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(v) => write!(f, "{}", v),
            ConfigValue::Usize(v) => write!(f, "{}", v),
            ConfigValue::F64(v) => write!(f, "{}", v),
            ConfigValue::U64(v) => write!(f, "{}", v),
            ConfigValue::String(v) => write!(f, "{}", v),
            ConfigValue::OptionU64(opt) => match opt {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "None"),
            },
            ConfigValue::InitType(v) => write!(f, "{}", v),
            ConfigValue::OptType(v) => write!(f, "{}", v),
        }
    }
}

impl KmeansBuilder {
    pub fn builder_config_typed(&self) -> HashMap<String, ConfigValue> {
        let mut config = HashMap::new();

        config.insert("k".to_string(), ConfigValue::Usize(self.k));
        config.insert("init_type".to_string(), ConfigValue::InitType(self.init_type));
        config.insert("opt_type".to_string(), ConfigValue::OptType(self.opt_type));
        config.insert("iterations".to_string(), ConfigValue::Usize(self.iterations));
        config.insert("sample_size".to_string(), ConfigValue::Usize(self.sample_size));
        config.insert(
            "mini_batch_size".to_string(),
            ConfigValue::Usize(self.mini_batch_size),
        );
        config.insert(
            "dimensionality".to_string(),
            ConfigValue::Usize(self.dimensionality),
        );
        config.insert("l1_lambda".to_string(), ConfigValue::F64(self.l1_lambda));
        config.insert("l1_epsilon".to_string(), ConfigValue::F64(self.l1_epsilon));
        config.insert("seed".to_string(), ConfigValue::OptionU64(self.seed));
        config.insert(
            "use_bias_term".to_string(),
            ConfigValue::Bool(self.use_bias_term),
        );
        config.insert(
            "objective_after_init".to_string(),
            ConfigValue::Bool(self.objective_after_init),
        );
        config.insert(
            "objective_after_training".to_string(),
            ConfigValue::Bool(self.objective_after_training),
        );

        config
    }

    /// Rebuild a builder from a typed map; missing or mistyped keys keep
    /// their defaults.
    pub fn from_config_typed(config: &HashMap<String, ConfigValue>) -> Self {
        let mut builder = Self::default();
        let get = |key: &str| config.get(key);

        if let Some(v) = get("k").and_then(ConfigValue::as_usize) {
            builder.k = v;
        }
        if let Some(v) = get("init_type").and_then(ConfigValue::as_init_type) {
            builder.init_type = v;
        }
        if let Some(v) = get("opt_type").and_then(ConfigValue::as_opt_type) {
            builder.opt_type = v;
        }
        if let Some(v) = get("iterations").and_then(ConfigValue::as_usize) {
            builder.iterations = v;
        }
        if let Some(v) = get("sample_size").and_then(ConfigValue::as_usize) {
            builder.sample_size = v;
        }
        if let Some(v) = get("mini_batch_size").and_then(ConfigValue::as_usize) {
            builder.mini_batch_size = v;
        }
        if let Some(v) = get("dimensionality").and_then(ConfigValue::as_usize) {
            builder.dimensionality = v;
        }
        if let Some(v) = get("l1_lambda").and_then(ConfigValue::as_f64) {
            builder.l1_lambda = v;
        }
        if let Some(v) = get("l1_epsilon").and_then(ConfigValue::as_f64) {
            builder.l1_epsilon = v;
        }
        builder.seed = get("seed").and_then(ConfigValue::as_u64);
        if let Some(v) = get("use_bias_term").and_then(ConfigValue::as_bool) {
            builder.use_bias_term = v;
        }
        if let Some(v) = get("objective_after_init").and_then(ConfigValue::as_bool) {
            builder.objective_after_init = v;
        }
        if let Some(v) = get("objective_after_training").and_then(ConfigValue::as_bool) {
            builder.objective_after_training = v;
        }

        builder
    }
}
