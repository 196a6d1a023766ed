//! Dense weight vectors with lazy scaling.
//!
//! The true value of coordinate `i` is `scale * weights[i]`. `scale_by` only
//! touches `scale` and the cached squared norm, which keeps per-example online
//! updates at O(nnz(x)) instead of O(dimensions). The scale is folded back
//! into the raw weights when it risks underflow and before any operation that
//! needs the true coordinates (L1 projection).
//!
//! Text form: the true values, space separated, one vector per line. Floats are
//! written in their shortest round-trip representation, so parsing a printed
//! vector restores every coordinate and the norm exactly.

use std::fmt;
use std::str::FromStr;

use log::{debug, trace};

use crate::error::{VectorError, VectorResult};
use crate::sparse_vector::SparseVector;

/// Below this magnitude the scale is folded into the raw weights.
const MIN_SCALE: f64 = 1e-10;

/// Bisection rounds for the approximate L1 projection.
const MAX_BISECTION_ROUNDS: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct WeightVector {
    weights: Vec<f64>,
    scale: f64,
    squared_norm: f64,
}

impl WeightVector {
    /// Zero vector of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self {
            weights: vec![0.0; dimensions],
            scale: 1.0,
            squared_norm: 0.0,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.weights.len()
    }

    pub fn squared_norm(&self) -> f64 {
        self.squared_norm
    }

    /// Sum of absolute coordinate values.
    pub fn l1_norm(&self) -> f64 {
        self.scale.abs() * self.weights.iter().map(|w| w.abs()).sum::<f64>()
    }

    /// True value of coordinate `index`; zero beyond the dimensionality.
    pub fn value_of(&self, index: usize) -> f64 {
        self.weights
            .get(index)
            .map_or(0.0, |w| w * self.scale)
    }

    /// `<w, x_scale * x>`. Features beyond the dimensionality contribute zero.
    pub fn inner_product(&self, x: &SparseVector, x_scale: f64) -> f64 {
        let raw: f64 = x
            .iter()
            .filter_map(|(id, value)| self.weights.get(id).map(|w| w * value))
            .sum();
        raw * x_scale * self.scale
    }

    /// `<w, x_scale * (a - b)>`.
    pub fn inner_product_on_difference(
        &self,
        a: &SparseVector,
        b: &SparseVector,
        x_scale: f64,
    ) -> f64 {
        self.inner_product(a, x_scale) - self.inner_product(b, x_scale)
    }

    /// `w += x_scale * x`, keeping the cached squared norm exact up to
    /// floating-point accumulation.
    pub fn add_vector(&mut self, x: &SparseVector, x_scale: f64) -> VectorResult<()> {
        if let Some(feature) = x.max_feature_id() {
            if feature >= self.weights.len() {
                return Err(VectorError::FeatureOutOfRange {
                    feature,
                    dimensions: self.weights.len(),
                });
            }
        }

        let mut raw_inner = 0.0;
        for (id, value) in x.iter() {
            let scaled = value * x_scale;
            raw_inner += self.weights[id] * scaled;
            self.weights[id] += scaled / self.scale;
        }
        self.squared_norm += x.squared_norm() * x_scale * x_scale + 2.0 * self.scale * raw_inner;
        if self.squared_norm < 0.0 {
            self.squared_norm = 0.0;
        }
        Ok(())
    }

    /// `w *= factor` in O(1). A zero factor resets the vector.
    pub fn scale_by(&mut self, factor: f64) {
        if factor == 0.0 {
            self.weights.iter_mut().for_each(|w| *w = 0.0);
            self.scale = 1.0;
            self.squared_norm = 0.0;
            return;
        }

        self.squared_norm *= factor * factor;
        self.scale *= factor;
        if self.scale.abs() < MIN_SCALE {
            trace!("Scale {:e} below threshold; folding into weights", self.scale);
            self.fold_scale();
        }
    }

    /// Apply the pending scale to every raw weight and recompute the norm.
    fn fold_scale(&mut self) {
        let scale = self.scale;
        self.weights.iter_mut().for_each(|w| *w *= scale);
        self.scale = 1.0;
        self.recompute_squared_norm();
    }

    fn recompute_squared_norm(&mut self) {
        self.squared_norm = self.weights.iter().map(|w| w * w).sum::<f64>() * self.scale * self.scale;
    }

    /// Exact Euclidean projection onto the L1 ball of radius `lambda`.
    ///
    /// Sort based: the soft threshold `theta` is found from the sorted
    /// magnitudes, then every coordinate is shrunk towards zero by `theta`.
    /// A ball of radius `lambda <= 0` only holds the zero vector.
    pub fn project_to_l1_ball(&mut self, lambda: f64) {
        if lambda <= 0.0 {
            self.scale_by(0.0);
            return;
        }
        if self.l1_norm() <= lambda {
            return;
        }
        self.fold_scale();

        let mut magnitudes: Vec<f64> = self.weights.iter().map(|w| w.abs()).collect();
        magnitudes.sort_unstable_by(|a, b| b.total_cmp(a));

        let mut cumulative = 0.0;
        let mut theta = 0.0;
        for (j, &u) in magnitudes.iter().enumerate() {
            cumulative += u;
            let candidate = (cumulative - lambda) / (j + 1) as f64;
            if u - candidate > 0.0 {
                theta = candidate;
            } else {
                break;
            }
        }

        debug!("Exact L1 projection: lambda={}, theta={}", lambda, theta);
        self.shrink(theta.max(0.0));
    }

    /// Approximate projection: the result has L1 norm within
    /// `[lambda, (1 + epsilon) * lambda]`, or just below `lambda` when the
    /// bisection runs out of rounds.
    pub fn project_to_l1_ball_approx(&mut self, lambda: f64, epsilon: f64) {
        if lambda <= 0.0 {
            self.scale_by(0.0);
            return;
        }
        if self.l1_norm() <= lambda * (1.0 + epsilon) {
            return;
        }
        self.fold_scale();

        let l1_at = |theta: f64, weights: &[f64]| -> f64 {
            weights.iter().map(|w| (w.abs() - theta).max(0.0)).sum()
        };

        let mut lo = 0.0;
        let mut hi = self.weights.iter().fold(0.0_f64, |m, w| m.max(w.abs()));
        let mut found = None;
        for _ in 0..MAX_BISECTION_ROUNDS {
            let mid = 0.5 * (lo + hi);
            let l1 = l1_at(mid, &self.weights);
            if l1 < lambda {
                hi = mid;
            } else if l1 > lambda * (1.0 + epsilon) {
                lo = mid;
            } else {
                found = Some(mid);
                break;
            }
        }
        // l1_at(hi) never exceeds lambda
        let theta = found.unwrap_or(hi);

        debug!(
            "Approximate L1 projection: lambda={}, epsilon={}, theta={}",
            lambda, epsilon, theta
        );
        self.shrink(theta);
    }

    fn shrink(&mut self, theta: f64) {
        for w in self.weights.iter_mut() {
            *w = if w.abs() <= theta {
                0.0
            } else {
                w.signum() * (w.abs() - theta)
            };
        }
        self.recompute_squared_norm();
    }
}

impl FromStr for WeightVector {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let weights = s
            .split_whitespace()
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| VectorError::InvalidWeight(v.to_string()))
            })
            .collect::<VectorResult<Vec<f64>>>()?;

        let mut vector = Self {
            weights,
            scale: 1.0,
            squared_norm: 0.0,
        };
        vector.recompute_squared_norm();
        Ok(vector)
    }
}

impl fmt::Display for WeightVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.weights.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            let value = w * self.scale;
            // never print "-0"
            write!(f, "{}", if value == 0.0 { 0.0 } else { value })?;
        }
        Ok(())
    }
}
