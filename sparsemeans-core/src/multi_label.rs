//! A fixed collection of independent weight vectors, one per label.
//!
//! Every read and update goes to the currently selected vector; switch with
//! [`MultiLabelWeightVector::select_label`].

use std::fmt;
use std::str::FromStr;

use crate::error::{VectorError, VectorResult};
use crate::sparse_vector::SparseVector;
use crate::weight_vector::WeightVector;

#[derive(Clone, Debug, PartialEq)]
pub struct MultiLabelWeightVector {
    vectors: Vec<WeightVector>,
    selected: usize,
}

impl MultiLabelWeightVector {
    /// `num_labels` zero vectors with label 0 selected. At least one label
    /// is required.
    pub fn new(dimensions: usize, num_labels: usize) -> VectorResult<Self> {
        if num_labels == 0 {
            return Err(VectorError::NoLabels);
        }
        Ok(Self {
            vectors: vec![WeightVector::new(dimensions); num_labels],
            selected: 0,
        })
    }

    pub fn select_label(&mut self, label_id: usize) -> VectorResult<()> {
        if label_id >= self.vectors.len() {
            return Err(VectorError::LabelIndex {
                index: label_id,
                len: self.vectors.len(),
            });
        }
        self.selected = label_id;
        Ok(())
    }

    pub fn selected_label(&self) -> usize {
        self.selected
    }

    pub fn num_labels(&self) -> usize {
        self.vectors.len()
    }

    fn current(&self) -> &WeightVector {
        &self.vectors[self.selected]
    }

    fn current_mut(&mut self) -> &mut WeightVector {
        &mut self.vectors[self.selected]
    }

    pub fn inner_product(&self, x: &SparseVector, x_scale: f64) -> f64 {
        self.current().inner_product(x, x_scale)
    }

    pub fn inner_product_label(
        &self,
        x: &SparseVector,
        label_id: usize,
        x_scale: f64,
    ) -> VectorResult<f64> {
        self.vectors
            .get(label_id)
            .map(|w| w.inner_product(x, x_scale))
            .ok_or(VectorError::LabelIndex {
                index: label_id,
                len: self.vectors.len(),
            })
    }

    /// Inner product against every label's vector, in label order.
    pub fn inner_product_all(&self, x: &SparseVector, x_scale: f64) -> Vec<f64> {
        self.vectors
            .iter()
            .map(|w| w.inner_product(x, x_scale))
            .collect()
    }

    pub fn inner_product_on_difference(
        &self,
        a: &SparseVector,
        b: &SparseVector,
        x_scale: f64,
    ) -> f64 {
        self.current().inner_product_on_difference(a, b, x_scale)
    }

    pub fn add_vector(&mut self, x: &SparseVector, x_scale: f64) -> VectorResult<()> {
        self.current_mut().add_vector(x, x_scale)
    }

    pub fn scale_by(&mut self, factor: f64) {
        self.current_mut().scale_by(factor);
    }

    pub fn value_of(&self, index: usize) -> f64 {
        self.current().value_of(index)
    }

    pub fn project_to_l1_ball(&mut self, lambda: f64) {
        self.current_mut().project_to_l1_ball(lambda);
    }

    pub fn project_to_l1_ball_approx(&mut self, lambda: f64, epsilon: f64) {
        self.current_mut().project_to_l1_ball_approx(lambda, epsilon);
    }

    pub fn squared_norm(&self) -> f64 {
        self.current().squared_norm()
    }

    pub fn dimensions(&self) -> usize {
        self.current().dimensions()
    }
}

impl FromStr for MultiLabelWeightVector {
    type Err = VectorError;

    /// One weight vector per line, in label order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vectors = s
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(WeightVector::from_str)
            .collect::<VectorResult<Vec<_>>>()?;
        if vectors.is_empty() {
            return Err(VectorError::NoLabels);
        }
        Ok(Self {
            vectors,
            selected: 0,
        })
    }
}

impl fmt::Display for MultiLabelWeightVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.vectors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", w)?;
        }
        Ok(())
    }
}
