//! Sparse example vectors.
//!
//! A `SparseVector` holds `(feature, value)` pairs in strictly ascending
//! feature order together with one or more real-valued labels. The squared L2
//! norm is accumulated as pairs are pushed so that distance computations never
//! have to revisit the features.
//!
//! Text format, one example per line:
//!
//! ```text
//! label[,label...] [group:ID] feature:value feature:value ... [#comment]
//! ```
//!
//! Feature `0` is reserved for the bias term. When a vector is parsed with the
//! bias enabled, `(0, 1.0)` is pushed before any parsed feature; an explicit
//! `0:v` in the text replaces that value.

use std::fmt;
use std::str::FromStr;

use log::trace;

use crate::error::{VectorError, VectorResult};

/// Value pushed at feature `0` when the bias term is enabled.
pub const BIAS_VALUE: f64 = 1.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVector {
    features: Vec<(usize, f64)>,
    labels: Vec<f64>,
    squared_norm: f64,
    group_id: Option<String>,
    comment: Option<String>,
}

impl SparseVector {
    /// Empty vector carrying the given labels.
    pub fn with_labels(labels: Vec<f64>) -> Self {
        Self {
            labels,
            ..Default::default()
        }
    }

    /// Parse one line of the sparse text format.
    pub fn parse(line: &str, use_bias: bool) -> VectorResult<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return Err(VectorError::EmptyExample);
        }

        let (body, comment) = match line.split_once('#') {
            Some((body, comment)) => (body, Some(comment.to_string())),
            None => (line, None),
        };

        let mut tokens = body.split_whitespace();
        let label_token = tokens.next().ok_or(VectorError::EmptyExample)?;

        let labels = label_token
            .split(',')
            .map(|l| {
                l.parse::<f64>()
                    .map_err(|_| VectorError::InvalidLabel(l.to_string()))
            })
            .collect::<VectorResult<Vec<f64>>>()?;

        let mut vector = Self {
            labels,
            comment,
            ..Default::default()
        };

        if use_bias {
            vector.push_pair(0, BIAS_VALUE)?;
        }

        let mut tokens = tokens.peekable();
        if let Some(&token) = tokens.peek() {
            if token.starts_with(|c: char| c.is_ascii_alphabetic()) {
                let (_, group) = token
                    .split_once(':')
                    .ok_or_else(|| VectorError::MalformedGroup(token.to_string()))?;
                vector.group_id = Some(group.to_string());
                tokens.next();
            }
        }

        for token in tokens {
            let (id, value) = token
                .split_once(':')
                .ok_or_else(|| VectorError::MalformedFeature(token.to_string()))?;
            let id = id
                .parse::<usize>()
                .map_err(|_| VectorError::MalformedFeature(token.to_string()))?;
            let value = value
                .parse::<f64>()
                .map_err(|_| VectorError::MalformedFeature(token.to_string()))?;

            if use_bias && id == 0 && vector.features.len() == 1 {
                vector.override_bias(value);
            } else {
                vector.push_pair(id, value)?;
            }
        }

        trace!(
            "Parsed example: labels={:?}, nnz={}, squared_norm={}",
            vector.labels,
            vector.features.len(),
            vector.squared_norm
        );
        Ok(vector)
    }

    /// Sparse difference `a - b` carrying label `y` and the group id of `a`.
    ///
    /// Both feature lists are merged in a single pass; a feature present on
    /// only one side keeps its value from `a` or the negated value from `b`.
    pub fn difference(a: &SparseVector, b: &SparseVector, y: f64) -> Self {
        let mut out = Self::with_labels(vec![y]);
        out.group_id = a.group_id.clone();

        let (mut i, mut j) = (0, 0);
        while i < a.features.len() || j < b.features.len() {
            let pair = match (a.features.get(i), b.features.get(j)) {
                (Some(&(fa, va)), Some(&(fb, vb))) if fa == fb => {
                    i += 1;
                    j += 1;
                    (fa, va - vb)
                }
                (Some(&(fa, va)), Some(&(fb, _))) if fa < fb => {
                    i += 1;
                    (fa, va)
                }
                (Some(&(fa, va)), None) => {
                    i += 1;
                    (fa, va)
                }
                (_, Some(&(fb, vb))) => {
                    j += 1;
                    (fb, -vb)
                }
                (None, None) => unreachable!(),
            };
            out.push_sorted(pair.0, pair.1);
        }
        out
    }

    /// Append a feature; `id` must be greater than the last pushed id.
    pub fn push_pair(&mut self, id: usize, value: f64) -> VectorResult<()> {
        if let Some(&(last, _)) = self.features.last() {
            if id <= last {
                return Err(VectorError::UnsortedFeatures { id, last });
            }
        }
        self.push_sorted(id, value);
        Ok(())
    }

    fn push_sorted(&mut self, id: usize, value: f64) {
        self.features.push((id, value));
        self.squared_norm += value * value;
    }

    fn override_bias(&mut self, value: f64) {
        let (_, bias) = &mut self.features[0];
        self.squared_norm += value * value - *bias * *bias;
        *bias = value;
    }

    /// Drop every feature, keeping labels, group id and comment.
    pub fn clear_features(&mut self) {
        self.features.clear();
        self.squared_norm = 0.0;
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// Feature id of the `i`-th stored pair. Panics if out of bounds.
    pub fn feature_at(&self, i: usize) -> usize {
        self.features[i].0
    }

    /// Value of the `i`-th stored pair. Panics if out of bounds.
    pub fn value_at(&self, i: usize) -> f64 {
        self.features[i].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.features.iter().copied()
    }

    /// Largest feature id, if any feature is present.
    pub fn max_feature_id(&self) -> Option<usize> {
        self.features.last().map(|&(id, _)| id)
    }

    pub fn squared_norm(&self) -> f64 {
        self.squared_norm
    }

    /// First label, `0.0` for a vector built without labels.
    pub fn y(&self) -> f64 {
        self.labels.first().copied().unwrap_or(0.0)
    }

    pub fn label(&self, index: usize) -> VectorResult<f64> {
        self.labels
            .get(index)
            .copied()
            .ok_or(VectorError::LabelIndex {
                index,
                len: self.labels.len(),
            })
    }

    /// Overwrite label `index`. A vector with no labels gets its first one.
    pub fn set_label(&mut self, value: f64, index: usize) -> VectorResult<()> {
        if self.labels.is_empty() {
            self.labels.push(value);
            return Ok(());
        }
        let len = self.labels.len();
        let slot = self
            .labels
            .get_mut(index)
            .ok_or(VectorError::LabelIndex { index, len })?;
        *slot = value;
        Ok(())
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl FromStr for SparseVector {
    type Err = VectorError;

    /// Parse without a bias term.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, false)
    }
}

impl fmt::Display for SparseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", label)?;
        }
        write!(f, " ")?;
        for (id, value) in &self.features {
            write!(f, "{}:{} ", id, value)?;
        }
        if let Some(comment) = &self.comment {
            if !comment.is_empty() {
                write!(f, "#{}", comment)?;
            }
        }
        Ok(())
    }
}
